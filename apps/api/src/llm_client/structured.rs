//! Typed decode of model output.
//!
//! The model is told the schema in the prompt, but nothing it returns is
//! trusted: the text is de-fenced, parsed into the target type and checked by
//! the caller's validator. A rejected answer is fed back with the reason and
//! the model gets exactly one more attempt.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use super::prompts::REPROMPT_TEMPLATE;
use super::{strip_json_fences, LlmBackend, LlmError, LlmMessage};

/// Initial attempt plus one re-prompt.
pub const MAX_DECODE_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("model output rejected after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },
}

/// Schema-level checks on a decoded model answer.
/// May normalise the value in place (trim, sanitise) before accepting it.
pub trait Validate {
    fn validate(&mut self) -> Result<(), String>;
}

/// Calls the model and decodes its answer as `T`, running `check` on the
/// decoded value. Parse or validation failures trigger one re-prompt.
pub async fn generate_json<T, F>(
    llm: &dyn LlmBackend,
    system: &str,
    prompt: &str,
    mut check: F,
) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
    F: FnMut(&mut T) -> Result<(), String>,
{
    let mut messages = vec![LlmMessage::user(prompt)];
    let mut last_reason = String::new();

    for attempt in 1..=MAX_DECODE_ATTEMPTS {
        let raw = llm.complete(system, &messages).await?;

        let outcome = decode::<T>(&raw).and_then(|mut value| {
            check(&mut value)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => return Ok(value),
            Err(reason) => {
                warn!(
                    "Model answer rejected (attempt {}/{}): {}",
                    attempt, MAX_DECODE_ATTEMPTS, reason
                );
                messages.push(LlmMessage::model(raw));
                messages.push(LlmMessage::user(REPROMPT_TEMPLATE.replace("{reason}", &reason)));
                last_reason = reason;
            }
        }
    }

    Err(DecodeError::Exhausted {
        attempts: MAX_DECODE_ATTEMPTS,
        reason: last_reason,
    })
}

/// Shorthand for types whose `Validate` impl is the whole check.
pub async fn generate_validated<T>(
    llm: &dyn LlmBackend,
    system: &str,
    prompt: &str,
) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    generate_json(llm, system, prompt, |value: &mut T| value.validate()).await
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err("response was empty".to_string());
    }
    serde_json::from_str(text).map_err(|e| format!("invalid JSON for the schema: {e}"))
}

/// Fails when `score` is outside 0–100.
pub fn check_score(field: &str, score: u32) -> Result<(), String> {
    if score > 100 {
        return Err(format!("`{field}` must be between 0 and 100, got {score}"));
    }
    Ok(())
}

/// Fails when `value` is blank. Trims it otherwise.
pub fn check_non_empty(field: &str, value: &mut String) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("`{field}` must not be empty"));
    }
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::testing::ScriptedLlm;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Pair {
        name: String,
        score: u32,
    }

    impl Validate for Pair {
        fn validate(&mut self) -> Result<(), String> {
            check_non_empty("name", &mut self.name)?;
            check_score("score", self.score)
        }
    }

    #[tokio::test]
    async fn test_accepts_fenced_valid_answer_first_time() {
        let llm = ScriptedLlm::new(["```json\n{\"name\": \" ada \", \"score\": 90}\n```"]);
        let pair: Pair = generate_validated(&llm, "sys", "prompt").await.unwrap();
        assert_eq!(pair.name, "ada");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_reprompts_once_after_validation_failure() {
        let llm = ScriptedLlm::new([
            r#"{"name": "ada", "score": 140}"#,
            r#"{"name": "ada", "score": 88}"#,
        ]);
        let pair: Pair = generate_validated(&llm, "sys", "prompt").await.unwrap();
        assert_eq!(pair.score, 88);
        assert_eq!(llm.calls(), 2);

        let second = llm.request(1);
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Model);
        assert!(second[2].text.contains("`score` must be between 0 and 100"));
    }

    #[tokio::test]
    async fn test_reprompts_after_unparseable_text() {
        let llm = ScriptedLlm::new(["Sure! Here is your JSON:", r#"{"name": "x", "score": 1}"#]);
        let pair: Pair = generate_validated(&llm, "sys", "prompt").await.unwrap();
        assert_eq!(pair.name, "x");
    }

    #[tokio::test]
    async fn test_gives_up_after_two_rejections() {
        let llm = ScriptedLlm::new(["not json", r#"{"name": "", "score": 1}"#, "never sent"]);
        let err = generate_validated::<Pair>(&llm, "sys", "prompt")
            .await
            .unwrap_err();
        match err {
            DecodeError::Exhausted { attempts, reason } => {
                assert_eq!(attempts, MAX_DECODE_ATTEMPTS);
                assert!(reason.contains("`name` must not be empty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_retried_here() {
        let llm = ScriptedLlm::failing();
        let err = generate_validated::<Pair>(&llm, "sys", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Upstream(_)));
        assert_eq!(llm.calls(), 1);
    }
}
