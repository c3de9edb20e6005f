//! Voice assistant configuration handed to the browser's voice SDK.

use serde::Serialize;

use crate::interview::prompts::INTERVIEWER_SYSTEM_PROMPT;
use crate::interview::questions::format_question_list;

const ASSISTANT_NAME: &str = "Interviewer";
const VOICE_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: Transcriber,
    pub voice: Voice,
    pub model: AssistantModel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcriber {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantModel {
    pub provider: String,
    pub model: String,
    pub messages: Vec<AssistantMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

pub fn interviewer_config(display_name: Option<&str>, questions: &[String]) -> AssistantConfig {
    let name = display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("there");

    AssistantConfig {
        name: ASSISTANT_NAME.to_string(),
        first_message: format!("Hello {name}! Thanks for joining. Shall we begin?"),
        transcriber: Transcriber {
            provider: "google".to_string(),
            model: VOICE_MODEL.to_string(),
            language: "English".to_string(),
        },
        voice: Voice {
            provider: "11labs".to_string(),
            voice_id: "sarah".to_string(),
            stability: 0.5,
            similarity_boost: 0.7,
            speed: 0.8,
            style: 0.5,
            use_speaker_boost: true,
        },
        model: AssistantModel {
            provider: "google".to_string(),
            model: VOICE_MODEL.to_string(),
            messages: vec![AssistantMessage {
                role: "system".to_string(),
                content: INTERVIEWER_SYSTEM_PROMPT
                    .replace("{{questions}}", &format_question_list(questions)),
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_are_embedded_in_system_prompt() {
        let config = interviewer_config(
            Some("Sam"),
            &["Why Rust?".to_string(), "Describe a migration.".to_string()],
        );
        assert_eq!(config.first_message, "Hello Sam! Thanks for joining. Shall we begin?");

        let prompt = &config.model.messages[0].content;
        assert!(prompt.contains("- Why Rust?\n- Describe a migration."));
        assert!(!prompt.contains("{{questions}}"));
    }

    #[test]
    fn test_anonymous_greeting_and_wire_names() {
        let config = interviewer_config(Some("  "), &[]);
        assert!(config.first_message.starts_with("Hello there!"));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["firstMessage"], config.first_message);
        assert_eq!(value["voice"]["voiceId"], "sarah");
        assert_eq!(value["voice"]["useSpeakerBoost"], true);
    }
}
