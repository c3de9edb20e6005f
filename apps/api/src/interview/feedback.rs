//! Scoring a finished mock interview and attaching the result to its record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interview::prompts::{FEEDBACK_INSTRUCTION, FEEDBACK_PROMPT};
use crate::interview::questions::{format_question_list, InterviewBrief};
use crate::llm_client::prompts::system_with_json_rule;
use crate::llm_client::structured::{check_score, generate_validated, Validate};
use crate::llm_client::LlmBackend;
use crate::models::history::{to_raw, NewHistory};
use crate::models::interview::InterviewRow;
use crate::quota::ToolKind;
use crate::state::AppState;

/// Exactly eight integer scores. Extra keys fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewFeedback {
    #[serde(rename = "Overall_Score")]
    pub overall_score: u32,
    #[serde(rename = "Communication")]
    pub communication: u32,
    #[serde(rename = "Technical_Knowledge")]
    pub technical_knowledge: u32,
    #[serde(rename = "Problem_Solving")]
    pub problem_solving: u32,
    #[serde(rename = "Leadership")]
    pub leadership: u32,
    #[serde(rename = "Collaboration")]
    pub collaboration: u32,
    #[serde(rename = "Creativity")]
    pub creativity: u32,
    #[serde(rename = "Adaptability")]
    pub adaptability: u32,
}

impl Validate for InterviewFeedback {
    fn validate(&mut self) -> Result<(), String> {
        check_score("Overall_Score", self.overall_score)?;
        check_score("Communication", self.communication)?;
        check_score("Technical_Knowledge", self.technical_knowledge)?;
        check_score("Problem_Solving", self.problem_solving)?;
        check_score("Leadership", self.leadership)?;
        check_score("Collaboration", self.collaboration)?;
        check_score("Creativity", self.creativity)?;
        check_score("Adaptability", self.adaptability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Candidate,
    Interviewer,
}

impl Speaker {
    fn label(&self) -> &'static str {
        match self {
            Speaker::Candidate => "Candidate",
            Speaker::Interviewer => "Interviewer",
        }
    }
}

/// One finalised utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Speaker,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn render_transcript(turns: &[TranscriptTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), t.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn generate_feedback(
    llm: &dyn LlmBackend,
    brief: &InterviewBrief,
    questions: &[String],
    turns: &[TranscriptTurn],
) -> Result<InterviewFeedback, AppError> {
    let system = system_with_json_rule(&brief.render(FEEDBACK_INSTRUCTION));
    let prompt = FEEDBACK_PROMPT
        .replace("{questions}", &format_question_list(questions))
        .replace("{transcript}", &render_transcript(turns));
    Ok(generate_validated(llm, &system, &prompt).await?)
}

fn brief_from_row(row: &InterviewRow) -> Result<InterviewBrief, AppError> {
    let invalid = |e: String| AppError::Internal(anyhow::anyhow!("interview {}: {e}", row.id));
    Ok(InterviewBrief {
        job_role: row.job_role.clone(),
        job_description: row.job_description.clone(),
        level: row.level.parse().map_err(invalid)?,
        interview_type: row.interview_type.parse().map_err(invalid)?,
    })
}

/// Generates feedback for a finished interview, attaches it to the record and
/// writes the MOCK_INTERVIEW history row. Feedback is attached at most once.
pub async fn record_feedback(
    state: &AppState,
    user: &AuthUser,
    interview_id: Uuid,
    turns: &[TranscriptTurn],
) -> Result<InterviewRow, AppError> {
    let interview = state
        .store
        .get_interview(&user.user_id, interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
    if interview.feedback.is_some() {
        return Err(AppError::Conflict(
            "Feedback was already generated for this interview".to_string(),
        ));
    }
    if turns.is_empty() {
        return Err(AppError::Validation("transcript must not be empty".to_string()));
    }

    let brief = brief_from_row(&interview)?;
    let feedback =
        generate_feedback(state.llm.as_ref(), &brief, &interview.questions.0, turns).await?;

    let updated = state
        .store
        .attach_feedback(&user.user_id, interview_id, &feedback)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Feedback was already generated for this interview".to_string())
        })?;

    let input = to_raw(&json!({
        "interviewId": interview_id,
        "transcript": turns,
    }))?;
    let output = to_raw(&feedback)?;
    state
        .store
        .insert_history(NewHistory {
            user_id: &user.user_id,
            tool: ToolKind::MockInterview,
            input: &input,
            output: &output,
        })
        .await?;

    info!(
        "Feedback recorded for interview {} (overall {})",
        interview_id, feedback.overall_score
    );
    Ok(updated)
}
