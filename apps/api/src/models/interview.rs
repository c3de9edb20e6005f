use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::interview::feedback::InterviewFeedback;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: String,
    pub job_role: String,
    pub job_description: String,
    pub level: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub questions: Json<Vec<String>>,
    /// Unset until a completed session's feedback is attached; set at most once.
    pub feedback: Option<Json<InterviewFeedback>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewInterview<'a> {
    pub user_id: &'a str,
    pub job_role: &'a str,
    pub job_description: &'a str,
    pub level: &'a str,
    pub interview_type: &'a str,
    pub questions: &'a [String],
}
