use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::value::RawValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::cover_letter::generator::CoverLetter;
use crate::interview::feedback::InterviewFeedback;
use crate::quota::ToolKind;
use crate::resume::analyzer::ResumeAnalysis;
use crate::roadmap::generator::Roadmap;

/// Row as read from `user_history`. Payloads are selected as `::text` so they
/// come back byte-for-byte as they were written.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub user_id: String,
    pub tool: String,
    pub input: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
}

/// A new history row. Payloads are pre-serialized so the stored text is fixed here.
pub struct NewHistory<'a> {
    pub user_id: &'a str,
    pub tool: ToolKind,
    pub input: &'a RawValue,
    pub output: &'a RawValue,
}

/// History record as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub tool: ToolKind,
    pub input: Box<RawValue>,
    pub output: Box<RawValue>,
    pub created_at: DateTime<Utc>,
}

/// Output payload interpreted according to the record's tool kind.
#[derive(Debug)]
pub enum ToolOutput {
    ResumeAnalysis(ResumeAnalysis),
    CoverLetter(CoverLetter),
    Roadmap(Roadmap),
    InterviewFeedback(InterviewFeedback),
}

impl HistoryRecord {
    /// Branches on `tool` before interpreting `output`.
    pub fn typed_output(&self) -> Result<ToolOutput, serde_json::Error> {
        let raw = self.output.get();
        Ok(match self.tool {
            ToolKind::ResumeAnalyzer => ToolOutput::ResumeAnalysis(serde_json::from_str(raw)?),
            ToolKind::CoverLetterGenerator => ToolOutput::CoverLetter(serde_json::from_str(raw)?),
            ToolKind::RoadmapGenerator => ToolOutput::Roadmap(serde_json::from_str(raw)?),
            ToolKind::MockInterview => ToolOutput::InterviewFeedback(serde_json::from_str(raw)?),
        })
    }
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = anyhow::Error;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let tool = row
            .tool
            .parse::<ToolKind>()
            .map_err(|e| anyhow::anyhow!("history row {}: {e}", row.id))?;
        Ok(HistoryRecord {
            id: row.id,
            tool,
            input: RawValue::from_string(row.input)?,
            output: RawValue::from_string(row.output)?,
            created_at: row.created_at,
        })
    }
}

/// Serializes a payload once so the same text is stored and returned.
pub fn to_raw<T: Serialize>(value: &T) -> Result<Box<RawValue>, anyhow::Error> {
    Ok(serde_json::value::to_raw_value(value)?)
}
