use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::Json;
use crate::models::history::{to_raw, NewHistory};
use crate::quota::{self, ToolKind};
use crate::resume::analyzer::{analyze_resume, ResumeAnalysis};
use crate::resume::ingest::{ingest_resume, IngestedResume, ResumeForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis: ResumeAnalysis,
    /// Retrieval URL of the uploaded PDF.
    pub url: String,
    pub history_id: Uuid,
}

/// POST /api/v1/resume/analyze
///
/// Multipart form with a `resume` PDF. Validation runs before the quota gate,
/// the gate before any external call.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut form = ResumeForm::from_multipart(multipart?).await?;
    let file = form.take_file()?;

    quota::enforce(
        state.store.as_ref(),
        &user,
        ToolKind::ResumeAnalyzer,
        state.config.free_tier_limit,
    )
    .await?;

    let resume = ingest_resume(state.media.as_ref(), &user.user_id, file).await?;
    Ok(Json(record_analysis(&state, &user, resume).await?))
}

/// Runs the analyzer on ingested text and writes the history row.
pub async fn record_analysis(
    state: &AppState,
    user: &AuthUser,
    resume: IngestedResume,
) -> Result<AnalyzeResponse, AppError> {
    let analysis = analyze_resume(state.llm.as_ref(), &resume.text).await?;

    let input = to_raw(&json!({
        "fileName": resume.file_name,
        "fileUrl": resume.stored.url,
    }))?;
    let output = to_raw(&analysis)?;
    let history = state
        .store
        .insert_history(NewHistory {
            user_id: &user.user_id,
            tool: ToolKind::ResumeAnalyzer,
            input: &input,
            output: &output,
        })
        .await?;

    Ok(AnalyzeResponse {
        analysis,
        url: resume.stored.url,
        history_id: history.id,
    })
}
