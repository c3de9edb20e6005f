pub mod health;
pub mod usage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cover_letter::handlers as cover_letter;
use crate::errors::AppError;
use crate::history::handlers as history;
use crate::interview::handlers as interview;
use crate::resume::handlers as resume;
use crate::resume::ingest::MAX_UPLOAD_BYTES;
use crate::roadmap::handlers as roadmap;
use crate::state::AppState;

/// Room for the text fields sent alongside the resume.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/usage", get(usage::usage_handler))
        // Resume tools
        .route("/api/v1/resume/analyze", post(resume::handle_analyze_resume))
        .route(
            "/api/v1/cover-letter",
            post(cover_letter::handle_generate_cover_letter),
        )
        // Mock interviews
        .route(
            "/api/v1/interviews",
            get(interview::handle_find_interview).post(interview::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/feedback",
            post(interview::handle_interview_feedback),
        )
        .route("/api/v1/interviews/:id", get(interview::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/assistant",
            get(interview::handle_get_assistant),
        )
        .route(
            "/api/v1/interviews/:id/session",
            get(interview::handle_interview_session),
        )
        // Roadmaps
        .route("/api/v1/roadmap", post(roadmap::handle_generate_roadmap))
        // History
        .route("/api/v1/history", get(history::handle_list_history))
        .route("/api/v1/history/:id", get(history::handle_get_history))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES))
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}
