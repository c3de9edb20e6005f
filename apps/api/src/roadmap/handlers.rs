use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::Json;
use crate::models::history::{to_raw, NewHistory};
use crate::quota::{self, ToolKind};
use crate::roadmap::generator::{generate_roadmap, Roadmap};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapRequest {
    #[serde(default)]
    pub user_input: String,
}

/// POST /api/v1/roadmap
pub async fn handle_generate_roadmap(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RoadmapRequest>,
) -> Result<Json<Roadmap>, AppError> {
    let user_input = req.user_input.trim();
    if user_input.is_empty() {
        return Err(AppError::Validation("userInput is required".to_string()));
    }

    quota::enforce(
        state.store.as_ref(),
        &user,
        ToolKind::RoadmapGenerator,
        state.config.free_tier_limit,
    )
    .await?;

    let roadmap = generate_roadmap(state.llm.as_ref(), user_input).await?;

    let input = to_raw(&json!({ "userInput": user_input }))?;
    let output = to_raw(&roadmap)?;
    state
        .store
        .insert_history(NewHistory {
            user_id: &user.user_id,
            tool: ToolKind::RoadmapGenerator,
            input: &input,
            output: &output,
        })
        .await?;

    Ok(Json(roadmap))
}
