use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::quota::{usage_summary, UsageSummary};
use crate::state::AppState;

/// GET /api/v1/usage
pub async fn usage_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UsageSummary>, AppError> {
    Ok(Json(
        usage_summary(state.store.as_ref(), &user, state.config.free_tier_limit).await?,
    ))
}
