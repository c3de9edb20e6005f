//! Persistence seam. `PgStore` is the production implementation; handlers
//! only see `Arc<dyn Store>` through `AppState`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::interview::feedback::InterviewFeedback;
use crate::models::history::{HistoryRow, NewHistory};
use crate::models::interview::{InterviewRow, NewInterview};
use crate::quota::ToolKind;

pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Usage count for (user, tool): history rows, except mock interviews,
    /// which count interviews created.
    async fn count_usage(&self, user_id: &str, tool: ToolKind) -> Result<i64, sqlx::Error>;

    async fn insert_history(&self, record: NewHistory<'_>) -> Result<HistoryRow, sqlx::Error>;

    /// Most recent first.
    async fn recent_history(&self, user_id: &str, limit: i64)
        -> Result<Vec<HistoryRow>, sqlx::Error>;

    /// `None` when the row does not exist or belongs to someone else.
    async fn get_history(&self, user_id: &str, id: Uuid) -> Result<Option<HistoryRow>, sqlx::Error>;

    async fn create_interview(&self, interview: NewInterview<'_>)
        -> Result<InterviewRow, sqlx::Error>;

    async fn get_interview(&self, user_id: &str, id: Uuid)
        -> Result<Option<InterviewRow>, sqlx::Error>;

    /// Sets feedback only if it is still unset. `None` when the interview is
    /// missing, not owned by `user_id`, or already has feedback.
    async fn attach_feedback(
        &self,
        user_id: &str,
        id: Uuid,
        feedback: &InterviewFeedback,
    ) -> Result<Option<InterviewRow>, sqlx::Error>;
}
