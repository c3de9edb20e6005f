use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::interview::feedback::InterviewFeedback;
use crate::models::history::{HistoryRow, NewHistory};
use crate::models::interview::{InterviewRow, NewInterview};
use crate::quota::ToolKind;
use crate::store::Store;

const HISTORY_COLUMNS: &str =
    "id, user_id, tool, input::text AS input, output::text AS output, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn count_usage(&self, user_id: &str, tool: ToolKind) -> Result<i64, sqlx::Error> {
        // Interviews are paid for at creation; history is only written on feedback.
        if tool == ToolKind::MockInterview {
            return sqlx::query_scalar("SELECT COUNT(*) FROM interviews WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await;
        }
        sqlx::query_scalar("SELECT COUNT(*) FROM user_history WHERE user_id = $1 AND tool = $2")
            .bind(user_id)
            .bind(tool.as_str())
            .fetch_one(&self.pool)
            .await
    }

    async fn insert_history(&self, record: NewHistory<'_>) -> Result<HistoryRow, sqlx::Error> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            INSERT INTO user_history (id, user_id, tool, input, output)
            VALUES ($1, $2, $3, $4::json, $5::json)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(record.tool.as_str())
        .bind(record.input.get())
        .bind(record.output.get())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Recorded {} history {} for user {}",
            record.tool, row.id, record.user_id
        );
        Ok(row)
    }

    async fn recent_history(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<HistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM user_history \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_history(&self, user_id: &str, id: Uuid) -> Result<Option<HistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM user_history WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_interview(
        &self,
        interview: NewInterview<'_>,
    ) -> Result<InterviewRow, sqlx::Error> {
        let row = sqlx::query_as::<_, InterviewRow>(
            r#"
            INSERT INTO interviews
                (id, user_id, job_role, job_description, level, interview_type, questions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(interview.user_id)
        .bind(interview.job_role)
        .bind(interview.job_description)
        .bind(interview.level)
        .bind(interview.interview_type)
        .bind(Json(interview.questions))
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Created interview {} with {} questions for user {}",
            row.id,
            row.questions.len(),
            interview.user_id
        );
        Ok(row)
    }

    async fn get_interview(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<InterviewRow>, sqlx::Error> {
        sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn attach_feedback(
        &self,
        user_id: &str,
        id: Uuid,
        feedback: &InterviewFeedback,
    ) -> Result<Option<InterviewRow>, sqlx::Error> {
        // Conditional update: the first writer wins, later writers see no row.
        sqlx::query_as::<_, InterviewRow>(
            r#"
            UPDATE interviews SET feedback = $1
            WHERE id = $2 AND user_id = $3 AND feedback IS NULL
            RETURNING *
            "#,
        )
        .bind(Json(feedback))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
