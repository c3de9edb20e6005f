use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::history::HistoryRecord;
use crate::state::AppState;

pub const DEFAULT_HISTORY_LIMIT: i64 = 3;
pub const MAX_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

impl HistoryQuery {
    fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryList {
    pub history: Vec<HistoryRecord>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub history: HistoryRecord,
}

/// GET /api/v1/history?limit=
pub async fn handle_list_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryList>, AppError> {
    let rows = state
        .store
        .recent_history(&user.user_id, query.effective_limit())
        .await?;
    let history = rows
        .into_iter()
        .map(HistoryRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(HistoryList { history }))
}

/// GET /api/v1/history/:id
pub async fn handle_get_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, AppError> {
    let row = state
        .store
        .get_history(&user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("History record {id} not found")))?;
    Ok(Json(HistoryEntry {
        history: HistoryRecord::try_from(row)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Plan;
    use crate::models::history::{to_raw, NewHistory};
    use crate::quota::ToolKind;
    use crate::roadmap::generator::tests::roadmap_json;
    use crate::store::Store;
    use crate::testing::{harness, ScriptedLlm, TestHarness};
    use serde_json::value::RawValue;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            plan: Plan::Free,
            name: None,
        }
    }

    async fn seed(h: &TestHarness, user_id: &str, n: usize) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for i in 0..n {
            let input = to_raw(&serde_json::json!({ "userInput": format!("goal {i}") })).unwrap();
            let output = RawValue::from_string(roadmap_json()).unwrap();
            let row = h
                .store
                .insert_history(NewHistory {
                    user_id,
                    tool: ToolKind::RoadmapGenerator,
                    input: &input,
                    output: &output,
                })
                .await
                .unwrap();
            ids.push(row.id);
        }
        ids
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(HistoryQuery::default().effective_limit(), 3);
        assert_eq!(HistoryQuery { limit: Some(500) }.effective_limit(), 50);
        assert_eq!(HistoryQuery { limit: Some(0) }.effective_limit(), 1);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first_and_limited() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let ids = seed(&h, "user_1", 5).await;

        let Json(list) = handle_list_history(
            State(h.state.clone()),
            user("user_1"),
            Query(HistoryQuery::default()),
        )
        .await
        .unwrap();
        let listed: Vec<_> = list.history.iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[4], ids[3], ids[2]]);
    }

    #[tokio::test]
    async fn test_output_round_trips_byte_for_byte() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let ids = seed(&h, "user_1", 1).await;

        let Json(entry) = handle_get_history(State(h.state.clone()), user("user_1"), Path(ids[0]))
            .await
            .unwrap();
        assert_eq!(entry.history.output.get(), roadmap_json());
        assert_eq!(entry.history.tool, ToolKind::RoadmapGenerator);
    }

    #[tokio::test]
    async fn test_other_identity_sees_nothing() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let ids = seed(&h, "user_1", 2).await;

        let err = handle_get_history(State(h.state.clone()), user("user_2"), Path(ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let Json(list) = handle_list_history(
            State(h.state.clone()),
            user("user_2"),
            Query(HistoryQuery { limit: Some(50) }),
        )
        .await
        .unwrap();
        assert!(list.history.is_empty());
    }
}
