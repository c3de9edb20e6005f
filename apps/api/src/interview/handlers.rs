use async_trait::async_trait;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path, Query};
use crate::interview::assistant::{interviewer_config, AssistantConfig};
use crate::interview::feedback::{record_feedback, TranscriptTurn};
use crate::interview::questions::{generate_questions, InterviewBrief};
use crate::interview::session::{
    parse_frame, run_session, FeedbackSink, InterviewSession, SessionEvent, SessionUpdate,
};
use crate::models::interview::{InterviewRow, NewInterview};
use crate::quota::{self, ToolKind};
use crate::state::AppState;

/// Buffered voice events per live session.
const SESSION_EVENT_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub level: String,
    #[serde(rename = "type", default)]
    pub interview_type: String,
}

impl CreateInterviewRequest {
    fn into_brief(self) -> Result<InterviewBrief, AppError> {
        let job_role = self.job_role.trim().to_string();
        if job_role.is_empty() {
            return Err(AppError::Validation("jobRole is required".to_string()));
        }
        Ok(InterviewBrief {
            job_role,
            job_description: self.job_description.trim().to_string(),
            level: self.level.parse().map_err(AppError::Validation)?,
            interview_type: self.interview_type.parse().map_err(AppError::Validation)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct InterviewQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub transcript: Vec<TranscriptTurn>,
    pub interview_id: Uuid,
}

async fn load_interview(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<InterviewRow, AppError> {
    state
        .store
        .get_interview(&user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    let brief = req.into_brief()?;

    quota::enforce(
        state.store.as_ref(),
        &user,
        ToolKind::MockInterview,
        state.config.free_tier_limit,
    )
    .await?;

    let questions = generate_questions(state.llm.as_ref(), &brief).await?;
    let interview = state
        .store
        .create_interview(NewInterview {
            user_id: &user.user_id,
            job_role: &brief.job_role,
            job_description: &brief.job_description,
            level: brief.level.as_str(),
            interview_type: brief.interview_type.as_str(),
            questions: &questions,
        })
        .await?;

    info!(
        "Interview {} created with {} questions",
        interview.id,
        questions.len()
    );
    Ok(Json(interview))
}

/// GET /api/v1/interviews?id=
pub async fn handle_find_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InterviewQuery>,
) -> Result<Json<InterviewRow>, AppError> {
    let raw = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview id".to_string()))?;
    let id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid interview id")))?;
    Ok(Json(load_interview(&state, &user, id).await?))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    Ok(Json(load_interview(&state, &user, id).await?))
}

/// GET /api/v1/interviews/:id/assistant
pub async fn handle_get_assistant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssistantConfig>, AppError> {
    let interview = load_interview(&state, &user, id).await?;
    Ok(Json(interviewer_config(
        user.name.as_deref(),
        &interview.questions.0,
    )))
}

/// POST /api/v1/interviews/feedback
pub async fn handle_interview_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    Ok(Json(
        record_feedback(&state, &user, req.interview_id, &req.transcript).await?,
    ))
}

/// Scores a finished session through the same path as the feedback endpoint.
struct RecordFeedback {
    state: AppState,
    user: AuthUser,
    interview_id: Uuid,
}

#[async_trait]
impl FeedbackSink for RecordFeedback {
    async fn submit(&self, turns: &[TranscriptTurn]) -> Result<InterviewRow, AppError> {
        record_feedback(&self.state, &self.user, self.interview_id, turns).await
    }
}

/// GET /api/v1/interviews/:id/session
///
/// Upgrades to a WebSocket. The browser forwards voice SDK events as JSON
/// frames and receives status, connect, feedback and error frames.
pub async fn handle_interview_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let interview = load_interview(&state, &user, id).await?;
    if interview.feedback.is_some() {
        return Err(AppError::Conflict(
            "This interview has already been completed".to_string(),
        ));
    }
    Ok(ws?.on_upgrade(move |socket| relay_session(socket, state, user, interview)))
}

async fn relay_session(socket: WebSocket, state: AppState, user: AuthUser, interview: InterviewRow) {
    let interview_id = interview.id;
    let (mut sender, mut receiver) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(SESSION_EVENT_BUFFER);
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<SessionUpdate>();

    info!("Interview {} session connected", interview_id);

    let send_task = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            let text = match serde_json::to_string(&update) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode session frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                debug!("Interview {} socket closed for writing", interview_id);
                break;
            }
        }
    });

    let frame_errors = update_tx.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => match parse_frame(&text) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("Interview {}: {}", interview_id, e);
                        let _ = frame_errors.send(SessionUpdate::error("INVALID_FRAME", e.to_string()));
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        // A dropped socket ends an active call.
        let _ = event_tx.send(SessionEvent::Disconnect).await;
    });

    let assistant = interviewer_config(user.name.as_deref(), &interview.questions.0);
    let sink = RecordFeedback {
        state,
        user,
        interview_id,
    };
    let mut session = InterviewSession::new(interview_id, assistant);
    let _ = update_tx.send(session.snapshot());

    let outcome = run_session(&mut session, &mut event_rx, &sink, &update_tx).await;
    info!("Interview {} session ended: {:?}", interview_id, outcome);

    receive_task.abort();
    drop(update_tx);
    let _ = send_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Plan;
    use crate::interview::feedback::tests::{feedback_json, seed_interview, turns};
    use crate::store::Store;
    use crate::testing::{harness, ScriptedLlm};

    fn user() -> AuthUser {
        AuthUser {
            user_id: "user_1".to_string(),
            plan: Plan::Free,
            name: Some("Sam".to_string()),
        }
    }

    fn create_request(level: &str, kind: &str) -> Json<CreateInterviewRequest> {
        Json(CreateInterviewRequest {
            job_role: "Backend Engineer".to_string(),
            job_description: "Rust services".to_string(),
            level: level.to_string(),
            interview_type: kind.to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_stores_sanitised_questions() {
        let h = harness(ScriptedLlm::new([r#"["Explain REST/gRPC.", "Why *Rust*?"]"#]));
        let Json(interview) = handle_create_interview(
            State(h.state.clone()),
            user(),
            create_request("senior", "technical"),
        )
        .await
        .unwrap();

        assert_eq!(interview.level, "senior");
        assert_eq!(interview.interview_type, "technical");
        assert_eq!(interview.questions.0, vec!["Explain REST or gRPC.", "Why Rust?"]);
        assert!(interview.feedback.is_none());

        let value = serde_json::to_value(&interview).unwrap();
        assert_eq!(value["type"], "technical");
        assert_eq!(value["jobRole"], "Backend Engineer");
        assert!(value["feedback"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_level_is_rejected_before_the_model() {
        let h = harness(ScriptedLlm::new([r#"["Q?"]"#]));
        let err = handle_create_interview(
            State(h.state.clone()),
            user(),
            create_request("principal", "technical"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_find_by_query_requires_id() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let err = handle_find_interview(
            State(h.state.clone()),
            user(),
            Query(InterviewQuery { id: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let interview = seed_interview(h.store.as_ref(), "user_1").await;
        let Json(found) = handle_find_interview(
            State(h.state.clone()),
            user(),
            Query(InterviewQuery {
                id: Some(interview.id.to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(found.id, interview.id);
    }

    #[tokio::test]
    async fn test_other_users_interview_is_not_found() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let interview = seed_interview(h.store.as_ref(), "user_2").await;
        let err = handle_get_interview(State(h.state.clone()), user(), Path(interview.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assistant_is_personalised() {
        let h = harness(ScriptedLlm::new(Vec::<String>::new()));
        let interview = seed_interview(h.store.as_ref(), "user_1").await;
        let Json(config) = handle_get_assistant(State(h.state.clone()), user(), Path(interview.id))
            .await
            .unwrap();
        assert!(config.first_message.contains("Sam"));
        assert!(config.model.messages[0]
            .content
            .contains("- Tell me about a hard bug."));
    }

    #[tokio::test]
    async fn test_feedback_endpoint_returns_updated_record() {
        let h = harness(ScriptedLlm::new([feedback_json(82)]));
        let interview = seed_interview(h.store.as_ref(), "user_1").await;
        let Json(updated) = handle_interview_feedback(
            State(h.state.clone()),
            user(),
            Json(FeedbackRequest {
                transcript: turns(),
                interview_id: interview.id,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.feedback.unwrap().0.overall_score, 82);
        let rows = h.store.recent_history("user_1", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tool, "MOCK_INTERVIEW");
    }

    #[tokio::test]
    async fn test_session_sink_records_feedback_once() {
        let h = harness(ScriptedLlm::new([feedback_json(75), feedback_json(99)]));
        let interview = seed_interview(h.store.as_ref(), "user_1").await;
        let sink = RecordFeedback {
            state: h.state.clone(),
            user: user(),
            interview_id: interview.id,
        };
        assert!(sink.submit(&turns()).await.is_ok());
        assert!(matches!(
            sink.submit(&turns()).await,
            Err(AppError::Conflict(_))
        ));
    }
}
