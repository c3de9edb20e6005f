//! In-memory test doubles for the service seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use uuid::Uuid;

use crate::auth::SessionClaims;
use crate::config::Config;
use crate::interview::feedback::InterviewFeedback;
use crate::llm_client::{LlmBackend, LlmError, LlmMessage};
use crate::media::{MediaStore, StorageError, StoredObject};
use crate::models::history::{HistoryRow, NewHistory};
use crate::models::interview::{InterviewRow, NewInterview};
use crate::quota::ToolKind;
use crate::state::AppState;
use crate::store::Store;

pub const TEST_SECRET: &str = "test-session-secret";

/// Replays canned answers in order and records every conversation it receives.
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<Vec<LlmMessage>>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| Ok(a.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answers: Mutex::new(VecDeque::from([Err(LlmError::Api {
                status: 400,
                message: "API key not valid".to_string(),
            })])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Vec<LlmMessage> {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, _system: &str, messages: &[LlmMessage]) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    history: Mutex<Vec<HistoryRow>>,
    interviews: Mutex<Vec<InterviewRow>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn count_usage(&self, user_id: &str, tool: ToolKind) -> Result<i64, sqlx::Error> {
        if tool == ToolKind::MockInterview {
            return Ok(self
                .interviews
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.user_id == user_id)
                .count() as i64);
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.user_id == user_id && h.tool == tool.as_str())
            .count() as i64)
    }

    async fn insert_history(&self, record: NewHistory<'_>) -> Result<HistoryRow, sqlx::Error> {
        let row = HistoryRow {
            id: Uuid::new_v4(),
            user_id: record.user_id.to_string(),
            tool: record.tool.as_str().to_string(),
            input: record.input.to_string(),
            output: record.output.to_string(),
            created_at: Utc::now(),
        };
        self.history.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn recent_history(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<HistoryRow>, sqlx::Error> {
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_history(&self, user_id: &str, id: Uuid) -> Result<Option<HistoryRow>, sqlx::Error> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id == id && h.user_id == user_id)
            .cloned())
    }

    async fn create_interview(
        &self,
        interview: NewInterview<'_>,
    ) -> Result<InterviewRow, sqlx::Error> {
        let row = InterviewRow {
            id: Uuid::new_v4(),
            user_id: interview.user_id.to_string(),
            job_role: interview.job_role.to_string(),
            job_description: interview.job_description.to_string(),
            level: interview.level.to_string(),
            interview_type: interview.interview_type.to_string(),
            questions: sqlx::types::Json(interview.questions.to_vec()),
            feedback: None,
            created_at: Utc::now(),
        };
        self.interviews.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get_interview(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<InterviewRow>, sqlx::Error> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }

    async fn attach_feedback(
        &self,
        user_id: &str,
        id: Uuid,
        feedback: &InterviewFeedback,
    ) -> Result<Option<InterviewRow>, sqlx::Error> {
        let mut interviews = self.interviews.lock().unwrap();
        let row = interviews
            .iter_mut()
            .find(|i| i.id == id && i.user_id == user_id && i.feedback.is_none());
        Ok(row.map(|row| {
            row.feedback = Some(sqlx::types::Json(feedback.clone()));
            row.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryMedia {
    pub objects: Mutex<Vec<(String, Bytes)>>,
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        self.objects.lock().unwrap().push((key.to_string(), bytes));
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("https://media.test/{key}"),
        })
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        gemini_api_key: "test".to_string(),
        gemini_base_url: "http://localhost:0".to_string(),
        session_jwt_secret: TEST_SECRET.to_string(),
        s3_bucket: "resumes".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        s3_public_url: "http://localhost:9000/resumes".to_string(),
        aws_access_key_id: "minio".to_string(),
        aws_secret_access_key: "minio123".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        free_tier_limit: 5,
        llm_timeout_secs: 5,
        storage_timeout_secs: 5,
        request_timeout_secs: 30,
        cors_allowed_origin: None,
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub media: Arc<MemoryMedia>,
}

pub fn harness(llm: ScriptedLlm) -> TestHarness {
    let store = Arc::new(MemoryStore::default());
    let llm = Arc::new(llm);
    let media = Arc::new(MemoryMedia::default());
    let state = AppState {
        store: store.clone(),
        llm: llm.clone(),
        media: media.clone(),
        config: test_config(),
    };
    TestHarness {
        state,
        store,
        llm,
        media,
    }
}

/// Signs a session token the way the identity provider would.
pub fn session_token(user_id: &str, plan: &str) -> String {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        plan: Some(plan.to_string()),
        name: Some("Sam".to_string()),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}
