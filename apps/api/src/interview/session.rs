//! Live mock interview session.
//!
//! The browser relays voice SDK events; they are applied in arrival order by a
//! single consumer. The state machine is pure: `apply` returns the side effect
//! to perform, and `drive_session` performs it.
//!
//! ```text
//! Inactive --start--> Connecting --call-start--> Active --call-end/disconnect--> Finished
//!                         |                        |
//!                         +---------error----------+--> Error --retry--> Inactive
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::assistant::AssistantConfig;
use crate::interview::feedback::{Speaker, TranscriptTurn};
use crate::models::interview::InterviewRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
    Error,
}

/// Speaker as reported by the voice SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceRole {
    User,
    Assistant,
}

impl From<VoiceRole> for Speaker {
    fn from(role: VoiceRole) -> Self {
        match role {
            VoiceRole::User => Speaker::Candidate,
            VoiceRole::Assistant => Speaker::Interviewer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    Start,
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    Transcript {
        role: VoiceRole,
        #[serde(rename = "transcriptType")]
        transcript_type: TranscriptKind,
        transcript: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Retry,
    Disconnect,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session frame: {0}")]
    Frame(#[from] serde_json::Error),
}

pub fn parse_frame(text: &str) -> Result<SessionEvent, SessionError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Open the voice call with this assistant.
    Connect(AssistantConfig),
    /// Score the finished transcript. Emitted at most once per session.
    GenerateFeedback(Vec<TranscriptTurn>),
}

/// Frames sent back to the browser.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionUpdate {
    Status {
        status: SessionStatus,
        #[serde(rename = "interviewerSpeaking")]
        interviewer_speaking: bool,
        #[serde(rename = "liveCaption")]
        live_caption: Option<String>,
        turns: usize,
        error: Option<String>,
    },
    Connect {
        assistant: AssistantConfig,
    },
    Feedback {
        interview: InterviewRow,
    },
    Error {
        code: String,
        message: String,
    },
}

impl SessionUpdate {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        SessionUpdate::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

pub struct InterviewSession {
    interview_id: Uuid,
    assistant: AssistantConfig,
    status: SessionStatus,
    turns: Vec<TranscriptTurn>,
    live_caption: Option<String>,
    interviewer_speaking: bool,
    last_error: Option<String>,
    feedback_requested: bool,
}

impl InterviewSession {
    pub fn new(interview_id: Uuid, assistant: AssistantConfig) -> Self {
        Self {
            interview_id,
            assistant,
            status: SessionStatus::Inactive,
            turns: Vec::new(),
            live_caption: None,
            interviewer_speaking: false,
            last_error: None,
            feedback_requested: false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    pub fn interviewer_speaking(&self) -> bool {
        self.interviewer_speaking
    }

    pub fn live_caption(&self) -> Option<&str> {
        self.live_caption.as_deref()
    }

    /// Applies one event. Events that are invalid for the current state are
    /// ignored.
    pub fn apply(&mut self, event: SessionEvent) -> Option<SessionEffect> {
        match (self.status, event) {
            (SessionStatus::Inactive, SessionEvent::Start) => {
                self.status = SessionStatus::Connecting;
                Some(SessionEffect::Connect(self.assistant.clone()))
            }
            (SessionStatus::Connecting, SessionEvent::CallStart) => {
                self.status = SessionStatus::Active;
                None
            }
            (SessionStatus::Connecting | SessionStatus::Active, SessionEvent::Error { message }) => {
                warn!("Interview {} session error: {}", self.interview_id, message);
                self.status = SessionStatus::Error;
                self.interviewer_speaking = false;
                self.last_error = Some(message);
                None
            }
            (SessionStatus::Error, SessionEvent::Retry) => {
                self.reset();
                None
            }
            (SessionStatus::Active, SessionEvent::CallEnd | SessionEvent::Disconnect) => self.finish(),
            (SessionStatus::Active, SessionEvent::SpeechStart) => {
                self.interviewer_speaking = true;
                None
            }
            (SessionStatus::Active, SessionEvent::SpeechEnd) => {
                self.interviewer_speaking = false;
                None
            }
            (
                SessionStatus::Active,
                SessionEvent::Transcript {
                    role,
                    transcript_type,
                    transcript,
                },
            ) => {
                match transcript_type {
                    TranscriptKind::Partial => self.live_caption = Some(transcript),
                    TranscriptKind::Final => {
                        self.live_caption = None;
                        self.turns.push(TranscriptTurn {
                            role: role.into(),
                            text: transcript,
                            timestamp: Utc::now(),
                        });
                    }
                }
                None
            }
            (status, event) => {
                debug!(
                    "Interview {}: ignoring {:?} while {:?}",
                    self.interview_id, event, status
                );
                None
            }
        }
    }

    fn finish(&mut self) -> Option<SessionEffect> {
        self.status = SessionStatus::Finished;
        self.interviewer_speaking = false;
        self.live_caption = None;
        if self.turns.is_empty() || self.feedback_requested {
            return None;
        }
        self.feedback_requested = true;
        Some(SessionEffect::GenerateFeedback(self.turns.clone()))
    }

    /// Back to `Inactive` with an empty turn log.
    pub fn reset(&mut self) {
        self.status = SessionStatus::Inactive;
        self.turns.clear();
        self.live_caption = None;
        self.interviewer_speaking = false;
        self.last_error = None;
        self.feedback_requested = false;
    }

    pub fn snapshot(&self) -> SessionUpdate {
        SessionUpdate::Status {
            status: self.status,
            interviewer_speaking: self.interviewer_speaking,
            live_caption: self.live_caption.clone(),
            turns: self.turns.len(),
            error: self.last_error.clone(),
        }
    }
}

/// Where finished transcripts go to be scored.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn submit(&self, turns: &[TranscriptTurn]) -> Result<InterviewRow, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Feedback generated and attached.
    Completed,
    /// Call ended before anything was said.
    NoTranscript,
    /// The voice call failed.
    Failed,
    /// The call finished but scoring it failed. Feedback stays unset.
    FeedbackFailed,
    /// The event stream closed before the call finished.
    Disconnected,
}

/// Consumes events until the session is finished or errored, or the channel
/// closes. Status frames go to `updates`; a closed `updates` channel is not an
/// error.
pub async fn drive_session(
    session: &mut InterviewSession,
    events: &mut mpsc::Receiver<SessionEvent>,
    sink: &dyn FeedbackSink,
    updates: &mpsc::UnboundedSender<SessionUpdate>,
) -> SessionOutcome {
    while let Some(event) = events.recv().await {
        let effect = session.apply(event);
        let _ = updates.send(session.snapshot());

        match effect {
            Some(SessionEffect::Connect(assistant)) => {
                let _ = updates.send(SessionUpdate::Connect { assistant });
            }
            Some(SessionEffect::GenerateFeedback(turns)) => {
                info!(
                    "Interview {} finished with {} turns; generating feedback",
                    session.interview_id,
                    turns.len()
                );
                return match sink.submit(&turns).await {
                    Ok(interview) => {
                        let _ = updates.send(SessionUpdate::Feedback { interview });
                        SessionOutcome::Completed
                    }
                    Err(e) => {
                        let _ = updates.send(SessionUpdate::error(e.code(), e.public_message()));
                        SessionOutcome::FeedbackFailed
                    }
                };
            }
            None => {}
        }

        match session.status() {
            SessionStatus::Finished => return SessionOutcome::NoTranscript,
            SessionStatus::Error => return SessionOutcome::Failed,
            _ => {}
        }
    }
    SessionOutcome::Disconnected
}

/// Like `drive_session`, but a failed call waits for a `retry` event and
/// starts over with an empty turn log.
pub async fn run_session(
    session: &mut InterviewSession,
    events: &mut mpsc::Receiver<SessionEvent>,
    sink: &dyn FeedbackSink,
    updates: &mpsc::UnboundedSender<SessionUpdate>,
) -> SessionOutcome {
    loop {
        let outcome = drive_session(session, events, sink, updates).await;
        if outcome != SessionOutcome::Failed {
            return outcome;
        }

        loop {
            match events.recv().await {
                Some(SessionEvent::Retry) => break,
                Some(other) => debug!("Ignoring {:?} until retry", other),
                None => return SessionOutcome::Disconnected,
            }
        }
        session.apply(SessionEvent::Retry);
        let _ = updates.send(session.snapshot());
    }
}
