use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmBackend;
use crate::media::MediaStore;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every handle is constructed once in `main`.
#[derive(Clone)]
pub struct AppState {
    /// History and interview tables. Production: `PgStore`.
    pub store: Arc<dyn Store>,
    /// Production: `LlmClient` (Gemini).
    pub llm: Arc<dyn LlmBackend>,
    /// Uploaded resumes. Production: `S3MediaStore`.
    pub media: Arc<dyn MediaStore>,
    pub config: Config,
}
