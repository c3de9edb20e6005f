// Resume analyzer: PDF ingestion, LLM scoring, history recording.

pub mod analyzer;
pub mod handlers;
pub mod ingest;
pub mod prompts;
