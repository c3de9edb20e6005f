// Mock interviews: question generation, live voice session, feedback.

pub mod assistant;
pub mod feedback;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod session;
