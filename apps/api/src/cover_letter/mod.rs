// Cover letter generator.

pub mod generator;
pub mod handlers;
pub mod prompts;
