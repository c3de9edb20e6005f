// Learning roadmap generator.

pub mod generator;
pub mod handlers;
pub mod prompts;
