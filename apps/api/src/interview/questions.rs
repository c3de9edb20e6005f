//! Interview question generation. Questions are read aloud by the voice
//! assistant, so every accepted question is sanitised for speech.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::prompts::{QUESTIONS_INSTRUCTION, QUESTIONS_PROMPT};
use crate::llm_client::prompts::system_with_json_rule;
use crate::llm_client::structured::generate_json;
use crate::llm_client::LlmBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl InterviewLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewLevel::Junior => "junior",
            InterviewLevel::Mid => "mid",
            InterviewLevel::Senior => "senior",
            InterviewLevel::Lead => "lead",
        }
    }
}

impl FromStr for InterviewLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(InterviewLevel::Junior),
            "mid" => Ok(InterviewLevel::Mid),
            "senior" => Ok(InterviewLevel::Senior),
            "lead" => Ok(InterviewLevel::Lead),
            other => Err(format!(
                "level must be one of junior, mid, senior, lead (got '{other}')"
            )),
        }
    }
}

impl fmt::Display for InterviewLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Mixed,
    CaseStudy,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::Mixed => "mixed",
            InterviewType::CaseStudy => "case-study",
        }
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(InterviewType::Technical),
            "behavioral" => Ok(InterviewType::Behavioral),
            "mixed" => Ok(InterviewType::Mixed),
            "case-study" => Ok(InterviewType::CaseStudy),
            other => Err(format!(
                "type must be one of technical, behavioral, mixed, case-study (got '{other}')"
            )),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an interview is about. Shared by question and feedback prompts.
#[derive(Debug, Clone)]
pub struct InterviewBrief {
    pub job_role: String,
    pub job_description: String,
    pub level: InterviewLevel,
    pub interview_type: InterviewType,
}

impl InterviewBrief {
    /// Fills the `{job_role}`, `{job_description}`, `{level}` and
    /// `{interview_type}` placeholders of `template`.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{job_role}", &self.job_role)
            .replace("{job_description}", &self.job_description)
            .replace("{level}", self.level.as_str())
            .replace("{interview_type}", self.interview_type.as_str())
    }
}

/// Removes `*`, reads `/` as "or", collapses whitespace.
pub fn sanitize_for_speech(question: &str) -> String {
    question
        .replace('*', "")
        .replace('/', " or ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One `- question` per line, as the interviewer prompt expects.
pub fn format_question_list(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn accept_questions(questions: &mut Vec<String>) -> Result<(), String> {
    for q in questions.iter_mut() {
        *q = sanitize_for_speech(q);
    }
    questions.retain(|q| !q.is_empty());
    if questions.is_empty() {
        return Err("expected a non-empty array of non-empty question strings".to_string());
    }
    Ok(())
}

pub async fn generate_questions(
    llm: &dyn LlmBackend,
    brief: &InterviewBrief,
) -> Result<Vec<String>, AppError> {
    let system = system_with_json_rule(QUESTIONS_INSTRUCTION);
    let prompt = brief.render(QUESTIONS_PROMPT);
    Ok(generate_json(llm, &system, &prompt, accept_questions).await?)
}
