//! Cover letter generation from resume text and job details.

use serde::{Deserialize, Serialize};

use crate::cover_letter::prompts::{COVER_LETTER_INSTRUCTION, COVER_LETTER_PROMPT};
use crate::errors::AppError;
use crate::llm_client::prompts::system_with_json_rule;
use crate::llm_client::structured::{check_non_empty, generate_json, Validate};
use crate::llm_client::LlmBackend;

pub const DEFAULT_TONE: &str = "professional";
pub const DEFAULT_LENGTH: &str = "medium";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetter {
    pub intro: String,
    pub body: String,
    pub closing: String,
    pub tone: String,
    pub length: String,
}

impl Validate for CoverLetter {
    fn validate(&mut self) -> Result<(), String> {
        check_non_empty("intro", &mut self.intro)?;
        check_non_empty("body", &mut self.body)?;
        check_non_empty("closing", &mut self.closing)?;
        check_non_empty("tone", &mut self.tone)?;
        check_non_empty("length", &mut self.length)
    }
}

/// Job details for one cover letter. Serialized as the model input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub tone: String,
    pub length: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelInput<'a> {
    resume_text: &'a str,
    #[serde(flatten)]
    request: &'a CoverLetterRequest,
}

pub async fn generate_cover_letter(
    llm: &dyn LlmBackend,
    resume_text: &str,
    request: &CoverLetterRequest,
) -> Result<CoverLetter, AppError> {
    let input_json = serde_json::to_string_pretty(&ModelInput {
        resume_text,
        request,
    })
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize cover letter input: {e}")))?;

    let system = system_with_json_rule(COVER_LETTER_INSTRUCTION);
    let prompt = COVER_LETTER_PROMPT.replace("{input_json}", &input_json);

    let letter = generate_json(llm, &system, &prompt, |letter: &mut CoverLetter| {
        letter.validate()?;
        match_requested_tone(letter, &request.tone)
    })
    .await?;
    Ok(letter)
}

/// The letter must be written in the requested tone; the reported tone is
/// normalised to the caller's spelling.
fn match_requested_tone(letter: &mut CoverLetter, requested: &str) -> Result<(), String> {
    if !letter.tone.eq_ignore_ascii_case(requested.trim()) {
        return Err(format!(
            "`tone` must be \"{requested}\", got \"{}\"",
            letter.tone
        ));
    }
    letter.tone = requested.trim().to_string();
    Ok(())
}
