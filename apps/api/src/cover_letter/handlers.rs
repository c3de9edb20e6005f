use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cover_letter::generator::{
    generate_cover_letter, CoverLetter, CoverLetterRequest, DEFAULT_LENGTH, DEFAULT_TONE,
};
use crate::errors::AppError;
use crate::extract::Json;
use crate::models::history::{to_raw, NewHistory};
use crate::quota::{self, ToolKind};
use crate::resume::ingest::{ingest_resume, IngestedResume, ResumeForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterResponse {
    pub cover_letter: CoverLetter,
    /// Retrieval URL of the uploaded resume.
    pub pdf_url: String,
    pub history_id: Uuid,
}

impl CoverLetterRequest {
    pub fn from_form(form: &ResumeForm) -> Result<Self, AppError> {
        let optional = |name: &str, default: &str| {
            form.required(name).unwrap_or_else(|_| default.to_string())
        };
        Ok(CoverLetterRequest {
            job_title: form.required("jobTitle")?,
            company_name: form.required("companyName")?,
            job_description: optional("jobDescription", ""),
            tone: optional("tone", DEFAULT_TONE),
            length: optional("length", DEFAULT_LENGTH),
        })
    }
}

/// POST /api/v1/cover-letter
///
/// Multipart form: `resume` PDF plus `jobTitle`, `companyName`,
/// `jobDescription`, `tone`, `length`.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let mut form = ResumeForm::from_multipart(multipart?).await?;
    let file = form.take_file()?;
    let request = CoverLetterRequest::from_form(&form)?;

    quota::enforce(
        state.store.as_ref(),
        &user,
        ToolKind::CoverLetterGenerator,
        state.config.free_tier_limit,
    )
    .await?;

    let resume = ingest_resume(state.media.as_ref(), &user.user_id, file).await?;
    Ok(Json(record_cover_letter(&state, &user, resume, request).await?))
}

pub async fn record_cover_letter(
    state: &AppState,
    user: &AuthUser,
    resume: IngestedResume,
    request: CoverLetterRequest,
) -> Result<CoverLetterResponse, AppError> {
    let cover_letter = generate_cover_letter(state.llm.as_ref(), &resume.text, &request).await?;

    let input = to_raw(&json!({
        "jobTitle": request.job_title,
        "companyName": request.company_name,
        "jobDescription": request.job_description,
        "tone": request.tone,
        "length": request.length,
        "resumeUrl": resume.stored.url,
    }))?;
    let output = to_raw(&cover_letter)?;
    let history = state
        .store
        .insert_history(NewHistory {
            user_id: &user.user_id,
            tool: ToolKind::CoverLetterGenerator,
            input: &input,
            output: &output,
        })
        .await?;

    Ok(CoverLetterResponse {
        cover_letter,
        pdf_url: resume.stored.url,
        history_id: history.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Plan;
    use crate::cover_letter::generator::tests::letter_json;
    use crate::media::StoredObject;
    use crate::store::Store;
    use crate::testing::{harness, ScriptedLlm};

    fn form(fields: &[(&str, &str)]) -> ResumeForm {
        let mut form = ResumeForm::default();
        for (k, v) in fields {
            form.fields.insert(k.to_string(), v.to_string());
        }
        form
    }

    #[test]
    fn test_request_requires_title_and_company() {
        assert!(CoverLetterRequest::from_form(&form(&[("jobTitle", "Backend Engineer")])).is_err());

        let request = CoverLetterRequest::from_form(&form(&[
            ("jobTitle", "Backend Engineer"),
            ("companyName", "Acme"),
        ]))
        .unwrap();
        assert_eq!(request.tone, DEFAULT_TONE);
        assert_eq!(request.length, DEFAULT_LENGTH);
        assert_eq!(request.job_description, "");
    }

    #[tokio::test]
    async fn test_backend_engineer_at_acme() {
        let h = harness(ScriptedLlm::new([letter_json("professional")]));
        let user = AuthUser {
            user_id: "user_1".to_string(),
            plan: Plan::Free,
            name: None,
        };
        let request = CoverLetterRequest::from_form(&form(&[
            ("jobTitle", "Backend Engineer"),
            ("companyName", "Acme"),
            ("tone", "professional"),
            ("length", "short"),
        ]))
        .unwrap();
        let resume = IngestedResume {
            text: "Jane Doe".to_string(),
            file_name: "jane.pdf".to_string(),
            stored: StoredObject {
                key: "k".to_string(),
                url: "https://media.test/k".to_string(),
            },
        };

        let response = record_cover_letter(&h.state, &user, resume, request)
            .await
            .unwrap();
        assert_eq!(response.cover_letter.tone, "professional");
        assert_eq!(response.pdf_url, "https://media.test/k");
        assert_eq!(
            h.store
                .count_usage("user_1", ToolKind::CoverLetterGenerator)
                .await
                .unwrap(),
            1
        );
    }
}
