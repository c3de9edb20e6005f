//! Resume ingestion: multipart form parsing, PDF text extraction and upload.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::media::{resume_object_key, MediaStore, StoredObject};

/// Upper bound on the uploaded resume size.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const RESUME_FIELD: &str = "resume";
const UNREADABLE: &str = "Resume file is missing or unreadable";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A multipart form with one optional file (`resume`) and text fields.
#[derive(Debug, Default)]
pub struct ResumeForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl ResumeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ResumeForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == RESUME_FIELD {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
                form.file = Some(UploadedFile { file_name, bytes });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read field {name}: {e}")))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| AppError::Validation(UNREADABLE.to_string()))?;
        ensure_pdf(&file)?;
        Ok(file)
    }

    /// Trimmed non-empty text field, or a validation error naming it.
    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }
}

pub fn ensure_pdf(file: &UploadedFile) -> Result<(), AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation(UNREADABLE.to_string()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "Resume file exceeds {} MiB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    if !file.bytes.starts_with(b"%PDF") {
        return Err(AppError::Validation("Resume must be a PDF file".to_string()));
    }
    Ok(())
}

/// Extracts text on a blocking thread. Blank text is a validation error.
pub async fn extract_text(bytes: Bytes) -> Result<String, AppError> {
    let extracted =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;

    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e:?}");
            return Err(AppError::Validation(UNREADABLE.to_string()));
        }
        Err(e) => {
            warn!("PDF text extraction aborted: {e}");
            return Err(AppError::Validation(UNREADABLE.to_string()));
        }
    };

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(AppError::Validation(UNREADABLE.to_string()));
    }
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct IngestedResume {
    pub text: String,
    pub file_name: String,
    pub stored: StoredObject,
}

/// Extracts text, then uploads the raw bytes. Both must succeed.
/// The upload is not rolled back if a later step fails.
pub async fn ingest_resume(
    media: &dyn MediaStore,
    owner: &str,
    file: UploadedFile,
) -> Result<IngestedResume, AppError> {
    let text = extract_text(file.bytes.clone()).await?;
    let key = resume_object_key(owner, &file.file_name);
    let stored = media.upload(&key, file.bytes, "application/pdf").await?;
    info!(
        "Ingested resume {} ({} chars of text) for user {}",
        stored.key,
        text.len(),
        owner
    );
    Ok(IngestedResume {
        text,
        file_name: file.file_name,
        stored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryMedia;

    fn file(bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: "cv.pdf".to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    /// Single-page PDF with one Helvetica line per entry in `lines`.
    fn text_pdf(lines: &[&str]) -> Bytes {
        let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                content.push_str("0 -16 Td\n");
            }
            content.push_str(&format!("({line}) Tj\n"));
        }
        content.push_str("ET");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        ));
        Bytes::from(pdf)
    }

    #[tokio::test]
    async fn test_extracts_text_from_real_pdf() {
        let text = extract_text(text_pdf(&["Jane Doe", "Rust Engineer"]))
            .await
            .unwrap();
        for word in ["Jane", "Doe", "Rust", "Engineer"] {
            assert!(text.contains(word), "missing {word:?} in {text:?}");
        }
        assert!(!text.contains("\n\n"));
    }

    #[tokio::test]
    async fn test_readable_pdf_is_uploaded_under_owner_prefix() {
        let media = MemoryMedia::default();
        let bytes = text_pdf(&["Jane Doe", "Rust Engineer"]);
        let upload = UploadedFile {
            file_name: "cv.pdf".to_string(),
            bytes: bytes.clone(),
        };
        ensure_pdf(&upload).unwrap();

        let resume = ingest_resume(&media, "user_1", upload).await.unwrap();
        assert!(resume.text.contains("Engineer"));
        assert!(resume.stored.key.starts_with("resumes/user_1/"));
        assert!(resume.stored.url.ends_with(&resume.stored.key));

        let objects = media.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].1, bytes);
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(ensure_pdf(&file(b"")), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_non_pdf_upload_is_rejected() {
        let err = ensure_pdf(&file(b"PK\x03\x04 this is a docx")).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("PDF")));
    }

    #[test]
    fn test_pdf_magic_is_accepted() {
        assert!(ensure_pdf(&file(b"%PDF-1.7\n...")).is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_not_uploaded() {
        let media = MemoryMedia::default();
        let result = ingest_resume(&media, "user_1", file(b"%PDF-1.4\nnot really a pdf")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(media.objects.lock().unwrap().is_empty());
    }

    #[test]
    fn test_required_field_is_trimmed() {
        let mut form = ResumeForm::default();
        form.fields.insert("tone".into(), "  professional ".into());
        form.fields.insert("length".into(), "   ".into());
        assert_eq!(form.required("tone").unwrap(), "professional");
        assert!(form.required("length").is_err());
        assert!(form.required("jobTitle").is_err());
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let mut form = ResumeForm::default();
        assert!(matches!(form.take_file(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_normalize_whitespace_drops_blank_lines() {
        assert_eq!(
            normalize_whitespace("Jane Doe   \n\n\n  \nRust Engineer\n"),
            "Jane Doe\nRust Engineer"
        );
    }
}
