//! Object storage for uploaded files.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub mod s3;

pub use s3::S3MediaStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("upload of {key} timed out after {secs}s")]
    Timeout { key: String, secs: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    /// Public retrieval URL.
    pub url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// `resumes/{owner}/{uuid}-{file name}`, with the file name reduced to a safe charset.
pub fn resume_object_key(owner: &str, file_name: &str) -> String {
    let safe_owner: String = owner
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let mut safe_name: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe_name.trim_matches(['.', '_']).is_empty() {
        safe_name = "resume.pdf".to_string();
    }
    format!("resumes/{}/{}-{}", safe_owner, Uuid::new_v4(), safe_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_strips_path_and_odd_characters() {
        let key = resume_object_key("user_2abc", "../../etc/My Resume (final).pdf");
        assert!(key.starts_with("resumes/user_2abc/"));
        assert!(key.ends_with("-My_Resume__final_.pdf"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_resume_key_falls_back_for_empty_name() {
        let key = resume_object_key("user_1", "");
        assert!(key.ends_with("-resume.pdf"));
    }
}
