//! Résumé document storage. Applications only hold the storage key; the bytes
//! live on local disk under `<media_root>/resumes/` or in an S3 bucket.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const RESUME_PREFIX: &str = "resumes";

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Stores the document and returns its key.
    async fn save(&self, file_name: &str, content: Bytes) -> Result<String, AppError>;
    async fn load(&self, key: &str) -> Result<Bytes, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Reduces an uploaded file name to a safe basename.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `resumes/<uuid>_<sanitized name>`: unique per upload, keeps the original extension.
pub fn storage_key(file_name: &str) -> String {
    format!(
        "{RESUME_PREFIX}/{}_{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

/// MIME type served for a stored résumé, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

fn check_key(key: &str) -> Result<(), AppError> {
    let path = Path::new(key);
    let confined = path.starts_with(RESUME_PREFIX)
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if confined {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Resume {key} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local disk
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalResumeStore {
    root: PathBuf,
}

impl LocalResumeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ResumeStore for LocalResumeStore {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<String, AppError> {
        let key = storage_key(file_name);
        let path = self.path_for(&key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Storage(format!("create {}: {e}", dir.display())))?;
        }
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", path.display())))?;

        info!("Stored resume at {}", path.display());
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<Bytes, AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Resume {key} not found")))
            }
            Err(e) => Err(AppError::Storage(format!("read {}: {e}", path.display()))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("remove {}: {e}", path.display()))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3ResumeStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResumeStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ResumeStore for S3ResumeStore {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<String, AppError> {
        let key = storage_key(file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(content))
            .content_type(content_type_for(file_name))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<Bytes, AppError> {
        check_key(key)?;
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 download failed: {e}")))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        check_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[derive(Default)]
pub struct MemoryResumeStore {
    files: std::sync::Mutex<std::collections::HashMap<String, Bytes>>,
}

#[cfg(test)]
impl MemoryResumeStore {
    pub fn len(&self) -> usize {
        self.files.lock().expect("poisoned").len()
    }
}

#[cfg(test)]
#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<String, AppError> {
        let key = storage_key(file_name);
        self.files
            .lock()
            .expect("poisoned")
            .insert(key.clone(), content);
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<Bytes, AppError> {
        self.files
            .lock()
            .expect("poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Resume {key} not found")))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.files.lock().expect("poisoned").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\my cv.pdf"), "my_cv.pdf");
        assert_eq!(sanitize_file_name("résumé.docx"), "r_sum_.docx");
    }

    #[test]
    fn test_sanitize_never_empty() {
        assert_eq!(sanitize_file_name(""), "resume");
        assert_eq!(sanitize_file_name("..."), "resume");
    }

    #[test]
    fn test_storage_key_is_under_prefix_and_keeps_extension() {
        let key = storage_key("cv.pdf");
        assert!(key.starts_with("resumes/"));
        assert!(key.ends_with("_cv.pdf"));
        assert_ne!(key, storage_key("cv.pdf"));
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("a.doc"), "application/msword");
        assert!(content_type_for("a.docx").contains("wordprocessingml"));
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_keys_outside_prefix_rejected() {
        assert!(check_key("resumes/abc_cv.pdf").is_ok());
        assert!(check_key("resumes/../secret").is_err());
        assert!(check_key("/etc/passwd").is_err());
        assert!(check_key("other/cv.pdf").is_err());
    }

    #[tokio::test]
    async fn test_local_store_round_trip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalResumeStore::new(dir.path());

        let key = store
            .save("cv.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(dir.path().join(&key).exists());
        assert_eq!(store.load(&key).await.unwrap(), Bytes::from_static(b"%PDF-1.4"));

        store.delete(&key).await.unwrap();
        assert!(matches!(store.load(&key).await, Err(AppError::NotFound(_))));
        // deleting twice is fine
        store.delete(&key).await.unwrap();
    }
}
