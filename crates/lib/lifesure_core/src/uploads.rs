//! Document intake: on-disk storage for policy images and claim documents.
//!
//! Files live under `<root>/<scope>/<uuid v4>.<ext>` and are referenced by
//! `<public_base_url>/uploads/<scope>/<file>`.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default per-file size cap: 5 MiB.
pub const DEFAULT_MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("Upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a multipart route accepts for its file field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRules {
    /// Multipart field name carrying files.
    pub field: &'static str,
    /// Sub-directory under the upload root.
    pub scope: &'static str,
    pub max_files: usize,
    /// Allowed extensions, lower-case, without the dot.
    pub extensions: &'static [&'static str],
    pub mime_types: &'static [&'static str],
}

/// Single policy image.
pub const POLICY_IMAGE: UploadRules = UploadRules {
    field: "image",
    scope: "policies",
    max_files: 1,
    extensions: &["jpeg", "jpg", "png", "gif"],
    mime_types: &["image/jpeg", "image/jpg", "image/png", "image/gif"],
};

/// Up to ten claim documents.
pub const CLAIM_DOCUMENTS: UploadRules = UploadRules {
    field: "documents",
    scope: "claims",
    max_files: 10,
    extensions: &["jpeg", "jpg", "png", "pdf"],
    mime_types: &["image/jpeg", "image/jpg", "image/png", "application/pdf"],
};

impl UploadRules {
    /// Check a file's name and declared content type, returning its
    /// normalised extension.
    pub fn accept(&self, file_name: &str, content_type: Option<&str>) -> Result<String, UploadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mime = content_type.unwrap_or_default().to_ascii_lowercase();

        if !self.extensions.contains(&ext.as_str()) || !self.mime_types.contains(&mime.as_str()) {
            return Err(UploadError::Rejected(format!(
                "Only {} files are allowed for {}",
                self.extensions.join(", "),
                self.field
            )));
        }
        Ok(ext)
    }
}

/// Local-disk upload storage.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
    public_base_url: String,
    max_file_bytes: usize,
}

impl UploadStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str, max_file_bytes: usize) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_file_bytes,
        }
    }

    /// Fail once a file grows past the per-file cap.
    pub fn check_size(&self, field: &str, len: usize) -> Result<(), UploadError> {
        if len > self.max_file_bytes {
            return Err(UploadError::TooLarge(format!(
                "File in {field} exceeds the {} byte limit",
                self.max_file_bytes
            )));
        }
        Ok(())
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, scope: &str, file_name: &str) -> String {
        format!("{}/uploads/{scope}/{file_name}", self.public_base_url)
    }

    /// Persist `bytes` under a fresh name and return its public URL.
    pub async fn save(&self, rules: &UploadRules, ext: &str, bytes: &[u8]) -> Result<String, UploadError> {
        self.check_size(rules.field, bytes.len())?;
        let dir = self.root.join(rules.scope);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(dir.join(&file_name), bytes).await?;
        debug!(scope = rules.scope, file = %file_name, size = bytes.len(), "stored upload");
        Ok(self.url_for(rules.scope, &file_name))
    }

    /// Map a stored URL back to its file, rejecting anything that would
    /// escape the upload root.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let (_, relative) = url.split_once("/uploads/")?;
        let relative = Path::new(relative);
        let mut parts = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => parts += 1,
                _ => return None,
            }
        }
        (parts > 0).then(|| self.root.join(relative))
    }

    /// Delete a stored file. Missing files are fine; other failures are
    /// logged and swallowed.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            warn!(url, "refusing to remove upload outside the upload root");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "failed to remove upload: {e}"),
        }
    }

    pub async fn remove_all<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.remove(url.as_ref()).await;
        }
    }
}
