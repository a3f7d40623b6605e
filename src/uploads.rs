use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use rand_core::{OsRng, RngCore};

pub const PUBLIC_PREFIX: &str = "/api/uploads/";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_MIME: [(&str, &str); 5] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
    ("image/svg+xml", ".svg"),
];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large. Max {}MB", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("Invalid path")]
    InvalidPath,

    #[error("Can only delete uploaded files")]
    NotManaged,

    #[error("File not found")]
    NotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub url: String,
    pub name: String,
    pub size: usize,
    pub mime: String,
}

/// Filesystem blob store behind the `/api/uploads/` URL prefix.
#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension_for(mime: &str) -> Result<&'static str, UploadError> {
        ALLOWED_MIME
            .iter()
            .find(|(allowed, _)| *allowed == mime)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| UploadError::UnsupportedType(mime.to_string()))
    }

    pub async fn store(
        &self,
        original_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        let ext = Self::extension_for(mime)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let name = unique_file_name(original_name, ext);
        tokio::fs::write(self.root.join(&name), bytes).await?;

        Ok(StoredUpload {
            url: format!("{PUBLIC_PREFIX}{name}"),
            name,
            size: bytes.len(),
            mime: mime.to_string(),
        })
    }

    /// Reads a stored file by its path below the upload root.
    pub async fn open(&self, relative: &str) -> Result<(Vec<u8>, &'static str), UploadError> {
        if relative.is_empty() || relative.contains("..") || relative.contains('\\') {
            return Err(UploadError::InvalidPath);
        }
        let path = self.root.join(relative.trim_start_matches('/'));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(&path))),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes a file addressed by its public URL.
    pub async fn remove(&self, url: &str) -> Result<(), UploadError> {
        let name = managed_file_name(url).ok_or(UploadError::NotManaged)?;
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort cleanup of an entity image. External and placeholder
    /// images are left alone, and failures are only logged.
    pub async fn discard(&self, url: &str) {
        if url.trim().is_empty() || url.contains("placeholder") || managed_file_name(url).is_none() {
            return;
        }
        if let Err(err) = self.remove(url).await {
            log::warn!("Failed to delete uploaded image {url}: {err}");
        }
    }
}

/// File name of a URL under the managed prefix, if it is one.
fn managed_file_name(url: &str) -> Option<&str> {
    let rest = url.strip_prefix(PUBLIC_PREFIX)?;
    let name = rest.rsplit('/').next()?;
    if name.is_empty() || name == ".." || name == "." || name.contains('\\') {
        return None;
    }
    Some(name)
}

fn sanitize_base(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let mut out = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for ch in stem.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    let trimmed = out.trim_matches('-');
    trimmed.chars().take(80).collect()
}

fn unique_file_name(original_name: &str, ext: &str) -> String {
    let base = sanitize_base(original_name);
    let base = if base.is_empty() { "upload".to_string() } else { base };

    let mut suffix = [0u8; 6];
    OsRng.fill_bytes(&mut suffix);
    let suffix: String = suffix.iter().map(|byte| format!("{byte:02x}")).collect();

    format!("{base}-{}-{suffix}{ext}", Utc::now().timestamp_millis())
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
