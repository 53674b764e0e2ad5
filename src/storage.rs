use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;

/// Public URL prefix the upload directory is served under.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Persist `body` and return its path relative to the static root.
    async fn save(&self, original_name: &str, body: Bytes) -> anyhow::Result<String>;
    async fn remove(&self, public_path: &str) -> anyhow::Result<()>;
}

/// `<unix-epoch-ms>-<original-filename>` with the name reduced to a safe
/// single path component.
pub fn stored_name(epoch_ms: i128, original_name: &str) -> String {
    lazy_static! {
        static ref UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    }
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "upload" } else { cleaned };
    format!("{}-{}", epoch_ms, cleaned)
}

fn now_ms() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn local_path(&self, public_path: &str) -> anyhow::Result<PathBuf> {
        let name = public_path
            .strip_prefix(UPLOAD_URL_PREFIX)
            .filter(|n| !n.is_empty() && !n.contains(['/', '\\']) && *n != "..")
            .with_context(|| format!("not an upload path: {}", public_path))?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl UploadStore for DiskStorage {
    async fn save(&self, original_name: &str, body: Bytes) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;

        let name = stored_name(now_ms(), original_name);
        let path = self.root.join(&name);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;

        tracing::debug!(path = %path.display(), bytes = body.len(), "upload stored");
        Ok(format!("{}{}", UPLOAD_URL_PREFIX, name))
    }

    async fn remove(&self, public_path: &str) -> anyhow::Result<()> {
        let path = self.local_path(public_path)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("remove upload {}", path.display()))?;
        Ok(())
    }
}

/// Keeps uploads in memory; lets tests observe what was written and removed.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    pub files: std::sync::Mutex<std::collections::BTreeMap<String, Bytes>>,
}

#[cfg(test)]
#[async_trait]
impl UploadStore for MemoryStorage {
    async fn save(&self, original_name: &str, body: Bytes) -> anyhow::Result<String> {
        let path = format!("{}{}", UPLOAD_URL_PREFIX, stored_name(now_ms(), original_name));
        self.files.lock().unwrap().insert(path.clone(), body);
        Ok(path)
    }

    async fn remove(&self, public_path: &str) -> anyhow::Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(public_path)
            .map(|_| ())
            .with_context(|| format!("no such upload {}", public_path))
    }
}
