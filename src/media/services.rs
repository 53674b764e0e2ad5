use std::collections::HashMap;

use axum::extract::{multipart::Field, Multipart};
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// A file received from a multipart form, already checked against the
/// upload policy.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Text fields plus at most one file per accepted file field.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

pub fn is_allowed_mime(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

/// Reads the whole multipart body. Only `file_fields` may carry files, each
/// at most once; every file must be an image or video of at most
/// `max_bytes`.
pub async fn read_form(
    mut mp: Multipart,
    file_fields: &[&str],
    max_bytes: usize,
) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(field) = mp.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(malformed)?;
            form.fields.insert(name, value);
            continue;
        };

        if !file_fields.contains(&name.as_str()) || form.files.contains_key(&name) {
            warn!(field = %name, "unexpected file field");
            return Err(AppError::Upload(format!("Unexpected field: {}", name)));
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());

        let body = read_limited(field, max_bytes).await?;

        // Browsers submit an empty part when no file was chosen.
        if file_name.is_empty() && body.is_empty() {
            continue;
        }

        if !is_allowed_mime(&content_type) {
            warn!(field = %name, %content_type, "rejected upload type");
            return Err(AppError::Upload(
                "Only image and video files are allowed!".into(),
            ));
        }

        debug!(field = %name, %file_name, %content_type, bytes = body.len(), "file received");
        form.files.insert(
            name.clone(),
            UploadedFile {
                field: name,
                file_name,
                content_type,
                body,
            },
        );
    }

    Ok(form)
}

async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(AppError::UploadTooLarge(max_bytes));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Upload(format!("Malformed upload: {}", e))
}

/// Writes every file, returning their public paths in the same order.
/// Files written before a failure are removed again.
pub async fn persist_all(st: &AppState, files: &[&UploadedFile]) -> Result<Vec<String>> {
    let mut saved = Vec::with_capacity(files.len());
    for file in files {
        match st.uploads.save(&file.file_name, file.body.clone()).await {
            Ok(path) => {
                debug!(field = %file.field, content_type = %file.content_type, %path, "upload saved");
                saved.push(path);
            }
            Err(e) => {
                discard(st, &saved).await;
                return Err(AppError::Internal(e.context(format!("store {}", file.field))));
            }
        }
    }
    Ok(saved)
}

/// Best-effort removal of uploads whose owning document was never saved.
pub async fn discard(st: &AppState, paths: &[String]) {
    for path in paths {
        if let Err(e) = st.uploads.remove(path).await {
            warn!(error = %e, %path, "failed to remove orphaned upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_and_videos_pass() {
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("video/mp4"));
        assert!(!is_allowed_mime("application/pdf"));
        assert!(!is_allowed_mime("text/html"));
        assert!(!is_allowed_mime("imagex/png"));
    }

    #[tokio::test]
    async fn persist_all_then_discard() {
        let (state, uploads) = AppState::fake_with_uploads();
        let file = UploadedFile {
            field: "image".into(),
            file_name: "cat.png".into(),
            content_type: "image/png".into(),
            body: Bytes::from_static(b"png"),
        };

        let paths = persist_all(&state, &[&file]).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("-cat.png"));
        assert_eq!(uploads.files.lock().unwrap().len(), 1);

        discard(&state, &paths).await;
        assert!(uploads.files.lock().unwrap().is_empty());
    }
}
