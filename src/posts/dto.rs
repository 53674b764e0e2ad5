use serde::Deserialize;

use crate::media::{MultipartForm, UploadedFile};

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

/// Parsed `/create-post` submission.
#[derive(Debug, Default)]
pub struct NewPostForm {
    pub content: String,
    pub image: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl From<MultipartForm> for NewPostForm {
    fn from(mut form: MultipartForm) -> Self {
        Self {
            content: form.text("content").to_string(),
            image: form.take_file("image"),
            video: form.take_file("video"),
        }
    }
}
