pub mod services;

pub use services::{MultipartForm, UploadedFile};
