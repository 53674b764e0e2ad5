use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 hash, never the raw credential
    pub email: String,
    pub bio: String,
    pub education: String,
    pub gender: String,
    pub age: Option<i32>,
    pub certifications: Vec<String>,
    pub profile_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Fresh user with every optional field at its default.
    pub fn new(name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            password: password_hash.into(),
            email: String::new(),
            bio: String::new(),
            education: String::new(),
            gender: String::new(),
            age: None,
            certifications: Vec::new(),
            profile_image: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Full overwrite of the editable profile fields. `profile_image` is only
/// replaced when a new upload is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub bio: String,
    pub education: String,
    pub gender: String,
    pub age: Option<i32>,
    pub certifications: Vec<String>,
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(&self, user: &mut User) {
        user.email = self.email.clone();
        user.bio = self.bio.clone();
        user.education = self.education.clone();
        user.gender = self.gender.clone();
        user.age = self.age;
        user.certifications = self.certifications.clone();
        if let Some(image) = &self.profile_image {
            user.profile_image = image.clone();
        }
    }
}
