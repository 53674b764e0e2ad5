use crate::auth::repo_types::ProfileUpdate;
use crate::media::MultipartForm;

/// Comma separated list, trimmed, blanks dropped.
pub fn parse_certifications(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Integer age, or nothing when blank or unparsable.
pub fn parse_age(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

impl ProfileUpdate {
    /// Builds a full overwrite from the submitted form. Fields missing from
    /// the form reset to their defaults; the image is filled in later.
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            email: form.text("email").to_string(),
            bio: form.text("bio").to_string(),
            education: form.text("education").to_string(),
            gender: form.text("gender").to_string(),
            age: parse_age(form.text("age")),
            certifications: parse_certifications(form.text("certifications")),
            profile_image: None,
        }
    }
}
