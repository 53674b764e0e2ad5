use tracing::{info, warn};

use crate::auth::dto::{LoginForm, SignupForm};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::User;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Creates an account. The stored password is always an Argon2 hash.
pub async fn signup(st: &AppState, form: SignupForm) -> Result<User> {
    let username = form.username.as_str();

    if form.password != form.confirm_password {
        warn!(user = %username, "signup password mismatch");
        return Err(AppError::Validation("Passwords do not match!".into()));
    }

    if st.users.find_by_name(username).await?.is_some() {
        warn!(user = %username, "signup name taken");
        return Err(AppError::Conflict("User already exists!".into()));
    }

    let hash = hash_password(&form.password)?;
    let user = User::new(username, hash);
    // The unique index still guards against a concurrent signup slipping
    // past the lookup above.
    st.users.insert(&user).await?;

    info!(user = %user.name, user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks credentials and returns the matching user.
pub async fn login(st: &AppState, form: &LoginForm) -> Result<User> {
    let user = st
        .users
        .find_by_name(&form.username)
        .await?
        .ok_or_else(|| {
            warn!(user = %form.username, "login unknown user");
            AppError::NotFound("User not found".into())
        })?;

    if !verify_password(&form.password, &user.password)? {
        warn!(user = %user.name, "login wrong password");
        return Err(AppError::Auth("Wrong password".into()));
    }

    info!(user = %user.name, user_id = %user.id, "user logged in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_form(name: &str, pw: &str, confirm: &str) -> SignupForm {
        SignupForm {
            username: name.into(),
            password: pw.into(),
            confirm_password: confirm.into(),
        }
    }

    fn login_form(name: &str, pw: &str) -> LoginForm {
        LoginForm {
            username: name.into(),
            password: pw.into(),
        }
    }

    #[tokio::test]
    async fn signup_stores_a_hash_not_the_password() {
        let state = AppState::fake();
        signup(&state, signup_form("alice", "pw1", "pw1")).await.unwrap();

        let stored = state.users.find_by_name("alice").await.unwrap().unwrap();
        assert_ne!(stored.password, "pw1");
        assert!(!stored.password.contains("pw1"));
        assert!(verify_password("pw1", &stored.password).unwrap());
        assert_eq!(stored.email, "");
        assert!(stored.certifications.is_empty());
        assert_eq!(stored.age, None);
    }

    #[tokio::test]
    async fn signup_rejects_mismatched_passwords() {
        let state = AppState::fake();
        let err = signup(&state, signup_form("alice", "pw1", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Passwords do not match!"));
        assert!(state.users.find_by_name("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signup_keeps_names_with_spaces_and_accents() {
        let state = AppState::fake();
        for name in ["Mary Jane", "José"] {
            let user = signup(&state, signup_form(name, "pw1", "pw1")).await.unwrap();
            assert_eq!(user.name, name);
            let found = login(&state, &login_form(name, "pw1")).await.unwrap();
            assert_eq!(found.id, user.id);
        }
    }

    #[tokio::test]
    async fn second_signup_with_same_name_conflicts() {
        let state = AppState::fake();
        let first = signup(&state, signup_form("alice", "pw1", "pw1")).await.unwrap();
        let err = signup(&state, signup_form("alice", "other", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = state.users.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn login_checks_credentials() {
        let state = AppState::fake();
        signup(&state, signup_form("alice", "pw1", "pw1")).await.unwrap();

        let user = login(&state, &login_form("alice", "pw1")).await.unwrap();
        assert_eq!(user.name, "alice");

        let wrong = login(&state, &login_form("alice", "nope")).await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(ref m) if m == "Wrong password"));

        let unknown = login(&state, &login_form("mallory", "pw1")).await.unwrap_err();
        assert!(matches!(unknown, AppError::NotFound(ref m) if m == "User not found"));
    }
}
