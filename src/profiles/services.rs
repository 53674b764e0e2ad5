use tracing::info;

use crate::auth::repo_types::{ProfileUpdate, User};
use crate::error::{AppError, Result};
use crate::media::{self, UploadedFile};
use crate::posts::repo_types::Post;
use crate::state::AppState;

/// A user and everything they posted, newest first.
pub async fn get_profile(st: &AppState, username: &str) -> Result<(User, Vec<Post>)> {
    let user = st
        .users
        .find_by_name(username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let posts = st.posts.list_by_username(username).await?;
    Ok((user, posts))
}

/// Overwrites the session user's profile. A new image replaces the old
/// one; without an upload the stored image is left alone.
pub async fn update_profile(
    st: &AppState,
    session_user: &str,
    mut update: ProfileUpdate,
    image: Option<UploadedFile>,
) -> Result<User> {
    let saved = match &image {
        Some(file) => media::services::persist_all(st, &[file]).await?,
        None => Vec::new(),
    };
    update.profile_image = saved.first().cloned();

    let result = match st.users.update_profile(session_user, &update).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::NotFound("User not found".into())),
        Err(e) => Err(e),
    };

    if result.is_err() {
        media::services::discard(st, &saved).await;
    }
    let user = result?;

    info!(user = %user.name, image_changed = !saved.is_empty(), "profile updated");
    Ok(user)
}
