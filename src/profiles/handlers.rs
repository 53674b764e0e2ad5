use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{extractors::SessionUser, repo_types::ProfileUpdate},
    error::Result,
    media,
    profiles::services,
    state::AppState,
    views,
};

pub fn profile_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/profile/:username", get(view_profile))
        .route(
            "/edit-profile",
            get(edit_profile_page)
                .post(edit_profile)
                .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)),
        )
}

#[instrument(skip(state, session), fields(viewer = %session.name))]
pub async fn view_profile(
    State(state): State<AppState>,
    session: SessionUser,
    Path(username): Path<String>,
) -> Result<Html<String>> {
    let (user, posts) = services::get_profile(&state, &username).await?;
    Ok(views::profile_page(&session.name, &user, &posts))
}

#[instrument(skip(state, session), fields(user = %session.name))]
pub async fn edit_profile_page(
    State(state): State<AppState>,
    session: SessionUser,
) -> std::result::Result<Html<String>, Redirect> {
    match state.users.find_by_name(&session.name).await {
        Ok(user) => Ok(views::edit_profile_page(&session.name, user.as_ref())),
        Err(e) => {
            error!(error = %e, "failed to load profile for editing");
            Err(Redirect::to("/home"))
        }
    }
}

#[instrument(skip(state, session, mp), fields(user = %session.name, user_id = %session.user_id))]
pub async fn edit_profile(
    State(state): State<AppState>,
    session: SessionUser,
    mp: Multipart,
) -> Result<Redirect> {
    let mut form =
        media::services::read_form(mp, &["profileImage"], state.config.max_upload_bytes).await?;
    let image = form.take_file("profileImage");
    let update = ProfileUpdate::from_form(&form);

    services::update_profile(&state, &session.name, update, image).await?;
    Ok(Redirect::to(&views::profile_href(&session.name)))
}
