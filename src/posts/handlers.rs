use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::SessionUser,
    error::Result,
    media,
    posts::{
        dto::{CommentForm, NewPostForm},
        services,
    },
    state::AppState,
    views,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/create-post",
            // image + video + text fields
            post(create_post).layer(DefaultBodyLimit::max(2 * max_upload_bytes + 64 * 1024)),
        )
        .route("/like-post/:id", post(like_post))
        .route("/comment-post/:id", post(comment_post))
}

#[instrument(skip(state, session), fields(user = %session.name))]
pub async fn home(State(state): State<AppState>, session: SessionUser) -> Html<String> {
    let posts = services::list_feed(&state).await;
    views::home_page(&session.name, &posts)
}

#[instrument(skip(state, session, mp), fields(user = %session.name, user_id = %session.user_id))]
pub async fn create_post(
    State(state): State<AppState>,
    session: SessionUser,
    mp: Multipart,
) -> Result<Redirect> {
    let form =
        media::services::read_form(mp, &["image", "video"], state.config.max_upload_bytes).await?;
    services::create_post(&state, &session.name, NewPostForm::from(form)).await?;
    Ok(Redirect::to("/home"))
}

#[instrument(skip(state, session), fields(user = %session.name))]
pub async fn like_post(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let post_id = services::parse_post_id(&id)?;
    services::toggle_like(&state, post_id, &session.name).await?;
    Ok(Redirect::to("/home"))
}

#[instrument(skip(state, session, form), fields(user = %session.name))]
pub async fn comment_post(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect> {
    // Blank comments bounce back before the post is even looked up.
    if form.comment.trim().is_empty() {
        return Ok(Redirect::to("/home"));
    }
    let post_id = services::parse_post_id(&id)?;
    services::add_comment(&state, post_id, &session.name, &form.comment).await?;
    Ok(Redirect::to("/home"))
}
