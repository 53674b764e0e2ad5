use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        extractors::session_id,
        services,
    },
    error::Result,
    sessions::SessionData,
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/signup", get(signup_page).post(signup))
        .route("/login", axum::routing::post(login))
        .route("/logout", get(logout))
}

pub async fn login_page() -> Html<String> {
    views::login_page()
}

pub async fn signup_page() -> Html<String> {
    views::signup_page()
}

#[instrument(skip(state, form), fields(user = %form.username))]
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Result<Redirect> {
    services::signup(&state, form).await?;
    Ok(Redirect::to("/"))
}

#[instrument(skip(state, jar, form), fields(user = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect)> {
    let user = services::login(&state, &form).await?;

    // Logging in again replaces whatever session the client held.
    if let Some(previous) = session_id(&jar, &state) {
        if let Err(e) = state.sessions.destroy(previous).await {
            error!(error = %e, session_id = %previous, "failed to drop previous session");
        }
    }

    let sid = Uuid::new_v4();
    state
        .sessions
        .set(
            sid,
            SessionData {
                user: user.name,
                user_id: user.id,
            },
        )
        .await?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), sid.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.session.cookie_secure);

    Ok((jar.add(cookie), Redirect::to("/home")))
}

/// Ends the session if there is one; always lands on the login page.
#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(sid) = session_id(&jar, &state) {
        if let Err(e) = state.sessions.destroy(sid).await {
            error!(error = %e, session_id = %sid, "failed to destroy session");
        }
    }
    let expired = Cookie::build((state.config.session.cookie_name.clone(), "")).path("/");
    (jar.remove(expired), Redirect::to("/"))
}
