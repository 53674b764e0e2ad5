use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Logged-in user resolved from the session cookie.
///
/// Rejects with a redirect to the login page rather than an error status.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub name: String,
    pub user_id: Uuid,
}

/// Session id carried by the request's cookie, if it parses.
pub fn session_id(jar: &CookieJar, state: &AppState) -> Option<Uuid> {
    jar.get(&state.config.session.cookie_name)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(session_id) = session_id(&jar, state) else {
            debug!(path = %parts.uri.path(), "no session cookie");
            return Err(Redirect::to("/"));
        };

        match state.sessions.get(session_id).await {
            Ok(Some(data)) => Ok(SessionUser {
                name: data.user,
                user_id: data.user_id,
            }),
            Ok(None) => {
                debug!(%session_id, "unknown session");
                Err(Redirect::to("/"))
            }
            Err(e) => {
                warn!(error = %e, %session_id, "session lookup failed");
                Err(Redirect::to("/"))
            }
        }
    }
}
