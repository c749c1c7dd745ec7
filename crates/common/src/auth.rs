use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const CURRENT_USER_KEY: &str = "current_user";

/// The signed-in account, as seen by every protected handler.
///
/// Inserted into request extensions by [`auth_middleware`]; handlers read it
/// with `Extension<CurrentUser>`. Records created on behalf of a request are
/// tagged with `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}

pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(CURRENT_USER_KEY)
        .await
        .unwrap_or(None)
}

pub async fn auth_middleware(
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match current_user(&session).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
