use crate::models::{LoginForm, RegisterForm, User};
use crate::service::{UserError, UserService};
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use common::{
    auth::{current_user, CurrentUser, CURRENT_USER_KEY},
    AppState,
};
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            UserError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            UserError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            UserError::Conflict(_) => (StatusCode::CONFLICT, "Email already registered".to_string()),
            UserError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            UserError::Infrastructure(msg) => {
                tracing::error!("Infrastructure error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        render_login(status, Some(msg))
    }
}

fn render_login(status: StatusCode, error: Option<String>) -> Response {
    let template = LoginTemplate { error };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Template Error").into_response(),
    }
}

pub fn auth_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_get).post(login_post))
        .route("/register", post(register_post))
        .route("/logout", post(logout))
        .with_state(state)
}

async fn sign_in(session: &Session, user: User) -> Result<(), UserError> {
    let current = CurrentUser {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
    };
    session
        .cycle_id()
        .await
        .map_err(|e| UserError::Infrastructure(e.to_string()))?;
    session
        .insert(CURRENT_USER_KEY, current)
        .await
        .map_err(|e| UserError::Infrastructure(e.to_string()))
}

async fn login_get(session: Session) -> Response {
    if current_user(&session).await.is_some() {
        return Redirect::to("/").into_response();
    }
    render_login(StatusCode::OK, None)
}

async fn login_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> Result<Redirect, UserError> {
    let user = UserService::authenticate(&state.db, &payload.email, &payload.password)
        .await
        .inspect_err(|e| tracing::info!("Login rejected: {}", e))?;

    sign_in(&session, user).await?;
    Ok(Redirect::to("/"))
}

async fn register_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<RegisterForm>,
) -> Result<Redirect, UserError> {
    let user = UserService::register(&state.db, payload).await?;
    sign_in(&session, user).await?;
    Ok(Redirect::to("/"))
}

async fn logout(session: Session) -> Redirect {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to clear session on logout: {}", e);
    }
    Redirect::to("/login")
}
