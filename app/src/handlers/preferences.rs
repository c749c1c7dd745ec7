use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use common::i18n::{Locale, LOCALE_SESSION_KEY};
use serde::Deserialize;
use tower_sessions::Session;

pub async fn root_redirect() -> Redirect {
    Redirect::to("/expenses")
}

#[derive(Deserialize)]
pub struct LocaleForm {
    pub locale: String,
}

/// Stores the visitor's language and sends them back to the page they came from.
pub async fn set_locale(
    session: Session,
    headers: HeaderMap,
    Form(payload): Form<LocaleForm>,
) -> Response {
    let locale: Locale = match payload.locale.parse() {
        Ok(locale) => locale,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{}", e)).into_response(),
    };

    if let Err(e) = session.insert(LOCALE_SESSION_KEY, locale).await {
        tracing::error!("Failed to store locale: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Redirect::to(&back_target(&headers)).into_response()
}

// Only same-site paths are followed
fn back_target(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| referer.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .filter(|path| {
            path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
        })
        .unwrap_or_else(|| "/expenses".to_string())
}
