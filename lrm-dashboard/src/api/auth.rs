//! PIN login and the session middleware
//!
//! Every protected request gets a [`CurrentSession`] extension. With
//! `require_pin` on, requests without a session are turned away: pages
//! redirect to `/login`, JSON and CSV endpoints answer 401.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::ui::layout::{bare_page, escape};
use crate::error::{ApiError, PageResult};
use crate::session::{
    clear_session_cookie, session_cookie, session_token, CurrentSession, SessionRole,
};
use crate::AppState;

/// Attach the caller's session and enforce PIN login when configured
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match session_token(request.headers()) {
        Some(token) => state.sessions.get(&token).await,
        None => None,
    };

    if session.is_none() && state.config.auth.require_pin {
        let path = request.uri().path();
        if path.starts_with("/api/") || path.starts_with("/export/") {
            return ApiError::Unauthorized.into_response();
        }
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        return Redirect::to(&format!("/login?next={}", urlencoding::encode(&target))).into_response();
    }

    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

fn login_html(next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="alert alert-danger">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let body = format!(
        r#"<section class="card login-card">
    <h1>Licensing Dashboard</h1>
    <p>Enter your PIN to continue.</p>
    {error}
    <form method="post" action="/login">
        <input type="hidden" name="next" value="{next}">
        <label for="pin">PIN</label>
        <input id="pin" name="pin" type="password" inputmode="numeric" autocomplete="off" autofocus required>
        <button type="submit" class="btn btn-primary">Sign in</button>
    </form>
</section>"#,
        error = error,
        next = escape(next),
    );
    bare_page("Sign in", &body)
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(login_html(&safe_next(query.next.as_deref()), None))
}

/// POST /login
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> PageResult<Response> {
    let pin = form.pin.trim();
    let next = safe_next(form.next.as_deref());

    let role = if pin.is_empty() {
        None
    } else if state.config.auth.director_pin.as_deref() == Some(pin) {
        Some((SessionRole::Director, "Director".to_string()))
    } else {
        state
            .store
            .list_holders()
            .await?
            .into_iter()
            .find(|h| h.pin.as_deref() == Some(pin))
            .map(|h| (SessionRole::Holder(h.user_id), h.name))
    };

    let Some((role, display_name)) = role else {
        warn!("Rejected login attempt");
        let html = login_html(&next, Some("That PIN was not recognized."));
        return Ok((StatusCode::UNAUTHORIZED, Html(html)).into_response());
    };

    info!("Signed in: {}", display_name);
    let token = state.sessions.create(role, display_name).await;
    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to(&next),
    )
        .into_response())
}

/// GET|POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(session) = state.sessions.remove(&token).await {
            info!("Signed out: {}", session.display_name);
        }
    }
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/manage-licenses?account=jdoe")), "/manage-licenses?account=jdoe");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
