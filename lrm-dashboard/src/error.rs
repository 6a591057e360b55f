//! Error types for lrm-dashboard
//!
//! JSON endpoints return [`ApiError`]; HTML pages return [`PageError`],
//! which renders the same failure as a styled page.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::ui::layout::escape;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a second license in the same state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No session while PINs are required (401)
    #[error("Login required")]
    Unauthorized,

    /// Session may not see the requested account (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// lrm-common error
    #[error(transparent)]
    Common(#[from] lrm_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(err) => match err {
                lrm_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                lrm_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                lrm_common::Error::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Common(err) => match err {
                lrm_common::Error::NotFound(_) => "NOT_FOUND",
                lrm_common::Error::InvalidInput(_) => "BAD_REQUEST",
                lrm_common::Error::Conflict(_) => "CONFLICT",
                _ => "COMMON_ERROR",
            },
        }
    }

    /// User-facing message without the variant prefix for common errors
    pub fn message(&self) -> String {
        match self {
            ApiError::Common(
                lrm_common::Error::NotFound(msg)
                | lrm_common::Error::InvalidInput(msg)
                | lrm_common::Error::Conflict(msg),
            ) => msg.clone(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error rendered as an HTML page
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PageError(#[from] pub ApiError);

impl From<lrm_common::Error> for PageError {
    fn from(err: lrm_common::Error) -> Self {
        PageError(ApiError::Common(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();
        let status = err.status();
        let title = match status {
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::BAD_REQUEST => "Invalid Request",
            StatusCode::CONFLICT => "Already Exists",
            StatusCode::UNAUTHORIZED => "Login Required",
            StatusCode::FORBIDDEN => "Not Allowed",
            _ => "Something Went Wrong",
        };
        let body = format!(
            r#"<section class="card error-card">
    <h1>{status} · {title}</h1>
    <p>{message}</p>
    <p><a href="/">Back to the dashboard</a></p>
</section>"#,
            status = status.as_u16(),
            title = title,
            message = escape(&err.message()),
        );

        (status, Html(crate::api::ui::layout::bare_page(title, &body))).into_response()
    }
}

/// Result type for HTML page handlers
pub type PageResult<T> = Result<T, PageError>;
