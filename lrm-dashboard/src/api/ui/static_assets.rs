//! Static asset handlers
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const DASHBOARD_CSS: &str = include_str!("../../../static/dashboard.css");
const DASHBOARD_JS: &str = include_str!("../../../static/dashboard.js");

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", content_type),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
        .into_response()
}

/// GET /static/dashboard.css
pub async fn serve_dashboard_css() -> Response {
    asset("text/css", DASHBOARD_CSS)
}

/// GET /static/dashboard.js
pub async fn serve_dashboard_js() -> Response {
    asset("application/javascript", DASHBOARD_JS)
}
