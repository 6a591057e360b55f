//! HTML pages
//!
//! - **Static Assets** (`static_assets`): CSS/JS serving
//! - **Home** (`home`): status overview and urgent items
//! - **Roadmap** (`roadmap`): state map, state detail, catalog freshness
//! - **Licenses** (`licenses`): license management, edit/add forms, cost details
//! - **Analytics** (`analytics`): cost roll-ups
//! - **Settings** (`settings`): account switcher and configuration summary

use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::api::account::Scope;
use crate::session::CurrentSession;
use crate::AppState;

pub mod layout;

mod analytics;
mod home;
mod licenses;
mod roadmap;
mod settings;
mod static_assets;

pub use analytics::cost_analytics_page;
pub use home::home_page;
pub use licenses::{add_license_page, cost_details_page, edit_license_page, manage_licenses_page};
pub use roadmap::{admin_states_page, roadmap_page, state_detail_page};
pub use settings::settings_page;
pub use static_assets::{serve_dashboard_css, serve_dashboard_js};

use layout::{bare_page, escape, Chrome, Nav};

/// Page shell for a scope
pub(crate) fn render(
    state: &AppState,
    session: &CurrentSession,
    scope: &Scope,
    title: &str,
    nav: Nav,
    body: &str,
) -> Html<String> {
    let summary = scope.summary();
    let chrome = Chrome {
        title,
        nav,
        company_name: &state.config.dashboard.company_name,
        account: scope.account(),
        summary: Some(&summary),
        session,
    };
    layout::page(&chrome, body)
}

/// Fallback for unknown routes
pub async fn not_found_page(uri: Uri) -> Response {
    let body = format!(
        r#"<section class="card error-card">
    <h1>404 · Page Not Found</h1>
    <p>Nothing lives at <code>{}</code>.</p>
    <p><a href="/">Back to the dashboard</a></p>
</section>"#,
        escape(uri.path())
    );
    (StatusCode::NOT_FOUND, Html(bare_page("Page Not Found", &body))).into_response()
}
