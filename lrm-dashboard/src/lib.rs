//! lrm-dashboard library - licensing compliance dashboard
//!
//! Server-rendered pages, JSON endpoints and CSV exports over a
//! [`LicenseStore`], with optional PIN sessions.

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use lrm_common::config::TomlConfig;
use lrm_common::content::ContentLibrary;
use lrm_common::status::StatusContext;
use lrm_common::store::LicenseStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod session;

use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LicenseStore>,
    pub content: Arc<ContentLibrary>,
    pub config: Arc<TomlConfig>,
    pub sessions: SessionStore,
    /// Server start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
    /// Fixed "today" for status derivation (tests and demos)
    today_override: Option<NaiveDate>,
}

impl AppState {
    pub fn new(store: Arc<dyn LicenseStore>, content: ContentLibrary, config: TomlConfig) -> Self {
        let sessions = SessionStore::new(chrono::Duration::hours(config.auth.session_ttl_hours));
        Self {
            store,
            content: Arc::new(content),
            config: Arc::new(config),
            sessions,
            startup_time: Utc::now(),
            today_override: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today_override.unwrap_or_else(lrm_common::time::today)
    }

    pub fn status_context(&self) -> StatusContext {
        StatusContext::new(self.today(), self.config.dashboard.due_soon_days)
    }
}

/// Build application router
///
/// Health, login, build info and static assets are public; everything else
/// passes through the session middleware.
pub fn build_router(state: AppState) -> Router {
    use api::{auth, buildinfo, export, forms, json, ui};
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (session attached, PIN enforced when configured)
    let protected = Router::new()
        .route("/", get(ui::home_page))
        .route("/licensing-roadmap", get(ui::roadmap_page))
        .route("/licensing/:state", get(ui::state_detail_page))
        .route("/admin/licensing/states", get(ui::admin_states_page))
        .route("/settings", get(ui::settings_page))
        .route("/manage-licenses", get(ui::manage_licenses_page))
        .route("/settings/edit-license/:id", get(ui::edit_license_page))
        .route("/settings/update-license/:id", post(forms::update_license))
        .route(
            "/settings/add-license",
            get(ui::add_license_page).post(forms::add_license),
        )
        .route("/settings/cost-details/:id", get(ui::cost_details_page))
        .route("/settings/add-cost/:id", post(forms::add_cost))
        .route("/settings/delete-cost/:id/:index", post(forms::delete_cost))
        .route(
            "/settings/update-estimated-costs/:id",
            post(forms::update_estimated_costs),
        )
        .route("/cost-analytics", get(ui::cost_analytics_page))
        .route("/api/states", get(json::api_states))
        .route("/api/leadership-data", get(json::leadership_data))
        .route("/api/company-coverage", get(json::company_coverage))
        .route("/api/save-license", post(json::save_license))
        .route("/api/delete-license", post(json::delete_license))
        .route("/export/licenses.csv", get(export::licenses_csv))
        .route("/export/costs.csv", get(export::costs_csv))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ));

    // Public routes (no session required)
    let public = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/api/buildinfo", get(buildinfo::get_build_info))
        .route("/static/dashboard.css", get(ui::serve_dashboard_css))
        .route("/static/dashboard.js", get(ui::serve_dashboard_js))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .fallback(ui::not_found_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
