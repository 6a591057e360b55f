//! Settings page: account switcher and configuration summary

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use lrm_common::models::DIRECTOR_ACCOUNT;

use super::layout::{account_link, escape, Nav};
use super::render;
use crate::api::account::{resolve_scope, AccountQuery};
use crate::error::PageResult;
use crate::session::CurrentSession;
use crate::AppState;

/// GET /settings
pub async fn settings_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let config = &state.config;

    // A holder signed in with a PIN only ever sees their own account
    let pinned = config.auth.require_pin
        && session.0.as_ref().map_or(false, |s| !s.is_director());
    let accounts = if pinned {
        String::new()
    } else {
        let mut links = vec![format!(
            r#"<li><a href="{}">Director View</a> <span class="muted">(all holders)</span></li>"#,
            escape(&account_link("/", DIRECTOR_ACCOUNT))
        )];
        for holder in state.store.list_holders().await? {
            links.push(format!(
                r#"<li><a href="{}">{}</a> <span class="muted">{}</span></li>"#,
                escape(&account_link("/", &holder.user_id)),
                escape(&holder.name),
                escape(holder.role.as_deref().unwrap_or("")),
            ));
        }
        format!(
            r#"<section class="card"><h2>Accounts</h2><ul>{}</ul></section>"#,
            links.join("")
        )
    };

    let account = scope.account();
    let body = format!(
        r#"<section class="card">
    <h1>Settings</h1>
    <ul>
        <li><a href="{manage}">Manage licenses</a></li>
        <li><a href="{add}">Add a license</a></li>
        <li><a href="{admin}">State content freshness</a></li>
        <li><a href="{licenses_csv}">Export licenses (CSV)</a></li>
        <li><a href="{costs_csv}">Export costs (CSV)</a></li>
    </ul>
</section>
{accounts}
<section class="card">
    <h2>Configuration</h2>
    <table>
        <tr><th>Storage</th><td>{storage}</td></tr>
        <tr><th>Due-soon window</th><td>{due_soon} days</td></tr>
        <tr><th>Urgent window</th><td>{urgent} days</td></tr>
        <tr><th>Default account</th><td>{default_account}</td></tr>
        <tr><th>PIN required</th><td>{require_pin}</td></tr>
        <tr><th>High-priority states</th><td>{priority}</td></tr>
    </table>
</section>"#,
        manage = escape(&account_link("/manage-licenses", account)),
        add = escape(&account_link("/settings/add-license", account)),
        admin = escape(&account_link("/admin/licensing/states", account)),
        licenses_csv = escape(&account_link("/export/licenses.csv", account)),
        costs_csv = escape(&account_link("/export/costs.csv", account)),
        accounts = accounts,
        storage = state.store.backend(),
        due_soon = config.dashboard.due_soon_days,
        urgent = config.dashboard.urgent_window_days,
        default_account = escape(&config.dashboard.default_account),
        require_pin = if config.auth.require_pin { "Yes" } else { "No" },
        priority = escape(&config.dashboard.high_priority_states.join(", ")),
    );
    Ok(render(&state, &session, &scope, "Settings", Nav::Settings, &body))
}
