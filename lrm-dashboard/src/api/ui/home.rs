//! Home dashboard

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use lrm_common::rollup::{home_overview, HomeOverview, StatusCounts};
use lrm_common::costs::CostSummary;

use super::layout::{
    account_link, badge, days_text, escape, long_date, money_cell, Nav,
};
use super::render;
use crate::api::account::{resolve_scope, AccountQuery, Scope};
use crate::error::PageResult;
use crate::session::CurrentSession;
use crate::AppState;

/// GET /
pub async fn home_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let ctx = state.status_context();
    let overview = home_overview(
        scope.license_views(&ctx),
        state.config.dashboard.urgent_window_days,
    );

    let body = format!(
        "{}\n{}\n{}\n{}",
        stats_grid(&overview.stats),
        urgent_section(&scope, &overview),
        cost_grid(&overview.cost_summary),
        license_table(&scope, &overview),
    );
    Ok(render(&state, &session, &scope, "Dashboard", Nav::Home, &body))
}

pub(crate) fn stats_grid(stats: &StatusCounts) -> String {
    let tiles = [
        ("Licensed", stats.licensed),
        ("In Progress", stats.in_progress),
        ("Not Licensed", stats.not_licensed),
        ("Due Soon", stats.due_soon),
        ("Overdue", stats.overdue),
        ("Total", stats.total),
    ];
    let cells: String = tiles
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="stat"><div class="value">{}</div><div class="label">{}</div></div>"#,
                value, label
            )
        })
        .collect();
    format!(r#"<section class="grid">{}</section>"#, cells)
}

fn cost_grid(summary: &CostSummary) -> String {
    format!(
        r#"<section class="grid">
    <div class="stat"><div class="value">{}</div><div class="label">Estimated</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Spent</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Variance</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Recurring / Year</div></div>
</section>"#,
        summary.total_estimated,
        summary.total_actual,
        money_cell(summary.total_variance),
        summary.total_recurring,
    )
}

fn urgent_section(scope: &Scope, overview: &HomeOverview) -> String {
    if overview.urgent_items.is_empty() {
        return r#"<section class="card"><h2>Action Items</h2><p class="muted">Nothing needs attention.</p></section>"#.to_string();
    }

    let items: String = overview
        .urgent_items
        .iter()
        .map(|item| {
            let account = item.account.as_deref().unwrap_or(scope.account());
            let href = account_link(
                &format!("/settings/edit-license/{}", item.license_id),
                account,
            );
            format!(
                r#"<div class="alert alert-{urgency}"><strong>{jurisdiction}</strong>: {issue} · <a href="{href}">{action}</a></div>"#,
                urgency = item.urgency.as_str(),
                jurisdiction = escape(&item.jurisdiction),
                issue = escape(&item.issue),
                href = escape(&href),
                action = item.action,
            )
        })
        .collect();
    format!(r#"<section class="card"><h2>Action Items</h2>{}</section>"#, items)
}

fn license_table(scope: &Scope, overview: &HomeOverview) -> String {
    let director = scope.is_director();
    let rows: String = overview
        .licenses
        .iter()
        .map(|view| {
            let holder = if director {
                format!(
                    "<td>{}</td>",
                    escape(view.holder_name.as_deref().unwrap_or(""))
                )
            } else {
                String::new()
            };
            format!(
                r#"<tr>{holder}<td><a href="/licensing/{abbr}">{jurisdiction}</a></td><td>{license_type}</td><td>{badge}</td><td>{expires}</td><td>{days}</td></tr>"#,
                holder = holder,
                abbr = escape(&view.license.jurisdiction_abbr),
                jurisdiction = escape(&view.license.jurisdiction),
                license_type = escape(&view.license.license_type),
                badge = badge(view.status_class),
                expires = long_date(view.license.expires_on),
                days = days_text(view.days_remaining),
            )
        })
        .collect();

    let holder_head = if director { "<th>Holder</th>" } else { "" };
    format!(
        r#"<section class="card">
    <div class="toolbar">
        <h2>Licenses</h2>
        <input type="search" placeholder="Filter licenses" data-filter-table="home-licenses">
    </div>
    <table id="home-licenses">
        <thead><tr>{holder_head}<th>Jurisdiction</th><th>Type</th><th>Status</th><th>Expires</th><th>Remaining</th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
    <p class="muted"><a href="{licenses_csv}">Export licenses (CSV)</a> · <a href="{costs_csv}">Export costs (CSV)</a></p>
</section>"#,
        holder_head = holder_head,
        rows = rows,
        licenses_csv = escape(&account_link("/export/licenses.csv", scope.account())),
        costs_csv = escape(&account_link("/export/costs.csv", scope.account())),
    )
}
