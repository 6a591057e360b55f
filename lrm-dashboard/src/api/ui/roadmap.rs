//! Licensing roadmap map, state detail and catalog freshness pages

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Extension,
};
use lrm_common::content::CatalogView;
use lrm_common::jurisdictions::{self, US_STATES};
use lrm_common::rollup::{director_roadmap, holder_roadmap, RoadmapStates};
use serde_json::json;

use super::home::stats_grid;
use super::layout::{account_link, badge, days_text, escape, long_date, script_json, text_or_dash, Nav};
use super::render;
use crate::api::account::{resolve_scope, AccountQuery, Scope};
use crate::error::{ApiError, PageResult};
use crate::session::CurrentSession;
use crate::AppState;

/// GET /licensing-roadmap
pub async fn roadmap_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let ctx = state.status_context();
    let roadmap = match &scope {
        Scope::Director(holders) => director_roadmap(&ctx, holders),
        Scope::Holder(holder) => holder_roadmap(&ctx, holder),
    };

    let training = state
        .content
        .training_roadmap(&state.config.dashboard.training_roadmap_id)
        .await?
        .unwrap_or_else(|| json!({}));
    let states_json = serde_json::to_value(&roadmap.states)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let body = format!(
        r#"{stats}
<section class="card">
    <h2>Coverage Map</h2>
    <div class="legend">
        <span class="badge badge-licensed">Licensed</span>
        <span class="badge badge-in_progress">In Progress</span>
        <span class="badge badge-due-soon">Renewal Due Soon</span>
        <span class="badge badge-overdue">Overdue</span>
        <span class="badge badge-not_licensed">Not Licensed</span>
    </div>
    <div id="state-map" class="state-map">{tiles}</div>
</section>
{table}
<script type="application/json" id="states-data">{states_json}</script>
<script type="application/json" id="training-roadmap">{training_json}</script>"#,
        stats = stats_grid(&roadmap.stats),
        tiles = map_tiles(),
        table = state_table(&roadmap),
        states_json = script_json(&states_json),
        training_json = script_json(&training),
    );
    Ok(render(&state, &session, &scope, "Licensing Roadmap", Nav::Roadmap, &body))
}

fn map_tiles() -> String {
    US_STATES
        .iter()
        .map(|(code, name)| {
            format!(
                r#"<a class="state-tile" data-state="{code}" href="/licensing/{code}" title="{name}">{code}<small>{name}</small></a>"#,
                code = code,
                name = escape(name),
            )
        })
        .collect()
}

fn state_table(roadmap: &RoadmapStates) -> String {
    if roadmap.states.is_empty() {
        return r#"<section class="card"><p class="muted">No licenses recorded yet.</p></section>"#
            .to_string();
    }
    let rows: String = roadmap
        .states
        .values()
        .map(|entry| {
            format!(
                r#"<tr><td><a href="/licensing/{abbr}">{name}</a></td><td>{license_type}</td><td>{badge}</td><td>{expires}</td><td>{days}</td><td>{holders}</td></tr>"#,
                abbr = escape(&entry.state_abbr),
                name = escape(&entry.name),
                license_type = escape(&entry.license_type),
                badge = badge(entry.status_class),
                expires = long_date(entry.expires_on),
                days = days_text(entry.days_remaining),
                holders = escape(&entry.holders.join(", ")),
            )
        })
        .collect();
    format!(
        r#"<section class="card">
    <h2>States</h2>
    <table>
        <thead><tr><th>State</th><th>License</th><th>Status</th><th>Expires</th><th>Remaining</th><th>Holders</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</section>"#,
        rows
    )
}

/// GET /licensing/:state
pub async fn state_detail_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(abbr): Path<String>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let abbr = jurisdictions::normalize_code(&abbr);
    let catalog_state = state
        .content
        .catalog_state(&abbr)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No licensing content for {}", abbr)))?;
    let scope = resolve_scope(&state, &session, &query).await?;

    let ctx = state.status_context();
    let view = CatalogView::new(&ctx, catalog_state);
    let name = view
        .state
        .name
        .clone()
        .unwrap_or_else(|| jurisdictions::display_name(&abbr));
    let detail = state
        .content
        .state_detail_html(&abbr)
        .await?
        .unwrap_or_else(|| r#"<p class="muted">No detailed notes for this state yet.</p>"#.to_string());

    let holder_rows: String = scope
        .holders()
        .iter()
        .filter_map(|holder| holder.license_for_state(&abbr).map(|l| (holder, l)))
        .map(|(holder, license)| {
            let view = ctx.view(license);
            format!(
                r#"<tr><td>{name}</td><td>{license_type}</td><td>{number}</td><td>{badge}</td><td>{expires}</td><td><a href="{edit}">Edit</a></td></tr>"#,
                name = escape(&holder.name),
                license_type = escape(&license.license_type),
                number = text_or_dash(license.license_number.as_deref()),
                badge = badge(view.status_class),
                expires = long_date(license.expires_on),
                edit = escape(&account_link(
                    &format!("/settings/edit-license/{}", license.license_id),
                    &holder.user_id
                )),
            )
        })
        .collect();
    let holders = if holder_rows.is_empty() {
        r#"<p class="muted">No licenses on record for this state.</p>"#.to_string()
    } else {
        format!(
            r#"<table><thead><tr><th>Holder</th><th>License</th><th>Number</th><th>Status</th><th>Expires</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            holder_rows
        )
    };

    let draft = if view.state.coverage_level.as_deref() == Some("draft") {
        r#"<p class="alert alert-warning">Draft content. Verify requirements with the state board.</p>"#
    } else {
        ""
    };

    let body = format!(
        r#"<section class="card">
    <h1>{name} <span class="muted">({abbr})</span> {badge}</h1>
    {draft}
    <p>Expires: {expires} · {days}</p>
    <p class="muted">Last reviewed: {reviewed}</p>
</section>
<section class="card">
    <h2>Our Licenses</h2>
    {holders}
</section>
<section class="card markdown">
{detail}
</section>"#,
        name = escape(&name),
        abbr = escape(&abbr),
        badge = badge(view.status_class),
        draft = draft,
        expires = long_date(view.state.expires_on),
        days = days_text(view.days_remaining),
        reviewed = text_or_dash(view.state.last_reviewed.as_deref()),
        holders = holders,
        detail = detail,
    );
    Ok(render(&state, &session, &scope, &name, Nav::Roadmap, &body))
}

/// GET /admin/licensing/states
pub async fn admin_states_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let rows: String = state
        .content
        .admin_freshness()
        .await?
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td><a href="/licensing/{abbr}">{abbr}</a></td><td>{name}</td><td>{status}</td><td>{coverage}</td><td>{reviewed}</td></tr>"#,
                abbr = escape(&row.abbr),
                name = escape(&row.name),
                status = row.status.label(),
                coverage = escape(&row.coverage_level),
                reviewed = text_or_dash(row.last_reviewed.as_deref()),
            )
        })
        .collect();

    let body = format!(
        r#"<section class="card">
    <h1>State Content Freshness</h1>
    <p class="muted">Least recently reviewed first.</p>
    <table>
        <thead><tr><th>Code</th><th>State</th><th>Status</th><th>Coverage</th><th>Last Reviewed</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</section>"#,
        rows
    );
    Ok(render(&state, &session, &scope, "State Content", Nav::Settings, &body))
}
