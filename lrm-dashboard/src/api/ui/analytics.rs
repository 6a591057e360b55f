//! Cost analytics page

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use lrm_common::costs::{annual_recurring, category_breakdown, CostSummary};
use lrm_common::money::Money;

use super::layout::{escape, money_cell, Nav};
use super::render;
use crate::api::account::{resolve_scope, AccountQuery};
use crate::error::PageResult;
use crate::session::CurrentSession;
use crate::AppState;

/// GET /cost-analytics
pub async fn cost_analytics_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let ctx = state.status_context();
    let views = scope.license_views(&ctx);
    let licenses = || views.iter().map(|v| &v.license);

    let totals = CostSummary::over(licenses());
    let categories = category_breakdown(licenses());
    let largest = categories
        .first()
        .map(|c| c.amount)
        .filter(|a| *a > Money::ZERO);

    let category_rows: String = categories
        .iter()
        .map(|c| {
            // Bar width relative to the largest category
            let width = match largest {
                Some(max) => (c.amount.cents() as f64 / max.cents() as f64 * 100.0).round(),
                None => 0.0,
            };
            format!(
                r#"<tr><td>{label}</td><td class="num">{amount}</td><td style="width:40%"><div class="bar" style="width:{width}%"></div></td></tr>"#,
                label = c.label,
                amount = c.amount,
                width = width,
            )
        })
        .collect();
    let categories_html = if category_rows.is_empty() {
        r#"<p class="muted">No costs recorded yet.</p>"#.to_string()
    } else {
        format!(
            r#"<table><thead><tr><th>Category</th><th class="num">Spent</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            category_rows
        )
    };

    let director = scope.is_director();
    let license_rows: String = views
        .iter()
        .map(|view| {
            let t = &view.cost_totals;
            let holder = if director {
                format!("<td>{}</td>", escape(view.holder_name.as_deref().unwrap_or("")))
            } else {
                String::new()
            };
            format!(
                r#"<tr>{holder}<td>{jurisdiction}</td><td>{license_type}</td><td class="num">{estimated}</td><td class="num">{spent}</td><td class="num">{variance}</td><td class="num">{recurring}</td><td class="num">{annual}</td></tr>"#,
                holder = holder,
                jurisdiction = escape(&view.license.jurisdiction),
                license_type = escape(&view.license.license_type),
                estimated = t.initial_estimated,
                spent = t.actual_spent,
                variance = money_cell(t.variance),
                recurring = t.recurring_cost,
                annual = annual_recurring(&view.license),
            )
        })
        .collect();

    let holder_head = if director { "<th>Holder</th>" } else { "" };
    let body = format!(
        r#"<section class="grid">
    <div class="stat"><div class="value">{estimated}</div><div class="label">Estimated</div></div>
    <div class="stat"><div class="value">{actual}</div><div class="label">Spent</div></div>
    <div class="stat"><div class="value">{variance}</div><div class="label">Variance</div></div>
    <div class="stat"><div class="value">{recurring}</div><div class="label">Recurring / Year</div></div>
</section>
<section class="card">
    <h2>Spending by Category</h2>
    {categories}
</section>
<section class="card">
    <h2>By License</h2>
    <table>
        <thead><tr>{holder_head}<th>Jurisdiction</th><th>Type</th><th class="num">Estimated</th><th class="num">Spent</th><th class="num">Variance</th><th class="num">Per Renewal</th><th class="num">Per Year</th></tr></thead>
        <tbody>{license_rows}</tbody>
    </table>
</section>"#,
        estimated = totals.total_estimated,
        actual = totals.total_actual,
        variance = money_cell(totals.total_variance),
        recurring = totals.total_recurring,
        categories = categories_html,
        holder_head = holder_head,
        license_rows = license_rows,
    );
    Ok(render(&state, &session, &scope, "Cost Analytics", Nav::Costs, &body))
}
