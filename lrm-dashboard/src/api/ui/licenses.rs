//! License management pages: list, edit, add, cost details

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Extension,
};
use lrm_common::costs::LicenseTotals;
use lrm_common::jurisdictions::US_STATES;
use lrm_common::models::{CostCategory, License, LicenseHolder, LicenseStatus};

use super::layout::{
    account_link, badge, days_text, escape, input_date, long_date, money_cell, text_or_dash, Nav,
};
use super::render;
use crate::api::account::{resolve_scope, AccountQuery, Scope};
use crate::error::{ApiError, PageResult};
use crate::session::CurrentSession;
use crate::AppState;

/// Locate a license and its owner within the scope
fn find_license<'a>(scope: &'a Scope, license_id: &str) -> PageResult<(&'a LicenseHolder, &'a License)> {
    scope
        .holders()
        .iter()
        .find_map(|h| h.license(license_id).map(|l| (h, l)))
        .ok_or_else(|| lrm_common::Error::license_not_found(license_id).into())
}

fn value(text: Option<&str>) -> String {
    escape(text.unwrap_or(""))
}

fn status_options(selected: LicenseStatus) -> String {
    LicenseStatus::ALL
        .iter()
        .map(|status| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                status.as_str(),
                if *status == selected { " selected" } else { "" },
                status.label()
            )
        })
        .collect()
}

/// GET /manage-licenses
pub async fn manage_licenses_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let ctx = state.status_context();
    let director = scope.is_director();

    let rows: String = scope
        .license_views(&ctx)
        .iter()
        .map(|view| {
            let license = &view.license;
            let owner = view.holder_account.as_deref().unwrap_or(scope.account());
            let holder = if director {
                format!("<td>{}</td>", escape(view.holder_name.as_deref().unwrap_or("")))
            } else {
                String::new()
            };
            format!(
                r#"<tr>{holder}<td>{jurisdiction}</td><td>{license_type}</td><td>{number}</td><td>{badge}</td><td>{expires}</td><td class="num">{spent}</td>
    <td>
        <a href="{edit}">Edit</a> · <a href="{costs}">Costs</a> ·
        <button type="button" class="btn btn-danger btn-small" data-delete-license="{id}" data-account="{owner}">Delete</button>
    </td></tr>"#,
                holder = holder,
                jurisdiction = escape(&license.jurisdiction),
                license_type = escape(&license.license_type),
                number = text_or_dash(license.license_number.as_deref()),
                badge = badge(view.status_class),
                expires = long_date(license.expires_on),
                spent = view.cost_totals.actual_spent,
                edit = escape(&account_link(&format!("/settings/edit-license/{}", license.license_id), owner)),
                costs = escape(&account_link(&format!("/settings/cost-details/{}", license.license_id), owner)),
                id = escape(&license.license_id),
                owner = escape(owner),
            )
        })
        .collect();

    let holder_head = if director { "<th>Holder</th>" } else { "" };
    let body = format!(
        r#"<section class="card">
    <div class="toolbar">
        <h1>Manage Licenses</h1>
        <div>
            <input type="search" placeholder="Filter licenses" data-filter-table="manage-licenses">
            <a class="btn btn-primary" href="{add}">Add License</a>
        </div>
    </div>
    <table id="manage-licenses">
        <thead><tr>{holder_head}<th>Jurisdiction</th><th>Type</th><th>Number</th><th>Status</th><th>Expires</th><th class="num">Spent</th><th></th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
</section>"#,
        add = escape(&account_link("/settings/add-license", scope.account())),
        holder_head = holder_head,
        rows = rows,
    );
    Ok(render(&state, &session, &scope, "Manage Licenses", Nav::Licenses, &body))
}

/// GET /settings/edit-license/:id
pub async fn edit_license_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(license_id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let (holder, license) = find_license(&scope, &license_id)?;
    let view = state.status_context().view(license);

    let body = format!(
        r#"<section class="card">
    <h1>Edit {jurisdiction} License {badge}</h1>
    <p class="muted">{holder} · {days}</p>
    <form class="stacked" method="post" action="/settings/update-license/{id}">
        <input type="hidden" name="account" value="{account}">
        <div class="form-row">
            <div><label for="license_type">License Type</label><input id="license_type" name="license_type" value="{license_type}" required></div>
            <div><label for="license_number">License Number</label><input id="license_number" name="license_number" value="{license_number}"></div>
            <div><label for="status">Status</label><select id="status" name="status">{status_options}</select></div>
        </div>
        <div class="form-row">
            <div><label for="issued_on">Issued</label><input id="issued_on" name="issued_on" type="date" value="{issued_on}"></div>
            <div><label for="expires_on">Expires</label><input id="expires_on" name="expires_on" type="date" value="{expires_on}"></div>
            <div><label for="application_date">Application Date</label><input id="application_date" name="application_date" type="date" value="{application_date}"></div>
        </div>
        <h2>Licensing Board</h2>
        <div class="form-row">
            <div><label for="board_name">Board</label><input id="board_name" name="board_name" value="{board_name}"></div>
            <div><label for="board_phone">Phone</label><input id="board_phone" name="board_phone" value="{board_phone}"></div>
            <div><label for="board_email">Email</label><input id="board_email" name="board_email" type="email" value="{board_email}"></div>
        </div>
        <div class="form-row">
            <div><label for="board_url">Website</label><input id="board_url" name="board_url" value="{board_url}"></div>
            <div><label for="board_address">Address</label><input id="board_address" name="board_address" value="{board_address}"></div>
            <div><label for="designated_role">Designated Role</label><input id="designated_role" name="designated_role" value="{designated_role}"></div>
        </div>
        <h2>Renewal</h2>
        <div class="form-row">
            <div><label for="renewal_period_years">Renewal Period (years)</label><input id="renewal_period_years" name="renewal_period_years" type="number" min="1" value="{period}"></div>
            <div><label for="renewal_fee">Renewal Fee</label><input id="renewal_fee" name="renewal_fee" value="{renewal_fee}"></div>
            <div><label for="continuing_ed_fee">Continuing Ed Fee</label><input id="continuing_ed_fee" name="continuing_ed_fee" value="{ce_fee}"></div>
            <div><label for="continuing_ed_hours">Continuing Ed Hours</label><input id="continuing_ed_hours" name="continuing_ed_hours" type="number" min="0" value="{ce_hours}"></div>
        </div>
        <label for="notes">Notes</label>
        <textarea id="notes" name="notes" rows="4">{notes}</textarea>
        <button type="submit" class="btn btn-primary">Save</button>
        <a class="btn btn-secondary" href="{back}">Cancel</a>
    </form>
</section>"#,
        jurisdiction = escape(&license.jurisdiction),
        badge = badge(view.status_class),
        holder = escape(&holder.name),
        days = days_text(view.days_remaining),
        id = escape(&license.license_id),
        account = escape(&holder.user_id),
        license_type = escape(&license.license_type),
        license_number = value(license.license_number.as_deref()),
        status_options = status_options(license.status),
        issued_on = input_date(license.issued_on),
        expires_on = input_date(license.expires_on),
        application_date = input_date(license.application_date),
        board_name = value(license.board_name.as_deref()),
        board_phone = value(license.board_phone.as_deref()),
        board_email = value(license.board_email.as_deref()),
        board_url = value(license.board_url.as_deref()),
        board_address = value(license.board_address.as_deref()),
        designated_role = value(license.designated_role.as_deref()),
        period = license.recurring.renewal_period_years,
        renewal_fee = license.recurring.renewal_fee.to_decimal_string(),
        ce_fee = license.recurring.continuing_ed_fee.to_decimal_string(),
        ce_hours = license.continuing_ed_hours.map(|h| h.to_string()).unwrap_or_default(),
        notes = value(license.notes.as_deref()),
        back = escape(&account_link("/manage-licenses", &holder.user_id)),
    );
    Ok(render(&state, &session, &scope, "Edit License", Nav::Licenses, &body))
}

/// GET /settings/add-license
pub async fn add_license_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;

    let holder_field = match &scope {
        Scope::Director(holders) if holders.is_empty() => {
            return Err(ApiError::BadRequest("No license holders on file".to_string()).into());
        }
        Scope::Director(holders) => {
            let options: String = holders
                .iter()
                .map(|h| {
                    format!(
                        r#"<option value="{}">{}</option>"#,
                        escape(&h.user_id),
                        escape(&h.name)
                    )
                })
                .collect();
            format!(
                r#"<label for="account">License Holder</label><select id="account" name="account">{}</select>"#,
                options
            )
        }
        Scope::Holder(holder) => format!(
            r#"<input type="hidden" name="account" value="{}">"#,
            escape(&holder.user_id)
        ),
    };

    // States the holder already has are left out
    let taken = |code: &str| match &scope {
        Scope::Holder(holder) => holder.license_for_state(code).is_some(),
        Scope::Director(_) => false,
    };
    let state_options: String = US_STATES
        .iter()
        .filter(|(code, _)| !taken(code))
        .map(|(code, name)| format!(r#"<option value="{}">{} ({})</option>"#, code, escape(name), code))
        .collect();

    let body = format!(
        r#"<section class="card">
    <h1>Add License</h1>
    <form class="stacked" method="post" action="/settings/add-license">
        {holder_field}
        <div class="form-row">
            <div><label for="jurisdiction_abbr">State</label><select id="jurisdiction_abbr" name="jurisdiction_abbr" required>{state_options}</select></div>
            <div><label for="license_type">License Type</label><input id="license_type" name="license_type" required></div>
            <div><label for="license_number">License Number</label><input id="license_number" name="license_number"></div>
            <div><label for="status">Status</label><select id="status" name="status">{status_options}</select></div>
        </div>
        <div class="form-row">
            <div><label for="issued_on">Issued</label><input id="issued_on" name="issued_on" type="date"></div>
            <div><label for="expires_on">Expires</label><input id="expires_on" name="expires_on" type="date"></div>
        </div>
        <div class="form-row">
            <div><label for="board_name">Board</label><input id="board_name" name="board_name"></div>
            <div><label for="board_phone">Board Phone</label><input id="board_phone" name="board_phone"></div>
            <div><label for="board_url">Board Website</label><input id="board_url" name="board_url"></div>
        </div>
        <div class="form-row">
            <div><label for="renewal_period_years">Renewal Period (years)</label><input id="renewal_period_years" name="renewal_period_years" type="number" min="1" value="2"></div>
            <div><label for="renewal_fee">Renewal Fee</label><input id="renewal_fee" name="renewal_fee"></div>
            <div><label for="continuing_ed_fee">Continuing Ed Fee</label><input id="continuing_ed_fee" name="continuing_ed_fee"></div>
        </div>
        <label for="notes">Notes</label>
        <textarea id="notes" name="notes" rows="3"></textarea>
        <button type="submit" class="btn btn-primary">Add License</button>
    </form>
</section>"#,
        holder_field = holder_field,
        state_options = state_options,
        status_options = status_options(LicenseStatus::InProgress),
    );
    Ok(render(&state, &session, &scope, "Add License", Nav::Licenses, &body))
}

/// GET /settings/cost-details/:id
pub async fn cost_details_page(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(license_id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> PageResult<Html<String>> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let (holder, license) = find_license(&scope, &license_id)?;
    let totals = LicenseTotals::for_license(license);
    let account = escape(&holder.user_id);
    let id = escape(&license.license_id);

    let cost_rows: String = license
        .costs_by_date()
        .iter()
        .enumerate()
        .map(|(index, cost)| {
            format!(
                r#"<tr><td>{date}</td><td>{category}</td><td>{vendor}</td><td>{notes}</td><td class="num">{amount}</td><td>
    <form class="inline-form" method="post" action="/settings/delete-cost/{id}/{index}" data-confirm="Delete this cost entry?">
        <input type="hidden" name="account" value="{account}">
        <button type="submit" class="btn btn-danger btn-small">Delete</button>
    </form></td></tr>"#,
                date = long_date(cost.date),
                category = cost.category.label(),
                vendor = text_or_dash(cost.vendor.as_deref()),
                notes = text_or_dash(cost.notes.as_deref()),
                amount = cost.amount,
                id = id,
                index = index,
                account = account,
            )
        })
        .collect();
    let cost_table = if cost_rows.is_empty() {
        r#"<p class="muted">No costs recorded yet.</p>"#.to_string()
    } else {
        format!(
            r#"<table><thead><tr><th>Date</th><th>Category</th><th>Vendor</th><th>Notes</th><th class="num">Amount</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            cost_rows
        )
    };

    let category_options: String = CostCategory::ALL
        .iter()
        .map(|c| format!(r#"<option value="{}">{}</option>"#, c.as_str(), c.label()))
        .collect();

    let estimate_fields: String = license
        .estimated_costs
        .lines()
        .iter()
        .map(|(name, label, amount)| {
            format!(
                r#"<div><label for="{name}">{label}</label><input id="{name}" name="{name}" value="{value}"></div>"#,
                name = name,
                label = escape(label),
                value = amount.to_decimal_string(),
            )
        })
        .collect();
    let planning = license.planning.clone().unwrap_or_default();

    let body = format!(
        r#"<section class="card">
    <h1>{jurisdiction} Costs</h1>
    <p class="muted">{holder} · {license_type}</p>
    <div class="grid">
        <div class="stat"><div class="value">{estimated}</div><div class="label">Estimated</div></div>
        <div class="stat"><div class="value">{spent}</div><div class="label">Spent</div></div>
        <div class="stat"><div class="value">{variance}</div><div class="label">Variance</div></div>
        <div class="stat"><div class="value">{recurring}</div><div class="label">Per Renewal</div></div>
    </div>
</section>
<section class="card">
    <h2>Actual Costs</h2>
    {cost_table}
    <form class="stacked" method="post" action="/settings/add-cost/{id}">
        <input type="hidden" name="account" value="{account}">
        <div class="form-row">
            <div><label for="date">Date</label><input id="date" name="date" type="date"></div>
            <div><label for="category">Category</label><select id="category" name="category">{category_options}</select></div>
            <div><label for="amount">Amount</label><input id="amount" name="amount" required></div>
        </div>
        <div class="form-row">
            <div><label for="vendor">Vendor</label><input id="vendor" name="vendor"></div>
            <div><label for="cost_notes">Notes</label><input id="cost_notes" name="notes"></div>
        </div>
        <button type="submit" class="btn btn-primary">Add Cost</button>
    </form>
</section>
<section class="card">
    <h2>Estimated Costs</h2>
    <form class="stacked" method="post" action="/settings/update-estimated-costs/{id}">
        <input type="hidden" name="account" value="{account}">
        <div class="form-row">{estimate_fields}</div>
        <h2>Planning</h2>
        <div class="form-row">
            <div><label for="est_study_hours">Study Hours</label><input id="est_study_hours" name="est_study_hours" type="number" min="0" value="{study_hours}"></div>
            <div><label for="test_duration_hours">Test Duration (hours)</label><input id="test_duration_hours" name="test_duration_hours" type="number" min="0" step="0.5" value="{test_hours}"></div>
        </div>
        <button type="submit" class="btn btn-primary">Save Estimates</button>
        <a class="btn btn-secondary" href="{back}">Back</a>
    </form>
</section>"#,
        jurisdiction = escape(&license.jurisdiction),
        holder = escape(&holder.name),
        license_type = escape(&license.license_type),
        estimated = totals.initial_estimated,
        spent = totals.actual_spent,
        variance = money_cell(totals.variance),
        recurring = totals.recurring_cost,
        cost_table = cost_table,
        id = id,
        account = account,
        category_options = category_options,
        estimate_fields = estimate_fields,
        study_hours = planning.est_study_hours,
        test_hours = planning.test_duration_hours,
        back = escape(&account_link("/manage-licenses", &holder.user_id)),
    );
    Ok(render(&state, &session, &scope, "Cost Details", Nav::Licenses, &body))
}
