//! CSV exports of licenses and cost entries for the selected account

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::NaiveDate;
use tracing::info;

use super::account::{resolve_scope, AccountQuery, Scope};
use crate::error::ApiResult;
use crate::session::CurrentSession;
use crate::AppState;

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// ISO dates so spreadsheets sort them; blank when absent
fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn csv_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn csv_response(filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

const LICENSE_COLUMNS: [&str; 16] = [
    "holder",
    "user_id",
    "license_id",
    "jurisdiction",
    "jurisdiction_abbr",
    "license_type",
    "license_number",
    "status",
    "status_class",
    "issued_on",
    "expires_on",
    "days_remaining",
    "board_name",
    "estimated_total",
    "actual_spent",
    "variance",
];

pub fn licenses_csv_body(scope: &Scope, ctx: &lrm_common::status::StatusContext) -> String {
    let mut out = csv_row(LICENSE_COLUMNS);
    for holder in scope.holders() {
        for license in &holder.licenses {
            let view = ctx.view(license);
            let totals = &view.cost_totals;
            out.push_str(&csv_row([
                holder.name.clone(),
                holder.user_id.clone(),
                license.license_id.clone(),
                license.jurisdiction.clone(),
                license.jurisdiction_abbr.clone(),
                license.license_type.clone(),
                license.license_number.clone().unwrap_or_default(),
                license.status.as_str().to_string(),
                view.status_class.as_str().to_string(),
                iso_date(license.issued_on),
                iso_date(license.expires_on),
                view.days_remaining.map(|d| d.to_string()).unwrap_or_default(),
                license.board_name.clone().unwrap_or_default(),
                totals.initial_estimated.to_decimal_string(),
                totals.actual_spent.to_decimal_string(),
                totals.variance.to_decimal_string(),
            ]));
        }
    }
    out
}

const COST_COLUMNS: [&str; 10] = [
    "holder",
    "user_id",
    "license_id",
    "jurisdiction_abbr",
    "date",
    "category",
    "amount",
    "vendor",
    "notes",
    "recurring",
];

pub fn costs_csv_body(scope: &Scope) -> String {
    let mut out = csv_row(COST_COLUMNS);
    for holder in scope.holders() {
        for license in &holder.licenses {
            for cost in license.costs_by_date() {
                out.push_str(&csv_row([
                    holder.name.clone(),
                    holder.user_id.clone(),
                    license.license_id.clone(),
                    license.jurisdiction_abbr.clone(),
                    iso_date(cost.date),
                    cost.category.as_str().to_string(),
                    cost.amount.to_decimal_string(),
                    cost.vendor.clone().unwrap_or_default(),
                    cost.notes.clone().unwrap_or_default(),
                    cost.recurring.to_string(),
                ]));
            }
        }
    }
    out
}

/// GET /export/licenses.csv
pub async fn licenses_csv(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Response> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let body = licenses_csv_body(&scope, &state.status_context());
    info!("Exported licenses for {}", scope.account());
    Ok(csv_response(format!("licenses-{}.csv", scope.account()), body))
}

/// GET /export/costs.csv
pub async fn costs_csv(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Response> {
    let scope = resolve_scope(&state, &session, &query).await?;
    let body = costs_csv_body(&scope);
    info!("Exported costs for {}", scope.account());
    Ok(csv_response(format!("costs-{}.csv", scope.account()), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Smith, Jane"), "\"Smith, Jane\"");
        assert_eq!(csv_field("the \"big\" one"), "\"the \"\"big\"\" one\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_row_terminates_with_crlf() {
        assert_eq!(csv_row(["a", "b,c"]), "a,\"b,c\"\r\n");
    }
}
