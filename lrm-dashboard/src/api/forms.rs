//! Form posts from the license management pages
//!
//! Every handler redirects back to the page the form came from. Blank text
//! fields are stored as absent; blank money fields as zero.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Extension, Form,
};
use chrono::NaiveDate;
use lrm_common::ledger::{self, LicenseUpdate, NewCost, NewLicense};
use lrm_common::models::{CostCategory, EstimatedCosts, LicenseStatus, Planning};
use lrm_common::money::Money;
use lrm_common::time::parse_date;
use serde::Deserialize;

use super::account::{permitted_account, AccountQuery};
use super::ui::layout::account_link;
use crate::error::{ApiError, ApiResult, PageResult};
use crate::session::CurrentSession;
use crate::AppState;

fn blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn date_field(name: &str, value: &str) -> ApiResult<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(value)
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest(format!("{}: not a valid date", name)))
}

fn money_field(value: &str) -> ApiResult<Money> {
    Ok(Money::parse_field(value)?)
}

fn number_field<T: std::str::FromStr>(name: &str, value: &str) -> ApiResult<Option<T>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("{}: not a valid number", name)))
}

/// Account from the form, falling back to the query string
fn form_account(
    state: &AppState,
    session: &CurrentSession,
    form_value: &str,
    query: &AccountQuery,
) -> ApiResult<String> {
    let requested = blank(form_value);
    permitted_account(state, session, requested.as_deref().or(query.requested()))
}

fn manage_redirect(account: &str) -> Redirect {
    Redirect::to(&account_link("/manage-licenses", account))
}

fn cost_details_redirect(license_id: &str, account: &str) -> Redirect {
    Redirect::to(&account_link(
        &format!("/settings/cost-details/{}", license_id),
        account,
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LicenseForm {
    pub account: String,
    pub jurisdiction_abbr: String,
    pub license_type: String,
    pub license_number: String,
    pub status: String,
    pub issued_on: String,
    pub expires_on: String,
    pub application_date: String,
    pub board_name: String,
    pub board_phone: String,
    pub board_email: String,
    pub board_url: String,
    pub board_address: String,
    pub designated_role: String,
    pub notes: String,
    pub renewal_period_years: String,
    pub renewal_fee: String,
    pub continuing_ed_fee: String,
    pub continuing_ed_hours: String,
}

impl LicenseForm {
    fn renewal_period(&self) -> ApiResult<Option<u32>> {
        match number_field::<u32>("Renewal period", &self.renewal_period_years)? {
            Some(0) => Err(ApiError::BadRequest(
                "Renewal period must be at least one year".to_string(),
            )),
            other => Ok(other),
        }
    }

    fn into_update(self, current_period: u32) -> ApiResult<LicenseUpdate> {
        Ok(LicenseUpdate {
            renewal_period_years: self.renewal_period()?.unwrap_or(current_period),
            issued_on: date_field("Issued", &self.issued_on)?,
            expires_on: date_field("Expires", &self.expires_on)?,
            application_date: date_field("Application date", &self.application_date)?,
            renewal_fee: money_field(&self.renewal_fee)?,
            continuing_ed_fee: money_field(&self.continuing_ed_fee)?,
            continuing_ed_hours: number_field("Continuing ed hours", &self.continuing_ed_hours)?,
            status: LicenseStatus::parse(&self.status),
            license_type: self.license_type,
            license_number: blank(&self.license_number),
            board_name: blank(&self.board_name),
            board_phone: blank(&self.board_phone),
            board_email: blank(&self.board_email),
            board_url: blank(&self.board_url),
            board_address: blank(&self.board_address),
            designated_role: blank(&self.designated_role),
            notes: blank(&self.notes),
        })
    }

    fn into_new(self) -> ApiResult<NewLicense> {
        Ok(NewLicense {
            renewal_period_years: self.renewal_period()?,
            issued_on: date_field("Issued", &self.issued_on)?,
            expires_on: date_field("Expires", &self.expires_on)?,
            renewal_fee: money_field(&self.renewal_fee)?,
            continuing_ed_fee: money_field(&self.continuing_ed_fee)?,
            status: LicenseStatus::parse(&self.status),
            jurisdiction_abbr: self.jurisdiction_abbr,
            license_type: self.license_type,
            license_number: blank(&self.license_number),
            board_name: blank(&self.board_name),
            board_phone: blank(&self.board_phone),
            board_url: blank(&self.board_url),
            notes: blank(&self.notes),
        })
    }
}

/// POST /settings/update-license/:id
pub async fn update_license(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(license_id): Path<String>,
    Query(query): Query<AccountQuery>,
    Form(form): Form<LicenseForm>,
) -> PageResult<Redirect> {
    let account = form_account(&state, &session, &form.account, &query)?;
    let holder = ledger::load_holder(state.store.as_ref(), &account).await?;
    let current_period = holder
        .license(&license_id)
        .map(|l| l.recurring.renewal_period_years)
        .ok_or_else(|| lrm_common::Error::license_not_found(&license_id))?;

    let update = form.into_update(current_period)?;
    ledger::update_license(state.store.as_ref(), &account, &license_id, update).await?;
    Ok(manage_redirect(&account))
}

/// POST /settings/add-license
pub async fn add_license(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<AccountQuery>,
    Form(form): Form<LicenseForm>,
) -> PageResult<Redirect> {
    let account = form_account(&state, &session, &form.account, &query)?;
    let input = form.into_new()?;
    ledger::add_license(state.store.as_ref(), &account, input).await?;
    Ok(manage_redirect(&account))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CostForm {
    pub account: String,
    pub date: String,
    pub category: String,
    pub amount: String,
    pub vendor: String,
    pub notes: String,
}

/// POST /settings/add-cost/:id
pub async fn add_cost(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(license_id): Path<String>,
    Query(query): Query<AccountQuery>,
    Form(form): Form<CostForm>,
) -> PageResult<Redirect> {
    let account = form_account(&state, &session, &form.account, &query)?;
    if form.amount.trim().is_empty() {
        return Err(ApiError::BadRequest("Amount is required".to_string()).into());
    }
    let cost = NewCost {
        date: date_field("Date", &form.date)?,
        category: CostCategory::parse(&form.category),
        amount: money_field(&form.amount)?,
        vendor: blank(&form.vendor),
        notes: blank(&form.notes),
    };
    ledger::add_cost(state.store.as_ref(), &account, &license_id, cost, state.today()).await?;
    Ok(cost_details_redirect(&license_id, &account))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub account: String,
}

/// POST /settings/delete-cost/:id/:index
pub async fn delete_cost(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path((license_id, index)): Path<(String, usize)>,
    Query(query): Query<AccountQuery>,
    Form(form): Form<AccountForm>,
) -> PageResult<Redirect> {
    let account = form_account(&state, &session, &form.account, &query)?;
    ledger::delete_cost(state.store.as_ref(), &account, &license_id, index).await?;
    Ok(cost_details_redirect(&license_id, &account))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EstimatedCostsForm {
    pub account: String,
    pub application_fee: String,
    pub test_fee: String,
    pub trade_book_fee: String,
    pub business_law_book_fee: String,
    pub activation_fee: String,
    pub prep_course_fee: String,
    #[serde(alias = "travel_fee")]
    pub travel: String,
    #[serde(alias = "shipping_fee")]
    pub shipping: String,
    #[serde(alias = "other")]
    pub other_fee: String,
    pub est_study_hours: String,
    pub test_duration_hours: String,
}

impl EstimatedCostsForm {
    fn estimated(&self) -> ApiResult<EstimatedCosts> {
        Ok(EstimatedCosts {
            application_fee: money_field(&self.application_fee)?,
            test_fee: money_field(&self.test_fee)?,
            trade_book_fee: money_field(&self.trade_book_fee)?,
            business_law_book_fee: money_field(&self.business_law_book_fee)?,
            activation_fee: money_field(&self.activation_fee)?,
            prep_course_fee: money_field(&self.prep_course_fee)?,
            travel: money_field(&self.travel)?,
            shipping: money_field(&self.shipping)?,
            other_fee: money_field(&self.other_fee)?,
        })
    }

    /// Planning is only replaced when either field was submitted
    fn planning(&self) -> ApiResult<Option<Planning>> {
        let study: Option<u32> = number_field("Study hours", &self.est_study_hours)?;
        let test: Option<f64> = number_field("Test duration", &self.test_duration_hours)?;
        if study.is_none() && test.is_none() {
            return Ok(None);
        }
        Ok(Some(Planning {
            est_study_hours: study.unwrap_or(0),
            test_duration_hours: test.unwrap_or(0.0),
        }))
    }
}

/// POST /settings/update-estimated-costs/:id
pub async fn update_estimated_costs(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(license_id): Path<String>,
    Query(query): Query<AccountQuery>,
    Form(form): Form<EstimatedCostsForm>,
) -> PageResult<Redirect> {
    let account = form_account(&state, &session, &form.account, &query)?;
    let estimated = form.estimated()?;
    let planning = form.planning()?;
    ledger::update_estimated_costs(
        state.store.as_ref(),
        &account,
        &license_id,
        estimated,
        planning,
    )
    .await?;
    Ok(cost_details_redirect(&license_id, &account))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields() {
        assert_eq!(blank("  "), None);
        assert_eq!(blank(" TX-123 ").as_deref(), Some("TX-123"));
        assert_eq!(date_field("Issued", "").unwrap(), None);
        assert!(date_field("Issued", "next tuesday").is_err());
        assert_eq!(money_field("").unwrap(), Money::ZERO);
        assert_eq!(money_field("$1,250.50").unwrap(), Money::from_cents(125_050));
    }

    #[test]
    fn test_renewal_period_must_be_positive() {
        let form = LicenseForm {
            renewal_period_years: "0".to_string(),
            ..Default::default()
        };
        assert!(form.renewal_period().is_err());

        let form = LicenseForm {
            renewal_period_years: "".to_string(),
            ..Default::default()
        };
        assert_eq!(form.renewal_period().unwrap(), None);
    }

    #[test]
    fn test_planning_only_when_submitted() {
        let form = EstimatedCostsForm::default();
        assert_eq!(form.planning().unwrap(), None);

        let form = EstimatedCostsForm {
            est_study_hours: "40".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.planning().unwrap(),
            Some(Planning {
                est_study_hours: 40,
                test_duration_hours: 0.0
            })
        );
    }

    #[test]
    fn test_estimated_form_accepts_fee_aliases() {
        let form: EstimatedCostsForm =
            serde_json::from_str(r#"{"travel_fee": "120", "shipping_fee": "15.50"}"#).unwrap();
        let estimated = form.estimated().unwrap();
        assert_eq!(estimated.travel, Money::from_dollars(120));
        assert_eq!(estimated.shipping, Money::from_cents(1550));
    }
}
