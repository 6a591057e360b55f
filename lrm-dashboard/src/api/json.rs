//! JSON API endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use lrm_common::content::CatalogView;
use lrm_common::ledger;
use lrm_common::models::{CompanyCoverage, License, LicenseHolder, LicenseStatus, DIRECTOR_ACCOUNT};
use lrm_common::rollup::{self, LeadershipData};
use serde::{Deserialize, Serialize};

use super::account::permitted_account;
use crate::error::{ApiError, ApiResult};
use crate::session::CurrentSession;
use crate::AppState;

/// Outcome of a write
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
}

/// GET /api/states
///
/// State catalog with derived status fields.
pub async fn api_states(State(state): State<AppState>) -> ApiResult<Json<BTreeMap<String, CatalogView>>> {
    let ctx = state.status_context();
    Ok(Json(state.content.catalog_views(&ctx).await?))
}

/// GET /api/leadership-data
///
/// Roster-wide roll-up; requires director access when PINs are on.
pub async fn leadership_data(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Json<LeadershipData>> {
    permitted_account(&state, &session, Some(DIRECTOR_ACCOUNT))?;
    let holders = state.store.list_holders().await?;
    let ctx = state.status_context();
    Ok(Json(rollup::leadership_data(
        &ctx,
        &holders,
        &state.config.dashboard.high_priority_states,
    )))
}

#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    #[serde(flatten)]
    pub coverage: CompanyCoverage,
    pub total_states_covered: usize,
    pub total_states_in_progress: usize,
}

/// Coverage implied by the roster when none has been stored
fn derived_coverage(company_name: &str, holders: &[LicenseHolder], targets: &[String]) -> CompanyCoverage {
    let mut best: BTreeMap<String, LicenseStatus> = BTreeMap::new();
    for license in holders.iter().flat_map(|h| h.licenses.iter()) {
        let abbr = license.jurisdiction_abbr.to_ascii_uppercase();
        let entry = best.entry(abbr).or_insert(license.status);
        if license.status.rank() > entry.rank() {
            *entry = license.status;
        }
    }

    let with_status = |status: LicenseStatus| -> Vec<String> {
        best.iter()
            .filter(|(_, s)| **s == status)
            .map(|(abbr, _)| abbr.clone())
            .collect()
    };
    let covered_states = with_status(LicenseStatus::Licensed);
    let in_progress_states = with_status(LicenseStatus::InProgress);
    let target_states = targets
        .iter()
        .map(|s| s.to_ascii_uppercase())
        .filter(|s| !covered_states.contains(s) && !in_progress_states.contains(s))
        .collect();

    CompanyCoverage {
        company_name: company_name.to_string(),
        covered_states,
        in_progress_states,
        target_states,
    }
}

/// GET /api/company-coverage
pub async fn company_coverage(State(state): State<AppState>) -> ApiResult<Json<CoverageResponse>> {
    let coverage = match state.store.company_coverage().await? {
        Some(coverage) => coverage,
        None => {
            let holders = state.store.list_holders().await?;
            derived_coverage(
                &state.config.dashboard.company_name,
                &holders,
                &state.config.dashboard.high_priority_states,
            )
        }
    };
    Ok(Json(CoverageResponse {
        total_states_covered: coverage.total_states_covered(),
        total_states_in_progress: coverage.total_states_in_progress(),
        coverage,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveLicenseRequest {
    #[serde(default)]
    pub account: Option<String>,
    pub state_abbr: String,
    pub license_data: License,
}

/// POST /api/save-license
pub async fn save_license(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    payload: Result<Json<SaveLicenseRequest>, JsonRejection>,
) -> ApiResult<Json<SaveResponse>> {
    let Json(request) = payload?;
    let account = permitted_account(&state, &session, request.account.as_deref())?;
    let saved = ledger::save_license(
        state.store.as_ref(),
        &account,
        &request.state_abbr,
        request.license_data,
    )
    .await?;
    Ok(Json(SaveResponse {
        success: true,
        message: format!("Saved {} license", saved.jurisdiction_abbr),
        license_id: Some(saved.license_id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLicenseRequest {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub state_abbr: Option<String>,
}

/// POST /api/delete-license
///
/// Accepts either a license id or a state abbreviation.
pub async fn delete_license(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    payload: Result<Json<DeleteLicenseRequest>, JsonRejection>,
) -> ApiResult<Json<SaveResponse>> {
    let Json(request) = payload?;
    let account = permitted_account(&state, &session, request.account.as_deref())?;
    let key = request
        .license_id
        .as_deref()
        .or(request.state_abbr.as_deref())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("license_id or state_abbr is required".to_string()))?;

    let removed = ledger::delete_license(state.store.as_ref(), &account, key).await?;
    Ok(Json(SaveResponse {
        success: true,
        message: format!("Deleted {} license", removed.jurisdiction_abbr),
        license_id: Some(removed.license_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_coverage_uses_best_status() {
        let mut a = LicenseHolder::new("a", "A");
        let mut tx = License::new("tx-1", "TX", "Master");
        tx.status = LicenseStatus::Licensed;
        let mut az = License::new("az-1", "AZ", "Master");
        az.status = LicenseStatus::InProgress;
        a.licenses = vec![tx, az];

        let mut b = LicenseHolder::new("b", "B");
        let mut az_b = License::new("az-2", "AZ", "Journeyman");
        az_b.status = LicenseStatus::Licensed;
        b.licenses = vec![az_b];

        let targets = vec!["TX".to_string(), "NM".to_string()];
        let coverage = derived_coverage("Acme", &[a, b], &targets);
        assert_eq!(coverage.covered_states, vec!["AZ", "TX"]);
        assert!(coverage.in_progress_states.is_empty());
        assert_eq!(coverage.target_states, vec!["NM"]);
        assert_eq!(coverage.company_name, "Acme");
    }
}
