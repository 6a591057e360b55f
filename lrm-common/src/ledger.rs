//! License and cost mutations
//!
//! Each operation loads one holder, edits it in memory, and writes the whole
//! holder back through the [`LicenseStore`]. The director account is an
//! aggregate view and cannot be edited.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::jurisdictions;
use crate::models::{
    CostCategory, CostEntry, EstimatedCosts, License, LicenseHolder, LicenseStatus, Planning,
    DIRECTOR_ACCOUNT,
};
use crate::money::Money;
use crate::store::LicenseStore;
use crate::{Error, Result};

/// Input for a new license
#[derive(Debug, Clone, Default)]
pub struct NewLicense {
    pub jurisdiction_abbr: String,
    pub license_type: String,
    pub license_number: Option<String>,
    pub status: LicenseStatus,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub board_name: Option<String>,
    pub board_phone: Option<String>,
    pub board_url: Option<String>,
    pub notes: Option<String>,
    pub renewal_period_years: Option<u32>,
    pub renewal_fee: Money,
    pub continuing_ed_fee: Money,
}

/// Edit-form fields for an existing license
#[derive(Debug, Clone, Default)]
pub struct LicenseUpdate {
    pub license_type: String,
    pub license_number: Option<String>,
    pub status: LicenseStatus,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub application_date: Option<NaiveDate>,
    pub board_name: Option<String>,
    pub board_phone: Option<String>,
    pub board_email: Option<String>,
    pub board_url: Option<String>,
    pub board_address: Option<String>,
    pub designated_role: Option<String>,
    pub notes: Option<String>,
    pub renewal_period_years: u32,
    pub renewal_fee: Money,
    pub continuing_ed_fee: Money,
    pub continuing_ed_hours: Option<u32>,
}

/// Input for an actual cost entry
#[derive(Debug, Clone)]
pub struct NewCost {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub category: CostCategory,
    pub amount: Money,
    pub vendor: Option<String>,
    pub notes: Option<String>,
}

/// Load an editable holder
pub async fn load_holder(store: &dyn LicenseStore, account: &str) -> Result<LicenseHolder> {
    if account == DIRECTOR_ACCOUNT {
        return Err(Error::InvalidInput(
            "The director view is read-only; select a license holder".to_string(),
        ));
    }
    store
        .find_holder(account)
        .await?
        .ok_or_else(|| Error::holder_not_found(account))
}

fn generate_license_id(abbr: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", abbr.to_lowercase(), &suffix[..8])
}

fn known_state(abbr: &str) -> Result<String> {
    let code = jurisdictions::normalize_code(abbr);
    if jurisdictions::is_known_state(&code) {
        Ok(code)
    } else {
        Err(Error::InvalidInput(format!("Unknown state: {}", abbr.trim())))
    }
}

async fn save(store: &dyn LicenseStore, mut holder: LicenseHolder) -> Result<LicenseHolder> {
    holder.total_licenses = holder.licenses.len() as u32;
    store.upsert_holder(&holder).await?;
    Ok(holder)
}

/// Add a license for a jurisdiction the holder does not have yet
pub async fn add_license(
    store: &dyn LicenseStore,
    account: &str,
    input: NewLicense,
) -> Result<License> {
    let abbr = known_state(&input.jurisdiction_abbr)?;
    if input.license_type.trim().is_empty() {
        return Err(Error::InvalidInput("License type is required".to_string()));
    }

    let mut holder = load_holder(store, account).await?;
    if holder.license_for_state(&abbr).is_some() {
        return Err(Error::Conflict(format!(
            "{} already has a license in {}",
            holder.name, abbr
        )));
    }

    let mut license = License::new(generate_license_id(&abbr), &abbr, input.license_type.trim());
    license.license_number = input.license_number;
    license.status = input.status;
    license.issued_on = input.issued_on;
    license.expires_on = input.expires_on;
    license.board_name = input.board_name;
    license.board_phone = input.board_phone;
    license.board_url = input.board_url;
    license.notes = input.notes;
    license.coverage_level = Some("draft".to_string());
    if let Some(years) = input.renewal_period_years {
        license.recurring.renewal_period_years = years;
    }
    license.recurring.renewal_fee = input.renewal_fee;
    license.recurring.continuing_ed_fee = input.continuing_ed_fee;

    holder.licenses.push(license.clone());
    let holder = save(store, holder).await?;
    info!(
        "Added license {} ({}) for {}",
        license.license_id, abbr, holder.user_id
    );
    Ok(license)
}

/// Apply edit-form fields to an existing license
pub async fn update_license(
    store: &dyn LicenseStore,
    account: &str,
    license_id: &str,
    update: LicenseUpdate,
) -> Result<License> {
    let mut holder = load_holder(store, account).await?;
    let license = holder
        .license_mut(license_id)
        .ok_or_else(|| Error::license_not_found(license_id))?;

    if !update.license_type.trim().is_empty() {
        license.license_type = update.license_type.trim().to_string();
    }
    license.license_number = update.license_number;
    license.status = update.status;
    license.issued_on = update.issued_on;
    license.expires_on = update.expires_on;
    license.application_date = update.application_date;
    license.board_name = update.board_name;
    license.board_phone = update.board_phone;
    license.board_email = update.board_email;
    license.board_url = update.board_url;
    license.board_address = update.board_address;
    license.designated_role = update.designated_role;
    license.notes = update.notes;
    license.recurring.renewal_period_years = update.renewal_period_years;
    license.recurring.renewal_fee = update.renewal_fee;
    license.recurring.continuing_ed_fee = update.continuing_ed_fee;
    license.continuing_ed_hours = update.continuing_ed_hours;

    let updated = license.clone();
    save(store, holder).await?;
    info!("Updated license {} for {}", license_id, account);
    Ok(updated)
}

/// Insert or replace the holder's license for a state
pub async fn save_license(
    store: &dyn LicenseStore,
    account: &str,
    state_abbr: &str,
    mut license: License,
) -> Result<License> {
    let abbr = known_state(state_abbr)?;
    let mut holder = load_holder(store, account).await?;

    license.jurisdiction_abbr = abbr.clone();
    if license.jurisdiction.trim().is_empty() {
        license.jurisdiction = jurisdictions::display_name(&abbr);
    }

    match holder
        .licenses
        .iter_mut()
        .find(|l| l.jurisdiction_abbr.eq_ignore_ascii_case(&abbr))
    {
        Some(existing) => {
            if license.license_id.trim().is_empty() {
                license.license_id = existing.license_id.clone();
            }
            *existing = license.clone();
        }
        None => {
            if license.license_id.trim().is_empty() {
                license.license_id = generate_license_id(&abbr);
            }
            holder.licenses.push(license.clone());
        }
    }

    save(store, holder).await?;
    info!("Saved {} license {} for {}", abbr, license.license_id, account);
    Ok(license)
}

/// Remove a license by id or by state abbreviation
pub async fn delete_license(store: &dyn LicenseStore, account: &str, key: &str) -> Result<License> {
    let mut holder = load_holder(store, account).await?;
    let position = holder
        .licenses
        .iter()
        .position(|l| l.license_id == key || l.jurisdiction_abbr.eq_ignore_ascii_case(key))
        .ok_or_else(|| Error::license_not_found(key))?;

    let removed = holder.licenses.remove(position);
    save(store, holder).await?;
    info!("Deleted license {} for {}", removed.license_id, account);
    Ok(removed)
}

/// Record an actual expense
pub async fn add_cost(
    store: &dyn LicenseStore,
    account: &str,
    license_id: &str,
    cost: NewCost,
    today: NaiveDate,
) -> Result<CostEntry> {
    if cost.amount < Money::ZERO {
        return Err(Error::InvalidInput("Cost amount cannot be negative".to_string()));
    }

    let mut holder = load_holder(store, account).await?;
    let license = holder
        .license_mut(license_id)
        .ok_or_else(|| Error::license_not_found(license_id))?;

    let entry = CostEntry {
        date: Some(cost.date.unwrap_or(today)),
        category: cost.category,
        amount: cost.amount,
        vendor: cost.vendor,
        notes: cost.notes,
        recurring: cost.category.is_recurring(),
    };
    license.actual_costs.push(entry.clone());

    save(store, holder).await?;
    info!(
        "Added {} cost of {} to license {}",
        entry.category, entry.amount, license_id
    );
    Ok(entry)
}

/// Remove the cost at `index` in date order (see [`License::costs_by_date`])
pub async fn delete_cost(
    store: &dyn LicenseStore,
    account: &str,
    license_id: &str,
    index: usize,
) -> Result<CostEntry> {
    let mut holder = load_holder(store, account).await?;
    let license = holder
        .license_mut(license_id)
        .ok_or_else(|| Error::license_not_found(license_id))?;

    let mut order: Vec<usize> = (0..license.actual_costs.len()).collect();
    order.sort_by_key(|&i| {
        let date = license.actual_costs[i].date;
        (date.is_none(), date)
    });
    let position = *order
        .get(index)
        .ok_or_else(|| Error::NotFound(format!("Cost entry {} on license {}", index, license_id)))?;

    let removed = license.actual_costs.remove(position);
    save(store, holder).await?;
    info!("Deleted cost entry {} from license {}", index, license_id);
    Ok(removed)
}

/// Replace the one-time budget and study planning
pub async fn update_estimated_costs(
    store: &dyn LicenseStore,
    account: &str,
    license_id: &str,
    estimated: EstimatedCosts,
    planning: Option<Planning>,
) -> Result<License> {
    let mut holder = load_holder(store, account).await?;
    let license = holder
        .license_mut(license_id)
        .ok_or_else(|| Error::license_not_found(license_id))?;

    license.estimated_costs = estimated;
    if planning.is_some() {
        license.planning = planning;
    }

    let updated = license.clone();
    save(store, holder).await?;
    info!(
        "Updated estimated costs for license {} ({})",
        license_id,
        updated.estimated_costs.total()
    );
    Ok(updated)
}
