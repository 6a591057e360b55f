//! Dashboard roll-ups over one holder or the whole roster
//!
//! Everything here is pure: callers load holders from a store and pass in a
//! [`StatusContext`] carrying today's date.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::costs::CostSummary;
use crate::models::{License, LicenseHolder, LicenseStatus};
use crate::money::Money;
use crate::status::{LicenseView, StatusClass, StatusContext};

/// Maximum urgent items surfaced on the home page
pub const MAX_URGENT_ITEMS: usize = 5;

/// Default window for "expires in N days" urgent items
pub const URGENT_WINDOW_DAYS: i64 = 30;

/// Window used by the leadership expiring-soon list
pub const LEADERSHIP_EXPIRING_DAYS: i64 = 90;

/// Identity shown for a holder or for the aggregate director view
#[derive(Debug, Clone, Serialize)]
pub struct HolderSummary {
    pub user_id: String,
    pub name: String,
    pub role: String,
    pub total_licenses: u32,
    pub total_certificates: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_holders: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_target_state: Option<String>,
}

impl HolderSummary {
    pub fn for_holder(holder: &LicenseHolder) -> Self {
        Self {
            user_id: holder.user_id.clone(),
            name: holder.name.clone(),
            role: holder
                .role
                .clone()
                .unwrap_or_else(|| "License Holder".to_string()),
            total_licenses: holder.total_licenses,
            total_certificates: holder.total_certificates,
            total_holders: None,
            next_target_state: holder.next_target_state.clone(),
        }
    }

    pub fn director(holders: &[LicenseHolder]) -> Self {
        Self {
            user_id: crate::models::DIRECTOR_ACCOUNT.to_string(),
            name: "Director View".to_string(),
            role: "Department Leadership".to_string(),
            total_licenses: holders.iter().map(|h| h.total_licenses).sum(),
            total_certificates: holders.iter().map(|h| h.total_certificates).sum(),
            total_holders: Some(holders.len()),
            next_target_state: None,
        }
    }

    pub fn is_director(&self) -> bool {
        self.user_id == crate::models::DIRECTOR_ACCOUNT
    }
}

/// Enhanced views for every license of every holder, tagged with the owner
pub fn all_license_views(ctx: &StatusContext, holders: &[LicenseHolder]) -> Vec<LicenseView> {
    holders
        .iter()
        .flat_map(|h| {
            h.licenses
                .iter()
                .map(move |l| ctx.view(l).with_holder(&h.name, &h.user_id))
        })
        .collect()
}

/// Counts by recorded status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub licensed: usize,
    pub in_progress: usize,
    pub not_licensed: usize,
    pub due_soon: usize,
    pub overdue: usize,
    pub total: usize,
}

impl StatusCounts {
    fn record(&mut self, status: LicenseStatus, class: StatusClass) {
        match status {
            LicenseStatus::Licensed => self.licensed += 1,
            LicenseStatus::InProgress => self.in_progress += 1,
            LicenseStatus::NotLicensed => self.not_licensed += 1,
        }
        match class {
            StatusClass::DueSoon => self.due_soon += 1,
            StatusClass::Overdue => self.overdue += 1,
            _ => {}
        }
        self.total += 1;
    }

    pub fn from_views(views: &[LicenseView]) -> Self {
        let mut counts = StatusCounts::default();
        for view in views {
            counts.record(view.license.status, view.status_class);
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Danger,
    Warning,
    Info,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Danger => "danger",
            Urgency::Warning => "warning",
            Urgency::Info => "info",
        }
    }
}

/// Action item surfaced on the home page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgentItem {
    pub jurisdiction: String,
    pub issue: String,
    pub urgency: Urgency,
    pub action: &'static str,
    pub license_id: String,
    pub account: Option<String>,
}

/// Derive the urgent item for a license, if any
///
/// Overdue wins over an imminent expiration, which wins over a pending application.
pub fn urgent_item(view: &LicenseView, urgent_window_days: i64) -> Option<UrgentItem> {
    let (issue, urgency, action) = if view.status_class == StatusClass::Overdue {
        ("OVERDUE".to_string(), Urgency::Danger, "Renew immediately")
    } else if let Some(days) = view
        .days_remaining
        .filter(|d| *d > 0 && *d <= urgent_window_days)
    {
        (format!("Expires in {} days", days), Urgency::Warning, "Plan renewal")
    } else if view.license.status == LicenseStatus::InProgress {
        ("Application Pending".to_string(), Urgency::Info, "Check status")
    } else {
        return None;
    };

    Some(UrgentItem {
        jurisdiction: view.license.jurisdiction.clone(),
        issue,
        urgency,
        action,
        license_id: view.license.license_id.clone(),
        account: view.holder_account.clone(),
    })
}

/// Sort key placing licenses without an expiration last
fn expiry_key(view: &LicenseView) -> (bool, Option<NaiveDate>) {
    (view.license.expires_on.is_none(), view.license.expires_on)
}

/// Home dashboard content
#[derive(Debug, Clone, Serialize)]
pub struct HomeOverview {
    pub stats: StatusCounts,
    pub urgent_items: Vec<UrgentItem>,
    pub licenses: Vec<LicenseView>,
    pub cost_summary: CostSummary,
}

pub fn home_overview(views: Vec<LicenseView>, urgent_window_days: i64) -> HomeOverview {
    let mut licenses = views;
    let urgent_items = licenses
        .iter()
        .filter_map(|v| urgent_item(v, urgent_window_days))
        .take(MAX_URGENT_ITEMS)
        .collect();
    licenses.sort_by_key(expiry_key);

    HomeOverview {
        stats: StatusCounts::from_views(&licenses),
        urgent_items,
        cost_summary: CostSummary::over(licenses.iter().map(|v| &v.license)),
        licenses,
    }
}

/// One jurisdiction on the roadmap map
#[derive(Debug, Clone, Serialize)]
pub struct StateEntry {
    pub state_abbr: String,
    pub name: String,
    pub status: LicenseStatus,
    pub status_class: StatusClass,
    pub badge_text: &'static str,
    pub days_remaining: Option<i64>,
    #[serde(with = "crate::time::opt_date")]
    pub expires_on: Option<NaiveDate>,
    pub license_type: String,
    pub license_id: Option<String>,
    pub license_number: Option<String>,
    pub board_name: Option<String>,
    pub board_url: Option<String>,
    pub holders: Vec<String>,
}

impl StateEntry {
    fn from_license(license: &License) -> Self {
        Self {
            state_abbr: license.jurisdiction_abbr.to_ascii_uppercase(),
            name: license.jurisdiction.clone(),
            status: license.status,
            status_class: StatusClass::from(license.status),
            badge_text: "",
            days_remaining: None,
            expires_on: license.expires_on,
            license_type: license.license_type.clone(),
            license_id: Some(license.license_id.clone()),
            license_number: license.license_number.clone(),
            board_name: license.board_name.clone(),
            board_url: license.board_url.clone(),
            holders: Vec::new(),
        }
    }

    fn derive(&mut self, ctx: &StatusContext) {
        self.status_class = ctx.classify(self.status, self.expires_on);
        self.badge_text = self.status_class.badge_text();
        self.days_remaining = ctx.days_remaining(self.expires_on);
    }
}

/// Roadmap map data keyed by postal code
#[derive(Debug, Clone, Serialize)]
pub struct RoadmapStates {
    pub states: BTreeMap<String, StateEntry>,
    pub stats: StatusCounts,
}

/// Map data for one holder: the first license recorded for each jurisdiction
pub fn holder_roadmap(ctx: &StatusContext, holder: &LicenseHolder) -> RoadmapStates {
    let mut states: BTreeMap<String, StateEntry> = BTreeMap::new();
    for license in &holder.licenses {
        let abbr = license.jurisdiction_abbr.to_ascii_uppercase();
        if abbr.is_empty() {
            continue;
        }
        states.entry(abbr).or_insert_with(|| {
            let mut entry = StateEntry::from_license(license);
            entry.holders.push(holder.name.clone());
            entry.derive(ctx);
            entry
        });
    }

    // Status counts cover every license; urgency counts cover the map entries
    let mut stats = StatusCounts::default();
    for license in &holder.licenses {
        match license.status {
            LicenseStatus::Licensed => stats.licensed += 1,
            LicenseStatus::InProgress => stats.in_progress += 1,
            LicenseStatus::NotLicensed => stats.not_licensed += 1,
        }
    }
    stats.total = holder.licenses.len();
    stats.due_soon = states
        .values()
        .filter(|s| s.status_class == StatusClass::DueSoon)
        .count();
    stats.overdue = states
        .values()
        .filter(|s| s.status_class == StatusClass::Overdue)
        .count();

    RoadmapStates { states, stats }
}

/// Map data merged across all holders
///
/// Each jurisdiction takes the best status any holder has there and the
/// earliest expiration date on record.
pub fn director_roadmap(ctx: &StatusContext, holders: &[LicenseHolder]) -> RoadmapStates {
    let mut states: BTreeMap<String, StateEntry> = BTreeMap::new();
    for holder in holders {
        for license in &holder.licenses {
            let abbr = license.jurisdiction_abbr.to_ascii_uppercase();
            if abbr.is_empty() {
                continue;
            }
            let entry = states
                .entry(abbr)
                .or_insert_with(|| StateEntry::from_license(license));

            if license.status.rank() > entry.status.rank() {
                entry.status = license.status;
            }
            if let Some(exp) = license.expires_on {
                if entry.expires_on.map_or(true, |current| exp < current) {
                    entry.expires_on = Some(exp);
                }
            }
            entry.holders.push(holder.name.clone());
        }
    }

    let mut stats = StatusCounts::default();
    for entry in states.values_mut() {
        entry.derive(ctx);
        stats.record(entry.status, entry.status_class);
    }

    RoadmapStates { states, stats }
}

/// Per-state coverage for leadership reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateCoverage {
    pub name: String,
    pub licensed_count: usize,
    pub in_progress_count: usize,
    pub holders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpiringLicense {
    pub holder: String,
    pub state: String,
    pub state_abbr: String,
    pub license_id: String,
    pub days_remaining: i64,
    #[serde(with = "crate::time::opt_date")]
    pub expires_on: Option<NaiveDate>,
}

/// Leadership dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct LeadershipData {
    pub total_holders: usize,
    pub total_licenses: u32,
    pub total_certificates: u32,
    pub states_covered: usize,
    pub states_in_progress: usize,
    pub state_coverage: BTreeMap<String, StateCoverage>,
    pub expiring_soon: Vec<ExpiringLicense>,
    pub coverage_gaps: Vec<String>,
    pub total_spent: Money,
}

pub fn leadership_data(
    ctx: &StatusContext,
    holders: &[LicenseHolder],
    high_priority_states: &[String],
) -> LeadershipData {
    let mut state_coverage: BTreeMap<String, StateCoverage> = BTreeMap::new();
    let mut expiring_soon = Vec::new();

    for holder in holders {
        for license in &holder.licenses {
            let abbr = license.jurisdiction_abbr.to_ascii_uppercase();
            let coverage = state_coverage
                .entry(abbr.clone())
                .or_insert_with(|| StateCoverage {
                    name: license.jurisdiction.clone(),
                    ..Default::default()
                });
            match license.status {
                LicenseStatus::Licensed => coverage.licensed_count += 1,
                LicenseStatus::InProgress => coverage.in_progress_count += 1,
                LicenseStatus::NotLicensed => {}
            }
            coverage.holders.push(holder.name.clone());

            if let Some(days) = ctx
                .days_remaining(license.expires_on)
                .filter(|d| *d <= LEADERSHIP_EXPIRING_DAYS)
            {
                expiring_soon.push(ExpiringLicense {
                    holder: holder.name.clone(),
                    state: license.jurisdiction.clone(),
                    state_abbr: abbr,
                    license_id: license.license_id.clone(),
                    days_remaining: days,
                    expires_on: license.expires_on,
                });
            }
        }
    }
    expiring_soon.sort_by_key(|e| e.days_remaining);

    let coverage_gaps = high_priority_states
        .iter()
        .map(|s| s.to_ascii_uppercase())
        .filter(|s| {
            state_coverage
                .get(s)
                .map_or(true, |c| c.licensed_count == 0)
        })
        .collect();

    LeadershipData {
        total_holders: holders.len(),
        total_licenses: holders.iter().map(|h| h.total_licenses).sum(),
        total_certificates: holders.iter().map(|h| h.total_certificates).sum(),
        states_covered: state_coverage
            .values()
            .filter(|c| c.licensed_count > 0)
            .count(),
        states_in_progress: state_coverage
            .values()
            .filter(|c| c.in_progress_count > 0)
            .count(),
        total_spent: CostSummary::over(holders.iter().flat_map(|h| h.licenses.iter()))
            .total_actual,
        state_coverage,
        expiring_soon,
        coverage_gaps,
    }
}
