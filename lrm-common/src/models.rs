//! Licensing records
//!
//! Field names match the stored JSON documents (`data/license_holders/*.json`)
//! so both storage backends read and write the same shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::money::Money;

/// Account key reserved for the aggregate director view
pub const DIRECTOR_ACCOUNT: &str = "director";

/// Licensing status as recorded by the holder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Licensed,
    InProgress,
    #[default]
    #[serde(other)]
    NotLicensed,
}

impl LicenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LicenseStatus::Licensed => "licensed",
            LicenseStatus::InProgress => "in_progress",
            LicenseStatus::NotLicensed => "not_licensed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LicenseStatus::Licensed => "Licensed",
            LicenseStatus::InProgress => "In Progress",
            LicenseStatus::NotLicensed => "Not Licensed",
        }
    }

    /// Lenient parse for form input; unknown values are `NotLicensed`
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "licensed" => LicenseStatus::Licensed,
            "in_progress" => LicenseStatus::InProgress,
            _ => LicenseStatus::NotLicensed,
        }
    }

    /// Coverage rank used when merging holders: licensed > in progress > not licensed
    pub fn rank(self) -> u8 {
        match self {
            LicenseStatus::Licensed => 2,
            LicenseStatus::InProgress => 1,
            LicenseStatus::NotLicensed => 0,
        }
    }

    pub const ALL: [LicenseStatus; 3] = [
        LicenseStatus::Licensed,
        LicenseStatus::InProgress,
        LicenseStatus::NotLicensed,
    ];
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an actual cost line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    ApplicationFee,
    TestFee,
    TradeBookFee,
    BusinessLawBookFee,
    ActivationFee,
    PrepCourseFee,
    Travel,
    Shipping,
    RenewalFee,
    ContinuingEdFee,
    #[serde(other)]
    OtherFee,
}

impl CostCategory {
    pub const ALL: [CostCategory; 11] = [
        CostCategory::ApplicationFee,
        CostCategory::TestFee,
        CostCategory::TradeBookFee,
        CostCategory::BusinessLawBookFee,
        CostCategory::ActivationFee,
        CostCategory::PrepCourseFee,
        CostCategory::Travel,
        CostCategory::Shipping,
        CostCategory::RenewalFee,
        CostCategory::ContinuingEdFee,
        CostCategory::OtherFee,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CostCategory::ApplicationFee => "application_fee",
            CostCategory::TestFee => "test_fee",
            CostCategory::TradeBookFee => "trade_book_fee",
            CostCategory::BusinessLawBookFee => "business_law_book_fee",
            CostCategory::ActivationFee => "activation_fee",
            CostCategory::PrepCourseFee => "prep_course_fee",
            CostCategory::Travel => "travel",
            CostCategory::Shipping => "shipping",
            CostCategory::RenewalFee => "renewal_fee",
            CostCategory::ContinuingEdFee => "continuing_ed_fee",
            CostCategory::OtherFee => "other_fee",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CostCategory::ApplicationFee => "Application Fee",
            CostCategory::TestFee => "Test Fee",
            CostCategory::TradeBookFee => "Trade Book",
            CostCategory::BusinessLawBookFee => "Business & Law Book",
            CostCategory::ActivationFee => "Activation Fee",
            CostCategory::PrepCourseFee => "Prep Course",
            CostCategory::Travel => "Travel",
            CostCategory::Shipping => "Shipping",
            CostCategory::RenewalFee => "Renewal Fee",
            CostCategory::ContinuingEdFee => "Continuing Education",
            CostCategory::OtherFee => "Other",
        }
    }

    /// Accepts the stored names plus the `travel_fee`/`shipping_fee` form aliases
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "application_fee" => CostCategory::ApplicationFee,
            "test_fee" => CostCategory::TestFee,
            "trade_book_fee" => CostCategory::TradeBookFee,
            "business_law_book_fee" => CostCategory::BusinessLawBookFee,
            "activation_fee" => CostCategory::ActivationFee,
            "prep_course_fee" => CostCategory::PrepCourseFee,
            "travel" | "travel_fee" => CostCategory::Travel,
            "shipping" | "shipping_fee" => CostCategory::Shipping,
            "renewal_fee" => CostCategory::RenewalFee,
            "continuing_ed_fee" => CostCategory::ContinuingEdFee,
            _ => CostCategory::OtherFee,
        }
    }

    /// Renewal and continuing-ed spend repeats every renewal period
    pub fn is_recurring(self) -> bool {
        matches!(self, CostCategory::RenewalFee | CostCategory::ContinuingEdFee)
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actual expense recorded against a license
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    #[serde(with = "crate::time::opt_date", default)]
    pub date: Option<NaiveDate>,
    pub category: CostCategory,
    #[serde(default)]
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

/// Recurring obligations per renewal period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringCosts {
    #[serde(default = "default_renewal_period")]
    pub renewal_period_years: u32,
    #[serde(default)]
    pub renewal_fee: Money,
    #[serde(default)]
    pub continuing_ed_fee: Money,
}

fn default_renewal_period() -> u32 {
    2
}

impl Default for RecurringCosts {
    fn default() -> Self {
        Self {
            renewal_period_years: default_renewal_period(),
            renewal_fee: Money::ZERO,
            continuing_ed_fee: Money::ZERO,
        }
    }
}

/// One-time budget estimate for obtaining a license
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedCosts {
    #[serde(default)]
    pub application_fee: Money,
    #[serde(default)]
    pub test_fee: Money,
    #[serde(default)]
    pub trade_book_fee: Money,
    #[serde(default)]
    pub business_law_book_fee: Money,
    #[serde(default)]
    pub activation_fee: Money,
    #[serde(default)]
    pub prep_course_fee: Money,
    #[serde(default, alias = "travel_fee")]
    pub travel: Money,
    #[serde(default, alias = "shipping_fee")]
    pub shipping: Money,
    #[serde(default, alias = "other")]
    pub other_fee: Money,
}

impl EstimatedCosts {
    /// Budget lines with display labels, in form order
    pub fn lines(&self) -> [(&'static str, &'static str, Money); 9] {
        [
            ("application_fee", "Application Fee", self.application_fee),
            ("test_fee", "Test Fee", self.test_fee),
            ("trade_book_fee", "Trade Book", self.trade_book_fee),
            ("business_law_book_fee", "Business & Law Book", self.business_law_book_fee),
            ("activation_fee", "Activation Fee", self.activation_fee),
            ("prep_course_fee", "Prep Course", self.prep_course_fee),
            ("travel", "Travel", self.travel),
            ("shipping", "Shipping", self.shipping),
            ("other_fee", "Other", self.other_fee),
        ]
    }

    pub fn total(&self) -> Money {
        self.lines().iter().map(|(_, _, amount)| *amount).sum()
    }
}

/// Study planning attached to a license budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planning {
    #[serde(default)]
    pub est_study_hours: u32,
    #[serde(default)]
    pub test_duration_hours: f64,
}

/// A license (or license application) held in one jurisdiction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub license_id: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub jurisdiction_abbr: String,
    #[serde(default = "default_jurisdiction_type")]
    pub jurisdiction_type: String,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub status: LicenseStatus,
    #[serde(with = "crate::time::opt_date", default)]
    pub issued_on: Option<NaiveDate>,
    #[serde(with = "crate::time::opt_date", default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(with = "crate::time::opt_date", default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<NaiveDate>,
    #[serde(default)]
    pub board_name: Option<String>,
    #[serde(default)]
    pub board_phone: Option<String>,
    #[serde(default)]
    pub board_email: Option<String>,
    #[serde(default)]
    pub board_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_address: Option<String>,
    #[serde(default)]
    pub designated_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_level: Option<String>,
    #[serde(default)]
    pub recurring: RecurringCosts,
    #[serde(default)]
    pub estimated_costs: EstimatedCosts,
    #[serde(default)]
    pub actual_costs: Vec<CostEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning: Option<Planning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuing_ed_hours: Option<u32>,
}

fn default_jurisdiction_type() -> String {
    "state".to_string()
}

impl License {
    /// Minimal license record for a jurisdiction
    pub fn new(license_id: impl Into<String>, abbr: &str, license_type: impl Into<String>) -> Self {
        let abbr = crate::jurisdictions::normalize_code(abbr);
        Self {
            license_id: license_id.into(),
            jurisdiction: crate::jurisdictions::display_name(&abbr),
            jurisdiction_abbr: abbr,
            jurisdiction_type: default_jurisdiction_type(),
            license_type: license_type.into(),
            license_number: None,
            status: LicenseStatus::NotLicensed,
            issued_on: None,
            expires_on: None,
            application_date: None,
            board_name: None,
            board_phone: None,
            board_email: None,
            board_url: None,
            board_address: None,
            designated_role: None,
            notes: None,
            coverage_level: None,
            recurring: RecurringCosts::default(),
            estimated_costs: EstimatedCosts::default(),
            actual_costs: Vec::new(),
            planning: None,
            continuing_ed_hours: None,
        }
    }

    /// Actual costs in date order (undated entries last), with their index
    ///
    /// Cost deletion addresses entries by position in this ordering.
    pub fn costs_by_date(&self) -> Vec<&CostEntry> {
        let mut costs: Vec<&CostEntry> = self.actual_costs.iter().collect();
        costs.sort_by_key(|c| (c.date.is_none(), c.date));
        costs
    }
}

/// Free-form biography sections kept alongside a holder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BioData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_history: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "plumbing_experience")]
    pub experience: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_projects: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub military: Option<Value>,
}

/// A field worker who holds (or is pursuing) licenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseHolder {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default)]
    pub total_licenses: u32,
    #[serde(default)]
    pub total_certificates: u32,
    #[serde(default)]
    pub next_target_state: Option<String>,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<BioData>,
}

impl LicenseHolder {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role: None,
            pin: None,
            total_licenses: 0,
            total_certificates: 0,
            next_target_state: None,
            licenses: Vec::new(),
            bio: None,
        }
    }

    pub fn license(&self, license_id: &str) -> Option<&License> {
        self.licenses.iter().find(|l| l.license_id == license_id)
    }

    pub fn license_mut(&mut self, license_id: &str) -> Option<&mut License> {
        self.licenses.iter_mut().find(|l| l.license_id == license_id)
    }

    pub fn license_for_state(&self, abbr: &str) -> Option<&License> {
        self.licenses
            .iter()
            .find(|l| l.jurisdiction_abbr.eq_ignore_ascii_case(abbr))
    }

    /// True when `account` names this holder by user id or PIN
    pub fn matches_account(&self, account: &str) -> bool {
        self.user_id == account || self.pin.as_deref() == Some(account)
    }
}

/// Company-wide state coverage targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyCoverage {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub covered_states: Vec<String>,
    #[serde(default)]
    pub in_progress_states: Vec<String>,
    #[serde(default)]
    pub target_states: Vec<String>,
}

impl CompanyCoverage {
    pub fn total_states_covered(&self) -> usize {
        self.covered_states.len()
    }

    pub fn total_states_in_progress(&self) -> usize {
        self.in_progress_states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_document_reads_stored_shape() {
        let doc = r#"{
            "user_id": "jdoe",
            "name": "Jane Doe",
            "role": "Master Plumber",
            "pin": "4321",
            "total_licenses": 2,
            "total_certificates": 1,
            "licenses": [{
                "license_id": "tx-master",
                "jurisdiction": "Texas",
                "jurisdiction_abbr": "TX",
                "jurisdiction_type": "state",
                "license_type": "Master Plumber",
                "status": "licensed",
                "issued_on": "2024-01-15",
                "expires_on": "2026-01-15",
                "recurring": {"renewal_period_years": 1, "renewal_fee": 150.0},
                "estimated_costs": {"application_fee": 100, "travel_fee": 50.5},
                "actual_costs": [
                    {"date": "2024-01-02", "category": "application_fee", "amount": 100.0},
                    {"date": "2024-01-10", "category": "mystery_fee", "amount": 12.0}
                ]
            }]
        }"#;
        let holder: LicenseHolder = serde_json::from_str(doc).unwrap();
        let lic = &holder.licenses[0];
        assert_eq!(lic.status, LicenseStatus::Licensed);
        assert_eq!(lic.recurring.renewal_period_years, 1);
        assert_eq!(lic.recurring.continuing_ed_fee, Money::ZERO);
        assert_eq!(lic.estimated_costs.travel, Money::from_cents(5050));
        assert_eq!(lic.actual_costs[1].category, CostCategory::OtherFee);
        assert!(holder.matches_account("4321"));
        assert!(holder.matches_account("jdoe"));
        assert!(!holder.matches_account("director"));
    }

    #[test]
    fn test_unknown_status_reads_as_not_licensed() {
        let status: LicenseStatus = serde_json::from_str(r#""expired""#).unwrap();
        assert_eq!(status, LicenseStatus::NotLicensed);
    }

    #[test]
    fn test_estimated_total_sums_all_lines() {
        let est = EstimatedCosts {
            application_fee: Money::from_dollars(100),
            test_fee: Money::from_dollars(75),
            other_fee: Money::from_cents(2550),
            ..Default::default()
        };
        assert_eq!(est.total(), Money::from_cents(20_050));
    }

    #[test]
    fn test_costs_by_date_orders_undated_last() {
        let mut lic = License::new("x", "tx", "Journeyman");
        let entry = |d: Option<&str>, cents| CostEntry {
            date: d.and_then(crate::time::parse_date),
            category: CostCategory::OtherFee,
            amount: Money::from_cents(cents),
            vendor: None,
            notes: None,
            recurring: false,
        };
        lic.actual_costs = vec![
            entry(None, 1),
            entry(Some("2025-05-01"), 2),
            entry(Some("2024-05-01"), 3),
        ];
        let ordered: Vec<i64> = lic.costs_by_date().iter().map(|c| c.amount.cents()).collect();
        assert_eq!(ordered, vec![3, 2, 1]);
        assert_eq!(lic.jurisdiction, "Texas");
    }

    #[test]
    fn test_company_coverage_totals() {
        let cov = CompanyCoverage {
            company_name: "Acme".into(),
            covered_states: vec!["TX".into()],
            in_progress_states: vec!["AZ".into()],
            target_states: vec!["NM".into()],
        };
        assert_eq!(cov.total_states_covered(), 1);
        assert_eq!(cov.total_states_in_progress(), 1);
    }
}
