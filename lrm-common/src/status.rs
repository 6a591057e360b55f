//! Expiration-driven status derivation
//!
//! A `licensed` record with an expiration date is reclassified by how close
//! that date is: past it is `overdue`, inside the due-soon window it is
//! `due-soon`. Everything else keeps its recorded status.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::costs::LicenseTotals;
use crate::models::{License, LicenseStatus};

/// Default due-soon window (days before expiration)
pub const DUE_SOON_DAYS: i64 = 90;

/// Display class derived from status and expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusClass {
    #[serde(rename = "licensed")]
    Licensed,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "not_licensed")]
    NotLicensed,
    #[serde(rename = "due-soon")]
    DueSoon,
    #[serde(rename = "overdue")]
    Overdue,
}

impl StatusClass {
    /// CSS class name
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Licensed => "licensed",
            StatusClass::InProgress => "in_progress",
            StatusClass::NotLicensed => "not_licensed",
            StatusClass::DueSoon => "due-soon",
            StatusClass::Overdue => "overdue",
        }
    }

    pub fn badge_text(self) -> &'static str {
        match self {
            StatusClass::Overdue => "Overdue",
            StatusClass::DueSoon => "Renewal Due Soon",
            StatusClass::Licensed => "Licensed ✅",
            StatusClass::InProgress => "In Progress",
            StatusClass::NotLicensed => "Not Licensed",
        }
    }
}

impl From<LicenseStatus> for StatusClass {
    fn from(status: LicenseStatus) -> Self {
        match status {
            LicenseStatus::Licensed => StatusClass::Licensed,
            LicenseStatus::InProgress => StatusClass::InProgress,
            LicenseStatus::NotLicensed => StatusClass::NotLicensed,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole days from `today` until `expires_on` (negative once expired)
pub fn days_remaining(expires_on: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    expires_on.map(|exp| (exp - today).num_days())
}

pub fn status_class(
    status: LicenseStatus,
    expires_on: Option<NaiveDate>,
    today: NaiveDate,
    due_soon_days: i64,
) -> StatusClass {
    if status == LicenseStatus::Licensed {
        if let Some(days) = days_remaining(expires_on, today) {
            if days < 0 {
                return StatusClass::Overdue;
            }
            if days <= due_soon_days {
                return StatusClass::DueSoon;
            }
        }
    }
    status.into()
}

/// Inputs shared by every derivation on one request
#[derive(Debug, Clone, Copy)]
pub struct StatusContext {
    pub today: NaiveDate,
    pub due_soon_days: i64,
}

impl StatusContext {
    pub fn new(today: NaiveDate, due_soon_days: i64) -> Self {
        Self {
            today,
            due_soon_days,
        }
    }

    pub fn classify(&self, status: LicenseStatus, expires_on: Option<NaiveDate>) -> StatusClass {
        status_class(status, expires_on, self.today, self.due_soon_days)
    }

    pub fn days_remaining(&self, expires_on: Option<NaiveDate>) -> Option<i64> {
        days_remaining(expires_on, self.today)
    }

    /// Enhance a license with derived display fields
    pub fn view(&self, license: &License) -> LicenseView {
        let status_class = self.classify(license.status, license.expires_on);
        LicenseView {
            license: license.clone(),
            status_class,
            badge_text: status_class.badge_text(),
            days_remaining: self.days_remaining(license.expires_on),
            cost_totals: LicenseTotals::for_license(license),
            holder_name: None,
            holder_account: None,
        }
    }
}

/// A license with its derived status and cost fields
#[derive(Debug, Clone, Serialize)]
pub struct LicenseView {
    #[serde(flatten)]
    pub license: License,
    pub status_class: StatusClass,
    pub badge_text: &'static str,
    pub days_remaining: Option<i64>,
    pub cost_totals: LicenseTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_account: Option<String>,
}

impl LicenseView {
    pub fn with_holder(mut self, name: &str, account: &str) -> Self {
        self.holder_name = Some(name.to_string());
        self.holder_account = Some(account.to_string());
        self
    }
}
