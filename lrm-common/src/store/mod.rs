//! Storage accessors
//!
//! Handlers read and write holders through [`LicenseStore`]; the backend is
//! either a directory of JSON documents or a SQLite database. Both persist the
//! same [`LicenseHolder`] shape, so switching backends changes nothing above
//! this layer.

use async_trait::async_trait;

use crate::models::{CompanyCoverage, LicenseHolder};
use crate::{Error, Result};

pub mod json;
#[cfg(feature = "sqlx")]
pub mod sql;

pub use json::JsonStore;
#[cfg(feature = "sqlx")]
pub use sql::SqlStore;

/// Persistence for license holders and company coverage
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// All holders, ordered by user id
    async fn list_holders(&self) -> Result<Vec<LicenseHolder>>;

    /// Holder whose user id or PIN equals `account`
    async fn find_holder(&self, account: &str) -> Result<Option<LicenseHolder>>;

    /// Insert or fully replace a holder keyed by user id
    async fn upsert_holder(&self, holder: &LicenseHolder) -> Result<()>;

    /// Returns false when no such holder existed
    async fn delete_holder(&self, account: &str) -> Result<bool>;

    async fn company_coverage(&self) -> Result<Option<CompanyCoverage>>;

    async fn put_company_coverage(&self, coverage: &CompanyCoverage) -> Result<()>;
}

/// Account keys become file names, so only a conservative alphabet is allowed
pub fn validate_account(account: &str) -> Result<()> {
    let valid = !account.is_empty()
        && account.len() <= 64
        && !account.starts_with('.')
        && account
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Invalid account name: {:?}", account)))
    }
}
