//! JSON document store
//!
//! Layout under the data directory:
//!
//! ```text
//! license_holders/<account>.json
//! company/coverage.json
//! ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{validate_account, LicenseStore};
use crate::models::{CompanyCoverage, LicenseHolder, DIRECTOR_ACCOUNT};
use crate::Result;

pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn holders_dir(&self) -> PathBuf {
        self.data_dir.join("license_holders")
    }

    fn holder_path(&self, account: &str) -> Result<PathBuf> {
        validate_account(account)?;
        Ok(self.holders_dir().join(format!("{}.json", account)))
    }

    fn coverage_path(&self) -> PathBuf {
        self.data_dir.join("company").join("coverage.json")
    }
}

/// Read and parse a document; a missing file is `None`
async fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read a holder document; the file stem is the account key
///
/// A document whose `user_id` disagrees with its file name is read under the
/// file name, so the next save rewrites the same file.
async fn read_holder(path: &Path, account: &str) -> Result<Option<LicenseHolder>> {
    let Some(mut holder) = read_document::<LicenseHolder>(path).await? else {
        return Ok(None);
    };
    if holder.user_id != account {
        warn!(
            "Holder file {} has user_id {:?}; using {:?}",
            path.display(),
            holder.user_id,
            account
        );
        holder.user_id = account.to_string();
    }
    Ok(Some(holder))
}

/// Pretty-print to a sibling temp file, then rename over the target
async fn write_document<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl LicenseStore for JsonStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn list_holders(&self) -> Result<Vec<LicenseHolder>> {
        let mut entries = match tokio::fs::read_dir(self.holders_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut holders = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem == DIRECTOR_ACCOUNT {
                continue;
            }

            // One unreadable document should not take the dashboard down
            match read_holder(&path, stem).await {
                Ok(Some(holder)) => holders.push(holder),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable holder file {}: {}", path.display(), e),
            }
        }

        holders.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        debug!("Loaded {} holders from {}", holders.len(), self.holders_dir().display());
        Ok(holders)
    }

    async fn find_holder(&self, account: &str) -> Result<Option<LicenseHolder>> {
        if let Some(holder) = read_holder(&self.holder_path(account)?, account).await? {
            return Ok(Some(holder));
        }

        // Fall back to a PIN match
        Ok(self
            .list_holders()
            .await?
            .into_iter()
            .find(|h| h.matches_account(account)))
    }

    async fn upsert_holder(&self, holder: &LicenseHolder) -> Result<()> {
        let path = self.holder_path(&holder.user_id)?;
        write_document(&path, holder).await?;
        debug!("Saved holder {} to {}", holder.user_id, path.display());
        Ok(())
    }

    async fn delete_holder(&self, account: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.holder_path(account)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn company_coverage(&self) -> Result<Option<CompanyCoverage>> {
        read_document(&self.coverage_path()).await
    }

    async fn put_company_coverage(&self, coverage: &CompanyCoverage) -> Result<()> {
        write_document(&self.coverage_path(), coverage).await
    }
}
