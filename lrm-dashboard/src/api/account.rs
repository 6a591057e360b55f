//! Account selection
//!
//! Pages act on one holder or on the aggregate director view, chosen with
//! `?account=`. A holder session is pinned to its own account when PINs are
//! required.

use lrm_common::models::{LicenseHolder, DIRECTOR_ACCOUNT};
use lrm_common::rollup::{all_license_views, HolderSummary};
use lrm_common::status::{LicenseView, StatusContext};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    #[serde(default)]
    pub account: Option<String>,
}

impl AccountQuery {
    pub fn requested(&self) -> Option<&str> {
        self.account.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

/// Holders a request is looking at
#[derive(Debug, Clone)]
pub enum Scope {
    Director(Vec<LicenseHolder>),
    Holder(LicenseHolder),
}

impl Scope {
    pub fn account(&self) -> &str {
        match self {
            Scope::Director(_) => DIRECTOR_ACCOUNT,
            Scope::Holder(holder) => &holder.user_id,
        }
    }

    pub fn is_director(&self) -> bool {
        matches!(self, Scope::Director(_))
    }

    pub fn holders(&self) -> &[LicenseHolder] {
        match self {
            Scope::Director(holders) => holders,
            Scope::Holder(holder) => std::slice::from_ref(holder),
        }
    }

    pub fn summary(&self) -> HolderSummary {
        match self {
            Scope::Director(holders) => HolderSummary::director(holders),
            Scope::Holder(holder) => HolderSummary::for_holder(holder),
        }
    }

    /// License views; the director view tags each with its holder
    pub fn license_views(&self, ctx: &StatusContext) -> Vec<LicenseView> {
        match self {
            Scope::Director(holders) => all_license_views(ctx, holders),
            Scope::Holder(holder) => holder.licenses.iter().map(|l| ctx.view(l)).collect(),
        }
    }
}

/// Account this request may act on
pub fn permitted_account(
    state: &AppState,
    session: &CurrentSession,
    requested: Option<&str>,
) -> ApiResult<String> {
    let default_account = || state.config.dashboard.default_account.clone();
    let require_pin = state.config.auth.require_pin;

    match &session.0 {
        Some(session) => match session.holder_account() {
            Some(own) => match requested {
                None => Ok(own.to_string()),
                Some(account) if account == own => Ok(own.to_string()),
                Some(account) if !require_pin => Ok(account.to_string()),
                Some(account) => Err(ApiError::Forbidden(format!(
                    "Signed in as {}; cannot view {}",
                    own, account
                ))),
            },
            None => Ok(requested.map(str::to_string).unwrap_or_else(default_account)),
        },
        None if require_pin => Err(ApiError::Unauthorized),
        None => Ok(requested.map(str::to_string).unwrap_or_else(default_account)),
    }
}

/// Load the holders behind an account key
pub async fn load_scope(state: &AppState, account: &str) -> ApiResult<Scope> {
    if account == DIRECTOR_ACCOUNT {
        return Ok(Scope::Director(state.store.list_holders().await?));
    }
    state
        .store
        .find_holder(account)
        .await?
        .map(Scope::Holder)
        .ok_or_else(|| lrm_common::Error::holder_not_found(account).into())
}

/// Resolve and load in one step
pub async fn resolve_scope(
    state: &AppState,
    session: &CurrentSession,
    query: &AccountQuery,
) -> ApiResult<Scope> {
    let account = permitted_account(state, session, query.requested())?;
    load_scope(state, &account).await
}
