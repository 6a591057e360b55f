//! # Licensing Roadmap Common Library
//!
//! Shared code for the licensing dashboard:
//! - License holder records and money amounts
//! - Expiration status derivation and cost roll-ups
//! - Storage accessors (JSON directory or SQLite)
//! - Reference content (state catalog, write-ups, training roadmaps)
//! - Configuration loading

pub mod config;
pub mod content;
pub mod costs;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod jurisdictions;
pub mod ledger;
pub mod models;
pub mod money;
pub mod rollup;
pub mod status;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use money::Money;
