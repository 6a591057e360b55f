//! Database schema migrations
//!
//! Versioned, idempotent upgrades for databases created by older releases.
//! Fresh databases already have the current columns, so each migration
//! checks before altering anything.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - they must stay stable for users upgrading
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Use ALTER TABLE** - prefer it over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Migration v1: edit-form fields on licenses
///
/// Early databases stored only board and fee columns; the edit form also
/// writes `application_date`, `notes` and `coverage_level`.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    for column in ["application_date", "notes", "coverage_level"] {
        if !has_column(pool, "licenses", column).await? {
            sqlx::query(&format!("ALTER TABLE licenses ADD COLUMN {} TEXT", column))
                .execute(pool)
                .await?;
            info!("  ✓ Added {} column to licenses table", column);
        }
    }
    Ok(())
}

/// Migration v2: study planning and other-fee budget line
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if !has_column(pool, "licenses", "est_study_hours").await? {
        sqlx::query("ALTER TABLE licenses ADD COLUMN est_study_hours INTEGER")
            .execute(pool)
            .await?;
        info!("  ✓ Added est_study_hours column to licenses table");
    }
    if !has_column(pool, "licenses", "test_duration_hours").await? {
        sqlx::query("ALTER TABLE licenses ADD COLUMN test_duration_hours REAL")
            .execute(pool)
            .await?;
        info!("  ✓ Added test_duration_hours column to licenses table");
    }
    if !has_column(pool, "license_budgets", "other_fee_cents").await? {
        sqlx::query(
            "ALTER TABLE license_budgets ADD COLUMN other_fee_cents INTEGER NOT NULL DEFAULT 0",
        )
        .execute(pool)
        .await?;
        info!("  ✓ Added other_fee_cents column to license_budgets table");
    }
    Ok(())
}
