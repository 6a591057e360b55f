//! Database initialization
//!
//! Creates the licensing tables on first run and brings older databases up
//! to date. Every statement is idempotent, so opening an existing database
//! runs the same path as creating a new one.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas are per connection, so they go on the connect options.
    // WAL lets page loads read while a form post writes.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection: each SQLite memory connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = "sqlite::memory:"
        .parse::<SqliteConnectOptions>()?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables, then run migrations for databases from older schemas
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_license_holders_table(pool).await?;
    create_licenses_table(pool).await?;
    create_license_budgets_table(pool).await?;
    create_license_costs_table(pool).await?;
    create_company_coverage_table(pool).await?;
    create_bio_data_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores company-level key-value pairs (company name and similar).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_license_holders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS license_holders (
            guid TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            role TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            next_target_state TEXT,
            pin TEXT UNIQUE,
            total_licenses INTEGER NOT NULL DEFAULT 0,
            total_certificates INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_licenses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS licenses (
            guid TEXT PRIMARY KEY,
            holder_guid TEXT NOT NULL REFERENCES license_holders(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            license_id TEXT NOT NULL,
            jurisdiction TEXT NOT NULL,
            jurisdiction_abbr TEXT NOT NULL,
            jurisdiction_type TEXT NOT NULL DEFAULT 'state',
            license_type TEXT NOT NULL DEFAULT '',
            license_number TEXT,
            status TEXT NOT NULL DEFAULT 'not_licensed'
                CHECK (status IN ('licensed', 'in_progress', 'not_licensed')),
            issued_on TEXT,
            expires_on TEXT,
            application_date TEXT,
            board_name TEXT,
            board_phone TEXT,
            board_email TEXT,
            board_url TEXT,
            board_address TEXT,
            designated_role TEXT,
            notes TEXT,
            coverage_level TEXT,
            renewal_period_years INTEGER NOT NULL DEFAULT 2,
            renewal_fee_cents INTEGER NOT NULL DEFAULT 0,
            continuing_ed_fee_cents INTEGER NOT NULL DEFAULT 0,
            continuing_ed_hours INTEGER,
            est_study_hours INTEGER,
            test_duration_hours REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (holder_guid, license_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_licenses_expires_on ON licenses(expires_on)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_license_budgets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS license_budgets (
            license_guid TEXT PRIMARY KEY REFERENCES licenses(guid) ON DELETE CASCADE,
            application_fee_cents INTEGER NOT NULL DEFAULT 0,
            test_fee_cents INTEGER NOT NULL DEFAULT 0,
            trade_book_fee_cents INTEGER NOT NULL DEFAULT 0,
            business_law_book_fee_cents INTEGER NOT NULL DEFAULT 0,
            activation_fee_cents INTEGER NOT NULL DEFAULT 0,
            prep_course_fee_cents INTEGER NOT NULL DEFAULT 0,
            travel_cents INTEGER NOT NULL DEFAULT 0,
            shipping_cents INTEGER NOT NULL DEFAULT 0,
            other_fee_cents INTEGER NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_license_costs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS license_costs (
            guid TEXT PRIMARY KEY,
            license_guid TEXT NOT NULL REFERENCES licenses(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            date TEXT,
            category TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            vendor TEXT,
            notes TEXT,
            recurring INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_company_coverage_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS company_coverage (
            state_code TEXT PRIMARY KEY,
            state_name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'target'
                CHECK (status IN ('licensed', 'in_progress', 'target')),
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bio_data_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bio_data (
            holder_guid TEXT PRIMARY KEY REFERENCES license_holders(guid) ON DELETE CASCADE,
            document TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Read a setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.flatten())
}

/// Insert or replace a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
