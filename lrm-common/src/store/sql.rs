//! SQLite store
//!
//! Holders are normalized across `license_holders`, `licenses`,
//! `license_budgets`, `license_costs` and `bio_data`. Money is stored as
//! integer cents and dates as `YYYY-MM-DD` text.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::LicenseStore;
use crate::models::{
    BioData, CompanyCoverage, CostCategory, CostEntry, EstimatedCosts, License, LicenseHolder,
    LicenseStatus, Planning, RecurringCosts,
};
use crate::money::Money;
use crate::time::parse_date;
use crate::Result;

const COMPANY_NAME_KEY: &str = "company_name";

pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_holder(&self, row: &SqliteRow) -> Result<LicenseHolder> {
        let guid: String = row.get("guid");

        let bio: Option<String> =
            sqlx::query_scalar("SELECT document FROM bio_data WHERE holder_guid = ?")
                .bind(&guid)
                .fetch_optional(&self.pool)
                .await?;
        let bio = match bio {
            Some(doc) => Some(serde_json::from_str::<BioData>(&doc)?),
            None => None,
        };

        Ok(LicenseHolder {
            user_id: row.get("employee_id"),
            name: row.get("full_name"),
            role: row.get("role"),
            pin: row.get("pin"),
            total_licenses: to_u32(row.get("total_licenses")),
            total_certificates: to_u32(row.get("total_certificates")),
            next_target_state: row.get("next_target_state"),
            licenses: self.load_licenses(&guid).await?,
            bio,
        })
    }

    async fn load_licenses(&self, holder_guid: &str) -> Result<Vec<License>> {
        let rows = sqlx::query(
            r#"
            SELECT l.*,
                   b.application_fee_cents, b.test_fee_cents, b.trade_book_fee_cents,
                   b.business_law_book_fee_cents, b.activation_fee_cents,
                   b.prep_course_fee_cents, b.travel_cents, b.shipping_cents,
                   b.other_fee_cents
            FROM licenses l
            LEFT JOIN license_budgets b ON b.license_guid = l.guid
            WHERE l.holder_guid = ?
            ORDER BY l.position
            "#,
        )
        .bind(holder_guid)
        .fetch_all(&self.pool)
        .await?;

        let mut licenses = Vec::with_capacity(rows.len());
        for row in &rows {
            let guid: String = row.get("guid");
            let mut license = license_from_row(row);
            license.actual_costs = self.load_costs(&guid).await?;
            licenses.push(license);
        }
        Ok(licenses)
    }

    async fn load_costs(&self, license_guid: &str) -> Result<Vec<CostEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT date, category, amount_cents, vendor, notes, recurring
            FROM license_costs
            WHERE license_guid = ?
            ORDER BY position
            "#,
        )
        .bind(license_guid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let category: String = row.get("category");
                let date: Option<String> = row.get("date");
                CostEntry {
                    date: date.as_deref().and_then(parse_date),
                    category: CostCategory::parse(&category),
                    amount: Money::from_cents(row.get("amount_cents")),
                    vendor: row.get("vendor"),
                    notes: row.get("notes"),
                    recurring: row.get::<i64, _>("recurring") != 0,
                }
            })
            .collect())
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn cents(row: &SqliteRow, column: &str) -> Money {
    Money::from_cents(row.get::<Option<i64>, _>(column).unwrap_or(0))
}

fn license_from_row(row: &SqliteRow) -> License {
    let status: String = row.get("status");
    let est_study_hours: Option<i64> = row.get("est_study_hours");
    let test_duration_hours: Option<f64> = row.get("test_duration_hours");
    let planning = if est_study_hours.is_some() || test_duration_hours.is_some() {
        Some(Planning {
            est_study_hours: est_study_hours.map(to_u32).unwrap_or(0),
            test_duration_hours: test_duration_hours.unwrap_or(0.0),
        })
    } else {
        None
    };
    let date = |column: &str| row.get::<Option<String>, _>(column).as_deref().and_then(parse_date);

    License {
        license_id: row.get("license_id"),
        jurisdiction: row.get("jurisdiction"),
        jurisdiction_abbr: row.get("jurisdiction_abbr"),
        jurisdiction_type: row.get("jurisdiction_type"),
        license_type: row.get("license_type"),
        license_number: row.get("license_number"),
        status: LicenseStatus::parse(&status),
        issued_on: date("issued_on"),
        expires_on: date("expires_on"),
        application_date: date("application_date"),
        board_name: row.get("board_name"),
        board_phone: row.get("board_phone"),
        board_email: row.get("board_email"),
        board_url: row.get("board_url"),
        board_address: row.get("board_address"),
        designated_role: row.get("designated_role"),
        notes: row.get("notes"),
        coverage_level: row.get("coverage_level"),
        recurring: RecurringCosts {
            renewal_period_years: to_u32(row.get("renewal_period_years")),
            renewal_fee: cents(row, "renewal_fee_cents"),
            continuing_ed_fee: cents(row, "continuing_ed_fee_cents"),
        },
        estimated_costs: EstimatedCosts {
            application_fee: cents(row, "application_fee_cents"),
            test_fee: cents(row, "test_fee_cents"),
            trade_book_fee: cents(row, "trade_book_fee_cents"),
            business_law_book_fee: cents(row, "business_law_book_fee_cents"),
            activation_fee: cents(row, "activation_fee_cents"),
            prep_course_fee: cents(row, "prep_course_fee_cents"),
            travel: cents(row, "travel_cents"),
            shipping: cents(row, "shipping_cents"),
            other_fee: cents(row, "other_fee_cents"),
        },
        actual_costs: Vec::new(),
        planning,
        continuing_ed_hours: row
            .get::<Option<i64>, _>("continuing_ed_hours")
            .map(to_u32),
    }
}

async fn insert_license(
    tx: &mut Transaction<'_, Sqlite>,
    holder_guid: &str,
    position: usize,
    license: &License,
) -> Result<()> {
    let guid = Uuid::new_v4().to_string();
    let planning = license.planning.as_ref();

    sqlx::query(
        r#"
        INSERT INTO licenses (
            guid, holder_guid, position, license_id,
            jurisdiction, jurisdiction_abbr, jurisdiction_type,
            license_type, license_number, status,
            issued_on, expires_on, application_date,
            board_name, board_phone, board_email, board_url, board_address,
            designated_role, notes, coverage_level,
            renewal_period_years, renewal_fee_cents, continuing_ed_fee_cents,
            continuing_ed_hours, est_study_hours, test_duration_hours
        )
        VALUES (
            ?, ?, ?, ?,
            ?, ?, ?,
            ?, ?, ?,
            ?, ?, ?,
            ?, ?, ?, ?, ?,
            ?, ?, ?,
            ?, ?, ?,
            ?, ?, ?
        )
        "#,
    )
    .bind(&guid)
    .bind(holder_guid)
    .bind(position as i64)
    .bind(&license.license_id)
    .bind(&license.jurisdiction)
    .bind(&license.jurisdiction_abbr)
    .bind(&license.jurisdiction_type)
    .bind(&license.license_type)
    .bind(&license.license_number)
    .bind(license.status.as_str())
    .bind(date_text(license.issued_on))
    .bind(date_text(license.expires_on))
    .bind(date_text(license.application_date))
    .bind(&license.board_name)
    .bind(&license.board_phone)
    .bind(&license.board_email)
    .bind(&license.board_url)
    .bind(&license.board_address)
    .bind(&license.designated_role)
    .bind(&license.notes)
    .bind(&license.coverage_level)
    .bind(i64::from(license.recurring.renewal_period_years))
    .bind(license.recurring.renewal_fee.cents())
    .bind(license.recurring.continuing_ed_fee.cents())
    .bind(license.continuing_ed_hours.map(i64::from))
    .bind(planning.map(|p| i64::from(p.est_study_hours)))
    .bind(planning.map(|p| p.test_duration_hours))
    .execute(&mut **tx)
    .await?;

    let est = &license.estimated_costs;
    sqlx::query(
        r#"
        INSERT INTO license_budgets (
            license_guid, application_fee_cents, test_fee_cents, trade_book_fee_cents,
            business_law_book_fee_cents, activation_fee_cents, prep_course_fee_cents,
            travel_cents, shipping_cents, other_fee_cents
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(est.application_fee.cents())
    .bind(est.test_fee.cents())
    .bind(est.trade_book_fee.cents())
    .bind(est.business_law_book_fee.cents())
    .bind(est.activation_fee.cents())
    .bind(est.prep_course_fee.cents())
    .bind(est.travel.cents())
    .bind(est.shipping.cents())
    .bind(est.other_fee.cents())
    .execute(&mut **tx)
    .await?;

    for (position, cost) in license.actual_costs.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO license_costs (
                guid, license_guid, position, date, category,
                amount_cents, vendor, notes, recurring
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&guid)
        .bind(position as i64)
        .bind(date_text(cost.date))
        .bind(cost.category.as_str())
        .bind(cost.amount.cents())
        .bind(&cost.vendor)
        .bind(&cost.notes)
        .bind(cost.recurring as i64)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl LicenseStore for SqlStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list_holders(&self) -> Result<Vec<LicenseHolder>> {
        let rows = sqlx::query("SELECT * FROM license_holders ORDER BY employee_id")
            .fetch_all(&self.pool)
            .await?;

        let mut holders = Vec::with_capacity(rows.len());
        for row in &rows {
            holders.push(self.load_holder(row).await?);
        }
        Ok(holders)
    }

    async fn find_holder(&self, account: &str) -> Result<Option<LicenseHolder>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM license_holders
            WHERE employee_id = ? OR pin = ?
            ORDER BY employee_id = ? DESC
            LIMIT 1
            "#,
        )
        .bind(account)
        .bind(account)
        .bind(account)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_holder(&row).await?)),
            None => Ok(None),
        }
    }

    async fn upsert_holder(&self, holder: &LicenseHolder) -> Result<()> {
        super::validate_account(&holder.user_id)?;
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT guid FROM license_holders WHERE employee_id = ?")
                .bind(&holder.user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let guid = match existing {
            Some(guid) => {
                sqlx::query(
                    r#"
                    UPDATE license_holders
                    SET full_name = ?, role = ?, pin = ?, next_target_state = ?,
                        total_licenses = ?, total_certificates = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE guid = ?
                    "#,
                )
                .bind(&holder.name)
                .bind(&holder.role)
                .bind(&holder.pin)
                .bind(&holder.next_target_state)
                .bind(i64::from(holder.total_licenses))
                .bind(i64::from(holder.total_certificates))
                .bind(&guid)
                .execute(&mut *tx)
                .await?;

                // Child rows are replaced wholesale
                sqlx::query(
                    "DELETE FROM license_costs WHERE license_guid IN (SELECT guid FROM licenses WHERE holder_guid = ?)",
                )
                .bind(&guid)
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    "DELETE FROM license_budgets WHERE license_guid IN (SELECT guid FROM licenses WHERE holder_guid = ?)",
                )
                .bind(&guid)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM licenses WHERE holder_guid = ?")
                    .bind(&guid)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM bio_data WHERE holder_guid = ?")
                    .bind(&guid)
                    .execute(&mut *tx)
                    .await?;
                guid
            }
            None => {
                let guid = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"
                    INSERT INTO license_holders (
                        guid, employee_id, full_name, role, pin, next_target_state,
                        total_licenses, total_certificates
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&guid)
                .bind(&holder.user_id)
                .bind(&holder.name)
                .bind(&holder.role)
                .bind(&holder.pin)
                .bind(&holder.next_target_state)
                .bind(i64::from(holder.total_licenses))
                .bind(i64::from(holder.total_certificates))
                .execute(&mut *tx)
                .await?;
                guid
            }
        };

        for (position, license) in holder.licenses.iter().enumerate() {
            insert_license(&mut tx, &guid, position, license).await?;
        }

        if let Some(bio) = &holder.bio {
            sqlx::query("INSERT INTO bio_data (holder_guid, document) VALUES (?, ?)")
                .bind(&guid)
                .bind(serde_json::to_string(bio)?)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(
            "Saved holder {} ({} licenses) to database",
            holder.user_id,
            holder.licenses.len()
        );
        Ok(())
    }

    async fn delete_holder(&self, account: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let guid: Option<String> =
            sqlx::query_scalar("SELECT guid FROM license_holders WHERE employee_id = ?")
                .bind(account)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(guid) = guid else {
            return Ok(false);
        };

        sqlx::query(
            "DELETE FROM license_costs WHERE license_guid IN (SELECT guid FROM licenses WHERE holder_guid = ?)",
        )
        .bind(&guid)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM license_budgets WHERE license_guid IN (SELECT guid FROM licenses WHERE holder_guid = ?)",
        )
        .bind(&guid)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM licenses WHERE holder_guid = ?")
            .bind(&guid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM bio_data WHERE holder_guid = ?")
            .bind(&guid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM license_holders WHERE guid = ?")
            .bind(&guid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn company_coverage(&self) -> Result<Option<CompanyCoverage>> {
        let company_name = crate::db::get_setting(&self.pool, COMPANY_NAME_KEY).await?;
        let rows = sqlx::query("SELECT state_code, status FROM company_coverage ORDER BY state_code")
            .fetch_all(&self.pool)
            .await?;

        if company_name.is_none() && rows.is_empty() {
            return Ok(None);
        }

        let mut coverage = CompanyCoverage {
            company_name: company_name.unwrap_or_default(),
            ..Default::default()
        };
        for row in &rows {
            let code: String = row.get("state_code");
            let status: String = row.get("status");
            match status.as_str() {
                "licensed" => coverage.covered_states.push(code),
                "in_progress" => coverage.in_progress_states.push(code),
                _ => coverage.target_states.push(code),
            }
        }
        Ok(Some(coverage))
    }

    async fn put_company_coverage(&self, coverage: &CompanyCoverage) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(COMPANY_NAME_KEY)
        .bind(&coverage.company_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM company_coverage")
            .execute(&mut *tx)
            .await?;

        let lists = [
            ("target", &coverage.target_states),
            ("in_progress", &coverage.in_progress_states),
            ("licensed", &coverage.covered_states),
        ];
        // Later lists win, so a state in both `target` and `licensed` stays licensed
        for (status, states) in lists {
            for code in states {
                let code = crate::jurisdictions::normalize_code(code);
                sqlx::query(
                    r#"
                    INSERT INTO company_coverage (state_code, state_name, status)
                    VALUES (?, ?, ?)
                    ON CONFLICT(state_code) DO UPDATE SET status = excluded.status,
                        updated_at = CURRENT_TIMESTAMP
                    "#,
                )
                .bind(&code)
                .bind(crate::jurisdictions::display_name(&code))
                .bind(status)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
