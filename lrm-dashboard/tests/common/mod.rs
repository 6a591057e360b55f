//! Shared fixtures for router tests
//!
//! Two holders in a JSON store under a temp dir, a small state catalog, and
//! a fixed "today" of 2026-01-01.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::NaiveDate;
use lrm_common::config::TomlConfig;
use lrm_common::content::ContentLibrary;
use lrm_common::models::{CostCategory, CostEntry, License, LicenseHolder, LicenseStatus};
use lrm_common::money::Money;
use lrm_common::store::{JsonStore, LicenseStore};
use lrm_dashboard::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

pub fn day(s: &str) -> NaiveDate {
    lrm_common::time::parse_date(s).unwrap()
}

pub struct TestApp {
    pub _dir: TempDir,
    pub store: Arc<dyn LicenseStore>,
    pub router: Router,
}

fn jane() -> LicenseHolder {
    let mut holder = LicenseHolder::new("jdoe", "Jane Doe");
    holder.role = Some("Master Plumber".to_string());
    holder.pin = Some("1111".to_string());

    let mut tx = License::new("tx-jdoe", "TX", "Master Plumber");
    tx.status = LicenseStatus::Licensed;
    tx.issued_on = Some(day("2024-01-20"));
    tx.expires_on = Some(day("2026-01-20"));
    tx.board_name = Some("Texas State Board of Plumbing Examiners".to_string());
    tx.estimated_costs.application_fee = Money::from_dollars(150);
    tx.actual_costs = vec![
        CostEntry {
            date: Some(day("2025-06-01")),
            category: CostCategory::ApplicationFee,
            amount: Money::from_dollars(100),
            vendor: Some("TSBPE".to_string()),
            notes: None,
            recurring: false,
        },
        CostEntry {
            date: Some(day("2025-03-01")),
            category: CostCategory::Travel,
            amount: Money::from_dollars(40),
            vendor: None,
            notes: Some("Austin, exam day".to_string()),
            recurring: false,
        },
    ];

    let mut az = License::new("az-jdoe", "AZ", "Journeyman Plumber");
    az.status = LicenseStatus::InProgress;

    holder.licenses = vec![tx, az];
    holder.total_licenses = 2;
    holder
}

fn rob() -> LicenseHolder {
    let mut holder = LicenseHolder::new("rsmith", "Rob Smith");
    holder.pin = Some("2222".to_string());

    let mut nm = License::new("nm-rsmith", "NM", "Master Plumber");
    nm.status = LicenseStatus::Licensed;
    nm.expires_on = Some(day("2025-12-01"));

    holder.licenses = vec![nm];
    holder.total_licenses = 1;
    holder
}

const CATALOG: &str = r#"{
    "states": {
        "TX": {"name": "Texas", "status": "licensed", "expires_on": "2026-01-20", "last_reviewed": "2025-10-01", "coverage_level": "full"},
        "NM": {"name": "New Mexico", "status": "licensed", "expires_on": "2025-12-01", "last_reviewed": "2025-02-01"},
        "co": {"name": "Colorado", "status": "not_licensed"}
    }
}"#;

pub async fn test_app(config: TomlConfig) -> TestApp {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("licensing_roadmap.json"), CATALOG).unwrap();
    std::fs::create_dir_all(dir.path().join("states")).unwrap();
    std::fs::write(
        dir.path().join("states").join("tx.md"),
        "## Requirements\n\n| Item | Fee |\n|---|---|\n| Exam | $100 |\n",
    )
    .unwrap();

    let json_store = JsonStore::new(dir.path());
    json_store.upsert_holder(&jane()).await.unwrap();
    json_store.upsert_holder(&rob()).await.unwrap();
    let store: Arc<dyn LicenseStore> = Arc::new(json_store);

    let state = AppState::new(store.clone(), ContentLibrary::new(dir.path()), config)
        .with_today(day("2026-01-01"));
    TestApp {
        _dir: dir,
        store,
        router: build_router(state),
    }
}

pub async fn default_app() -> TestApp {
    test_app(TomlConfig::default()).await
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

pub async fn body_json(body: Body) -> Value {
    serde_json::from_str(&body_text(body).await).expect("Should parse JSON")
}
