//! Both storage backends must persist the same holder shape

use lrm_common::db::init_memory_database;
use lrm_common::models::{
    BioData, CompanyCoverage, CostCategory, CostEntry, License, LicenseHolder, LicenseStatus,
    Planning,
};
use lrm_common::store::{JsonStore, LicenseStore, SqlStore};
use lrm_common::time::parse_date;
use lrm_common::Money;
use serde_json::json;
use tempfile::TempDir;

fn sample_holder() -> LicenseHolder {
    let mut holder = LicenseHolder::new("jdoe", "Jane Doe");
    holder.role = Some("Master Plumber".into());
    holder.pin = Some("4321".into());
    holder.total_certificates = 3;
    holder.next_target_state = Some("NM".into());

    let mut tx = License::new("tx-master", "TX", "Master Plumber");
    tx.status = LicenseStatus::Licensed;
    tx.license_number = Some("M-1001".into());
    tx.issued_on = parse_date("2024-01-15");
    tx.expires_on = parse_date("2026-01-15");
    tx.board_name = Some("Texas State Board of Plumbing Examiners".into());
    tx.notes = Some("Renew online".into());
    tx.recurring.renewal_period_years = 1;
    tx.recurring.renewal_fee = Money::from_cents(15_050);
    tx.estimated_costs.application_fee = Money::from_dollars(200);
    tx.estimated_costs.travel = Money::from_dollars(80);
    tx.planning = Some(Planning {
        est_study_hours: 60,
        test_duration_hours: 3.5,
    });
    tx.continuing_ed_hours = Some(6);
    tx.actual_costs = vec![
        CostEntry {
            date: parse_date("2024-01-02"),
            category: CostCategory::ApplicationFee,
            amount: Money::from_dollars(200),
            vendor: Some("TSBPE".into()),
            notes: None,
            recurring: false,
        },
        CostEntry {
            date: None,
            category: CostCategory::RenewalFee,
            amount: Money::from_cents(15_050),
            vendor: None,
            notes: Some("2025 renewal".into()),
            recurring: true,
        },
    ];

    let az = License::new("az-journeyman", "AZ", "Journeyman");

    holder.licenses = vec![tx, az];
    holder.total_licenses = 2;
    holder.bio = Some(BioData {
        personal_info: Some(json!({"phone": "555-0100"})),
        ..Default::default()
    });
    holder
}

async fn exercise_store(store: &dyn LicenseStore) {
    assert!(store.list_holders().await.unwrap().is_empty());
    assert!(store.find_holder("jdoe").await.unwrap().is_none());

    let holder = sample_holder();
    store.upsert_holder(&holder).await.unwrap();

    let loaded = store.find_holder("jdoe").await.unwrap().unwrap();
    assert_eq!(loaded, holder);

    // PIN lookup
    let by_pin = store.find_holder("4321").await.unwrap().unwrap();
    assert_eq!(by_pin.user_id, "jdoe");

    // Replace: drop a license and a cost
    let mut edited = holder.clone();
    edited.licenses.pop();
    edited.licenses[0].actual_costs.pop();
    edited.total_licenses = 1;
    store.upsert_holder(&edited).await.unwrap();
    let reloaded = store.find_holder("jdoe").await.unwrap().unwrap();
    assert_eq!(reloaded, edited);

    let mut second = LicenseHolder::new("asmith", "Al Smith");
    second.licenses.push(License::new("nm-1", "NM", "Journeyman"));
    store.upsert_holder(&second).await.unwrap();
    let ids: Vec<String> = store
        .list_holders()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.user_id)
        .collect();
    assert_eq!(ids, vec!["asmith", "jdoe"]);

    assert!(store.delete_holder("asmith").await.unwrap());
    assert!(!store.delete_holder("asmith").await.unwrap());
    assert_eq!(store.list_holders().await.unwrap().len(), 1);

    assert!(store.company_coverage().await.unwrap().is_none());
    let coverage = CompanyCoverage {
        company_name: "Acme Plumbing".into(),
        covered_states: vec!["TX".into()],
        in_progress_states: vec!["AZ".into()],
        target_states: vec!["CO".into(), "NM".into()],
    };
    store.put_company_coverage(&coverage).await.unwrap();
    assert_eq!(store.company_coverage().await.unwrap().unwrap(), coverage);
}

#[tokio::test]
async fn test_json_store() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    exercise_store(&store).await;

    let file = dir.path().join("license_holders").join("jdoe.json");
    let text = std::fs::read_to_string(file).unwrap();
    assert!(text.contains("\n  \"user_id\": \"jdoe\""), "documents are pretty-printed");
}

#[tokio::test]
async fn test_sql_store() {
    let pool = init_memory_database().await.unwrap();
    let store = SqlStore::new(pool);
    exercise_store(&store).await;
}

#[tokio::test]
async fn test_json_store_skips_director_and_bad_files() {
    let dir = TempDir::new().unwrap();
    let holders = dir.path().join("license_holders");
    std::fs::create_dir_all(&holders).unwrap();
    std::fs::write(holders.join("director.json"), r#"{"user_id":"director","name":"x"}"#).unwrap();
    std::fs::write(holders.join("broken.json"), "{not json").unwrap();
    std::fs::write(holders.join("notes.txt"), "ignore me").unwrap();
    std::fs::write(holders.join("ok.json"), r#"{"user_id":"ok","name":"Okay"}"#).unwrap();

    let store = JsonStore::new(dir.path());
    let listed = store.list_holders().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_id, "ok");
}

#[tokio::test]
async fn test_json_store_rejects_path_accounts() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());
    assert!(store.find_holder("../secrets").await.is_err());
    assert!(store.upsert_holder(&LicenseHolder::new("a/b", "x")).await.is_err());
}

#[tokio::test]
async fn test_json_store_keys_holder_by_file_name() {
    let dir = TempDir::new().unwrap();
    let holders = dir.path().join("license_holders");
    std::fs::create_dir_all(&holders).unwrap();
    std::fs::write(
        holders.join("legacy.json"),
        r#"{"user_id":"EMP-0042","name":"Lee Gacy","pin":"7777"}"#,
    )
    .unwrap();

    let store = JsonStore::new(dir.path());
    let mut holder = store.find_holder("legacy").await.unwrap().unwrap();
    assert_eq!(holder.user_id, "legacy");
    assert_eq!(store.find_holder("7777").await.unwrap().unwrap().user_id, "legacy");

    holder.licenses.push(License::new("tx-1", "TX", "Journeyman"));
    holder.total_licenses = 1;
    store.upsert_holder(&holder).await.unwrap();

    let files: Vec<String> = std::fs::read_dir(&holders)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["legacy.json"]);

    let listed = store.list_holders().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_id, "legacy");
    assert_eq!(listed[0].total_licenses, 1);
}
