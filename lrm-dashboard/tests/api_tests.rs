//! Router tests with PIN login off
//!
//! Tests cover:
//! - Health, build info and static assets
//! - HTML pages for a holder and for the director aggregate
//! - Form posts that edit licenses and costs
//! - JSON endpoints and CSV exports

mod common;

use axum::http::{header, StatusCode};
use common::{body_json, body_text, day, default_app, get, post_form, post_json};
use lrm_common::models::{CostCategory, LicenseStatus};
use lrm_common::money::Money;
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot` method

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_health_reports_module_and_backend() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lrm-dashboard");
    assert_eq!(body["storage"], "json");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_buildinfo_and_static_assets() {
    let app = default_app().await;
    let response = app.router.clone().oneshot(get("/api/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert!(body["git_hash"].is_string());

    let response = app.router.clone().oneshot(get("/static/dashboard.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

    let response = app.router.oneshot(get("/static/dashboard.js")).await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
}

#[tokio::test]
async fn test_unknown_route_is_html_404() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/no/such/page")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("Page Not Found"));
    assert!(html.contains("/no/such/page"));
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_director_home_aggregates_all_holders() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response.into_body()).await;
    assert!(html.contains("Director View"));
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("Rob Smith"));
    assert!(html.contains("OVERDUE"));
    assert!(html.contains("Expires in 19 days"));
}

#[tokio::test]
async fn test_holder_home_shows_only_own_licenses() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/?account=jdoe")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response.into_body()).await;
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("Expires in 19 days"));
    assert!(html.contains("Application Pending"));
    assert!(!html.contains("New Mexico"));
    assert!(!html.contains("OVERDUE"));
}

#[tokio::test]
async fn test_holder_found_by_pin() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/?account=2222")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("Rob Smith"));
}

#[tokio::test]
async fn test_unknown_holder_is_404_page() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/?account=nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("License holder not found: nobody"));
}

#[tokio::test]
async fn test_roadmap_embeds_state_data() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(get("/licensing-roadmap?account=jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response.into_body()).await;
    assert!(html.contains(r#"id="states-data""#));
    assert!(html.contains(r#""status_class":"due-soon""#));
    assert!(html.contains(r#"data-state="TX""#));
}

#[tokio::test]
async fn test_state_detail_renders_markdown_and_holders() {
    let app = default_app().await;
    let response = app.router.clone().oneshot(get("/licensing/tx")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("<table>"));
    assert!(html.contains("Jane Doe"));

    let response = app.router.clone().oneshot(get("/licensing/CO")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.oneshot(get("/licensing/ZZ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_states_sorted_by_review_date() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/admin/licensing/states")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response.into_body()).await;
    let colorado = html.find("Colorado").unwrap();
    let new_mexico = html.find("New Mexico").unwrap();
    let texas = html.find("Texas").unwrap();
    assert!(colorado < new_mexico && new_mexico < texas);
}

#[tokio::test]
async fn test_license_pages_render() {
    let app = default_app().await;
    for uri in [
        "/settings",
        "/manage-licenses",
        "/manage-licenses?account=jdoe",
        "/settings/edit-license/tx-jdoe?account=jdoe",
        "/settings/edit-license/nm-rsmith",
        "/settings/add-license?account=jdoe",
        "/settings/add-license",
        "/settings/cost-details/tx-jdoe?account=jdoe",
        "/cost-analytics",
        "/cost-analytics?account=jdoe",
    ] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }

    let response = app
        .router
        .oneshot(get("/settings/edit-license/nope?account=jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cost_details_lists_costs_in_date_order() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(get("/settings/cost-details/tx-jdoe?account=jdoe"))
        .await
        .unwrap();
    let html = body_text(response.into_body()).await;
    let travel = html.find("Austin, exam day").unwrap();
    let application = html.find("TSBPE").unwrap();
    assert!(travel < application);
    assert!(html.contains("/settings/delete-cost/tx-jdoe/0"));
    assert!(html.contains("/settings/delete-cost/tx-jdoe/1"));
}

// =============================================================================
// Form posts
// =============================================================================

#[tokio::test]
async fn test_add_license_form() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/settings/add-license",
            "account=jdoe&jurisdiction_abbr=co&license_type=Master+Plumber&status=in_progress&renewal_period_years=3&renewal_fee=%24200",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/manage-licenses?account=jdoe");

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    assert_eq!(holder.total_licenses, 3);
    let co = holder.license_for_state("CO").unwrap();
    assert!(co.license_id.starts_with("co-"));
    assert_eq!(co.jurisdiction, "Colorado");
    assert_eq!(co.status, LicenseStatus::InProgress);
    assert_eq!(co.coverage_level.as_deref(), Some("draft"));
    assert_eq!(co.recurring.renewal_period_years, 3);
    assert_eq!(co.recurring.renewal_fee, Money::from_dollars(200));
}

#[tokio::test]
async fn test_add_license_rejections() {
    let app = default_app().await;

    let duplicate = app
        .router
        .clone()
        .oneshot(post_form(
            "/settings/add-license",
            "account=jdoe&jurisdiction_abbr=TX&license_type=Journeyman",
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let unknown_state = app
        .router
        .clone()
        .oneshot(post_form(
            "/settings/add-license",
            "account=jdoe&jurisdiction_abbr=ZZ&license_type=Journeyman",
        ))
        .await
        .unwrap();
    assert_eq!(unknown_state.status(), StatusCode::BAD_REQUEST);

    let director = app
        .router
        .oneshot(post_form(
            "/settings/add-license",
            "account=director&jurisdiction_abbr=CO&license_type=Journeyman",
        ))
        .await
        .unwrap();
    assert_eq!(director.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_license_form() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/settings/update-license/tx-jdoe",
            "account=jdoe&license_type=Master+Plumber&license_number=M-123&status=licensed&expires_on=2028-01-20&renewal_period_years=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    let tx = holder.license("tx-jdoe").unwrap();
    assert_eq!(tx.license_number.as_deref(), Some("M-123"));
    assert_eq!(tx.expires_on, Some(day("2028-01-20")));
    assert_eq!(tx.recurring.renewal_period_years, 2);
    assert_eq!(tx.actual_costs.len(), 2);
}

#[tokio::test]
async fn test_update_license_rejects_bad_date() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/settings/update-license/tx-jdoe",
            "account=jdoe&license_type=Master&expires_on=someday",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_and_delete_cost_forms() {
    let app = default_app().await;
    let response = app
        .router
        .clone()
        .oneshot(post_form(
            "/settings/add-cost/tx-jdoe",
            "account=jdoe&category=renewal_fee&amount=75.25&vendor=TSBPE",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/cost-details/tx-jdoe?account=jdoe");

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    let costs = &holder.license("tx-jdoe").unwrap().actual_costs;
    assert_eq!(costs.len(), 3);
    let added = costs.last().unwrap();
    assert_eq!(added.date, Some(day("2026-01-01")));
    assert_eq!(added.amount, Money::from_cents(7525));
    assert!(added.recurring);

    // Index 0 in date order is the March travel entry
    let response = app
        .router
        .clone()
        .oneshot(post_form("/settings/delete-cost/tx-jdoe/0", "account=jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    let costs = &holder.license("tx-jdoe").unwrap().actual_costs;
    assert_eq!(costs.len(), 2);
    assert!(costs.iter().all(|c| c.category != CostCategory::Travel));

    let response = app
        .router
        .oneshot(post_form("/settings/delete-cost/tx-jdoe/9", "account=jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_cost_requires_amount() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/settings/add-cost/tx-jdoe",
            "account=jdoe&category=test_fee&amount=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_estimated_costs_form() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(post_form(
            "/settings/update-estimated-costs/tx-jdoe",
            "account=jdoe&application_fee=200&travel_fee=50&est_study_hours=40",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    let tx = holder.license("tx-jdoe").unwrap();
    assert_eq!(tx.estimated_costs.total(), Money::from_dollars(250));
    assert_eq!(tx.planning.as_ref().unwrap().est_study_hours, 40);
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn test_api_states_derives_status() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/api/states")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["TX"]["status_class"], "due-soon");
    assert_eq!(body["TX"]["days_remaining"], 19);
    assert_eq!(body["NM"]["status_class"], "overdue");
    assert_eq!(body["CO"]["badge_text"], "Not Licensed");
}

#[tokio::test]
async fn test_leadership_data() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/api/leadership-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["total_holders"], 2);
    assert_eq!(body["states_covered"], 2);
    assert_eq!(body["states_in_progress"], 1);
    assert_eq!(body["expiring_soon"][0]["state_abbr"], "NM");
    assert_eq!(
        body["coverage_gaps"],
        json!(["CA", "FL", "NY", "IL", "PA", "OH", "GA", "NC", "MI"])
    );
}

#[tokio::test]
async fn test_company_coverage_derived_from_roster() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/api/company-coverage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["covered_states"], json!(["NM", "TX"]));
    assert_eq!(body["in_progress_states"], json!(["AZ"]));
    assert_eq!(body["total_states_covered"], 2);
    assert_eq!(body["company_name"], "Licensing Roadmap");
}

#[tokio::test]
async fn test_save_license_api_upserts_by_state() {
    let app = default_app().await;
    let request = post_json(
        "/api/save-license",
        json!({
            "account": "rsmith",
            "state_abbr": "ok",
            "license_data": {
                "license_id": "",
                "jurisdiction": "",
                "jurisdiction_abbr": "",
                "license_type": "Journeyman Plumber",
                "status": "in_progress"
            }
        }),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert!(body["license_id"].as_str().unwrap().starts_with("ok-"));

    let holder = app.store.find_holder("rsmith").await.unwrap().unwrap();
    assert_eq!(holder.total_licenses, 2);
    assert_eq!(holder.license_for_state("OK").unwrap().jurisdiction, "Oklahoma");

    let missing = post_json(
        "/api/save-license",
        json!({
            "account": "nobody",
            "state_abbr": "OK",
            "license_data": {"license_id": "", "jurisdiction": "", "jurisdiction_abbr": ""}
        }),
    );
    let response = app.router.oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_save_license_api_fills_missing_identity() {
    let app = default_app().await;
    let request = post_json(
        "/api/save-license",
        json!({
            "account": "rsmith",
            "state_abbr": "OK",
            "license_data": {
                "license_type": "Journeyman Plumber",
                "status": "in_progress"
            }
        }),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    let license_id = body["license_id"].as_str().unwrap().to_string();
    assert!(license_id.starts_with("ok-"));

    let holder = app.store.find_holder("rsmith").await.unwrap().unwrap();
    let saved = holder.license_for_state("OK").unwrap();
    assert_eq!(saved.license_id, license_id);
    assert_eq!(saved.jurisdiction, "Oklahoma");
    assert_eq!(saved.jurisdiction_abbr, "OK");
    assert_eq!(saved.status, LicenseStatus::InProgress);

    // Saving the same state again keeps the existing id
    let request = post_json(
        "/api/save-license",
        json!({
            "account": "rsmith",
            "state_abbr": "ok",
            "license_data": {"license_type": "Master Plumber", "status": "licensed"}
        }),
    );
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let holder = app.store.find_holder("rsmith").await.unwrap().unwrap();
    assert_eq!(holder.total_licenses, 2);
    let saved = holder.license_for_state("OK").unwrap();
    assert_eq!(saved.license_id, license_id);
    assert_eq!(saved.license_type, "Master Plumber");
}

#[tokio::test]
async fn test_save_license_api_rejects_malformed_body_as_json_error() {
    let app = default_app().await;
    let request = post_json(
        "/api/save-license",
        json!({"account": "rsmith", "license_data": {}}),
    );
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("state_abbr"));
}

#[tokio::test]
async fn test_delete_license_api() {
    let app = default_app().await;
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/delete-license",
            json!({"account": "jdoe", "state_abbr": "AZ"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let holder = app.store.find_holder("jdoe").await.unwrap().unwrap();
    assert_eq!(holder.total_licenses, 1);
    assert!(holder.license_for_state("AZ").is_none());

    let response = app
        .router
        .oneshot(post_json("/api/delete-license", json!({"account": "jdoe"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// CSV export
// =============================================================================

#[tokio::test]
async fn test_licenses_csv() {
    let app = default_app().await;
    let response = app
        .router
        .oneshot(get("/export/licenses.csv?account=jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"licenses-jdoe.csv\""
    );

    let csv = body_text(response.into_body()).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("holder,user_id,license_id"));
    assert!(lines[1].starts_with("Jane Doe,jdoe,tx-jdoe,Texas,TX"));
    assert!(lines[1].contains("due-soon,2024-01-20,2026-01-20,19"));
}

#[tokio::test]
async fn test_costs_csv_quotes_and_orders_by_date() {
    let app = default_app().await;
    let response = app.router.oneshot(get("/export/costs.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let csv = body_text(response.into_body()).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("2025-03-01,travel,40.00,,\"Austin, exam day\",false"));
    assert!(lines[2].contains("2025-06-01,application_fee,100.00,TSBPE,,false"));
}
