mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

async fn open_ticket(app: &TestApp, region: &str, priority: &str) -> String {
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/service-tickets",
            Some(json!({
                "customer_name": "Suresh",
                "region": region,
                "issue": "Inverter shows grid fault",
                "priority": priority
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "Open");
    id_of(&body["data"])
}

#[tokio::test]
async fn resolving_a_ticket_stamps_and_clears_resolved_at() {
    let app = TestApp::new().await;
    let id = open_ticket(&app, "guntur", "High").await;

    for expected in ["Assigned", "In Progress"] {
        let (_, body) = app
            .admin(Method::POST, &format!("/api/v1/service-tickets/{id}/advance"), None)
            .await;
        assert_eq!(body["data"]["status"], expected);
        assert!(body["data"]["resolved_at"].is_null());
    }

    let (status, body) = app
        .admin(Method::POST, &format!("/api/v1/service-tickets/{id}/advance"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Resolved");
    assert!(body["data"]["resolved_at"].is_string());

    let (_, body) = app
        .admin(Method::POST, &format!("/api/v1/service-tickets/{id}/regress"), None)
        .await;
    assert_eq!(body["data"]["status"], "In Progress");
    assert!(body["data"]["resolved_at"].is_null());
}

#[tokio::test]
async fn reopening_a_closed_ticket_keeps_the_resolution_time() {
    let app = TestApp::new().await;
    let id = open_ticket(&app, "guntur", "Medium").await;
    for _ in 0..3 {
        app.admin(Method::POST, &format!("/api/v1/service-tickets/{id}/advance"), None)
            .await;
    }
    let (_, body) = app
        .admin(Method::POST, &format!("/api/v1/service-tickets/{id}/advance"), None)
        .await;
    assert_eq!(body["data"]["status"], "Closed");
    let resolved_at = body["data"]["resolved_at"].clone();
    assert!(resolved_at.is_string());

    let (status, body) = app
        .admin(Method::POST, &format!("/api/v1/service-tickets/{id}/regress"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Resolved");
    assert_eq!(body["data"]["resolved_at"], resolved_at);
}

#[tokio::test]
async fn ticket_summary_counts_open_tickets() {
    let app = TestApp::new().await;
    open_ticket(&app, "guntur", "Low").await;
    open_ticket(&app, "guntur", "Urgent").await;
    let resolved = open_ticket(&app, "nellore", "Urgent").await;
    for _ in 0..3 {
        app.admin(
            Method::POST,
            &format!("/api/v1/service-tickets/{resolved}/advance"),
            None,
        )
        .await;
    }

    let (status, body) = app.admin(Method::GET, "/api/v1/reports/tickets", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["open"], 2);
    assert_eq!(summary["by_priority"]["Urgent"], 2);
    assert_eq!(summary["by_status"]["Resolved"], 1);
}

#[tokio::test]
async fn ticket_list_filters_by_priority() {
    let app = TestApp::new().await;
    open_ticket(&app, "guntur", "Low").await;
    let urgent = open_ticket(&app, "guntur", "Urgent").await;

    let (status, body) = app
        .admin(Method::GET, "/api/v1/service-tickets?priority=Urgent", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], urgent.as_str());
}

#[tokio::test]
async fn delivered_dispatch_is_stamped() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/logistics",
            Some(json!({
                "customer_name": "Suresh",
                "region": "guntur",
                "materials": "10 x 540 Wp modules, 1 x 5 kW inverter",
                "vehicle_number": "AP07TB1234"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "Pending");
    assert!(body["data"]["dispatch_date"].is_null());
    let id = id_of(&body["data"]);

    let (_, body) = app
        .admin(Method::POST, &format!("/api/v1/logistics/{id}/advance"), None)
        .await;
    assert_eq!(body["data"]["status"], "Dispatched");
    assert!(body["data"]["dispatch_date"].is_string());

    app.admin(Method::POST, &format!("/api/v1/logistics/{id}/advance"), None)
        .await;
    let (_, body) = app
        .admin(Method::POST, &format!("/api/v1/logistics/{id}/advance"), None)
        .await;
    assert_eq!(body["data"]["status"], "Delivered");
    assert!(body["data"]["delivered_at"].is_string());

    let (status, _) = app
        .admin(Method::POST, &format!("/api/v1/logistics/{id}/advance"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn project_summary_totals_collections() {
    let app = TestApp::new().await;
    let first = id_of(&app.create_project("guntur", 300_000, 50_000).await);
    app.create_project("nellore", 200_000, 0).await;

    app.admin(
        Method::POST,
        "/api/v1/payments",
        Some(json!({ "project_id": first, "amount": "100000", "payment_mode": "UPI" })),
    )
    .await;

    let (status, body) = app.admin(Method::GET, "/api/v1/reports/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["total_projects"], 2);
    assert_eq!(summary["by_stage"]["Enquiry"], 2);
    assert_eq!(summary["by_region"]["guntur"], 1);
    assert_eq!(dec(&summary["total_proposal_value"]), Decimal::from(500_000));
    assert_eq!(dec(&summary["total_collected"]), Decimal::from(150_000));
    assert_eq!(dec(&summary["total_outstanding"]), Decimal::from(350_000));

    let month = Utc::now().format("%Y-%m").to_string();
    let (status, body) = app
        .admin(Method::GET, "/api/v1/reports/collections", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"][month.as_str()]), Decimal::from(100_000));
}

#[tokio::test]
async fn collections_window_must_be_ordered() {
    let app = TestApp::new().await;
    let (status, _) = app
        .admin(
            Method::GET,
            "/api/v1/reports/collections?from=2025-06-01T00:00:00Z&to=2025-01-01T00:00:00Z",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_valuation_groups_by_category() {
    let app = TestApp::new().await;
    app.create_stock_item("MOD-A", "Module", 10).await;
    app.create_stock_item("INV-A", "Inverter", 1).await;

    let (status, body) = app.admin(Method::GET, "/api/v1/reports/stock", None).await;
    assert_eq!(status, StatusCode::OK);
    let valuation = &body["data"];
    assert_eq!(dec(&valuation["by_category"]["Module"]["value"]), Decimal::from(10_000));
    assert_eq!(valuation["by_category"]["Inverter"]["quantity"], 1);
    assert_eq!(dec(&valuation["total_value"]), Decimal::from(11_000));
    assert_eq!(valuation["low_stock_count"], 1);
}

#[tokio::test]
async fn estimate_adds_margin_to_component_costs() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/estimations",
            Some(json!({
                "customer_name": "Padma",
                "region": "guntur",
                "capacity_kw": "5",
                "module_cost": "150000",
                "inverter_cost": "46000",
                "structure_cost": "32000",
                "cabling_cost": "12000",
                "installation_cost": "40000",
                "margin_percent": "10"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let estimate = &body["data"];
    assert_eq!(dec(&estimate["subtotal"]), Decimal::from(280_000));
    assert_eq!(dec(&estimate["total_cost"]), Decimal::from(308_000));
    assert_eq!(dec(&estimate["cost_per_kw"]), Decimal::from(61_600));
}
