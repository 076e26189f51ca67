mod common;

use axum::http::{Method, StatusCode};
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

async fn quantity_of(app: &TestApp, item_id: &str) -> i64 {
    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/stock/{item_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["quantity"].as_i64().unwrap_or(-1)
}

async fn request_procurement(app: &TestApp, item_id: &str, quantity: i32) -> String {
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/procurements",
            Some(json!({
                "vendor": "Growatt India",
                "item_name": "5 kW string inverter",
                "stock_item_id": item_id,
                "quantity": quantity,
                "unit_price": "42000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    id_of(&body["data"])
}

async fn advance_procurement(app: &TestApp, id: &str, steps: usize) {
    for _ in 0..steps {
        let (status, body) = app
            .admin(Method::POST, &format!("/api/v1/procurements/{id}/advance"), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

#[tokio::test]
async fn received_procurement_books_quantity_into_stock() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("MOD-540", "Module", 10).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/procurements",
            Some(json!({
                "vendor": "Waaree Energies",
                "item_name": "540 Wp module",
                "stock_item_id": item_id,
                "quantity": 40,
                "unit_price": "13500"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "Requested");
    let procurement_id = id_of(&body["data"]);

    for expected in ["Approved", "Ordered"] {
        let (status, body) = app
            .admin(
                Method::POST,
                &format!("/api/v1/procurements/{procurement_id}/advance"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], expected);
        assert_eq!(quantity_of(&app, &item_id).await, 10);
    }

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/procurements/{procurement_id}/advance"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Received");
    assert!(body["data"]["received_at"].is_string());
    assert_eq!(quantity_of(&app, &item_id).await, 50);

    // Already at the last status
    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/v1/procurements/{procurement_id}/advance"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/v1/procurements/{procurement_id}/regress"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(quantity_of(&app, &item_id).await, 50);
}

#[tokio::test]
async fn assignment_draws_down_stock_and_delete_restores_it() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("INV-5K", "Inverter", 5).await);
    let project_id = id_of(&app.create_project("nellore", 250_000, 0).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/assignments",
            Some(json!({
                "project_id": project_id,
                "stock_item_id": item_id,
                "quantity": 2,
                "serial_numbers": "GRW-001,GRW-002"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["region"], "nellore");
    assert_eq!(body["data"]["customer_name"], "Customer in nellore");
    let assignment_id = id_of(&body["data"]);
    assert_eq!(quantity_of(&app, &item_id).await, 3);

    let (status, body) = app
        .admin(
            Method::GET,
            &format!("/api/v1/projects/{project_id}/assignments"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = app
        .admin(
            Method::DELETE,
            &format!("/api/v1/assignments/{assignment_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(quantity_of(&app, &item_id).await, 5);
}

#[tokio::test]
async fn assignment_beyond_stock_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("MOD-550", "Module", 4).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/assignments",
            Some(json!({
                "customer_name": "Walk-in customer",
                "region": "Guntur",
                "stock_item_id": item_id,
                "quantity": 5
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(quantity_of(&app, &item_id).await, 4);

    let (_, body) = app.admin(Method::GET, "/api/v1/assignments", None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn only_modules_and_inverters_are_assigned() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("CAB-4SQ", "Cable", 500).await);

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/assignments",
            Some(json!({
                "customer_name": "Walk-in customer",
                "region": "guntur",
                "stock_item_id": item_id,
                "quantity": 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(quantity_of(&app, &item_id).await, 500);
}

#[tokio::test]
async fn manual_adjustment_cannot_go_negative() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("ACC-MC4", "Accessory", 3).await);

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/stock/{item_id}/adjust"),
            Some(json!({ "delta": 7, "reason": "cycle count" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 10);

    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/v1/stock/{item_id}/adjust"),
            Some(json!({ "delta": -11, "reason": "damaged" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(quantity_of(&app, &item_id).await, 10);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestApp::new().await;
    app.create_stock_item("STR-1KW", "Structure", 1).await;

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/stock",
            Some(json!({
                "sku": "STR-1KW",
                "name": "Duplicate",
                "category": "Structure",
                "unit_cost": "10"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn low_stock_lists_items_at_or_below_reorder_level() {
    let app = TestApp::new().await;
    let low = id_of(&app.create_stock_item("MOD-LOW", "Module", 2).await);
    app.create_stock_item("MOD-OK", "Module", 50).await;

    let (status, body) = app.admin(Method::GET, "/api/v1/stock/low", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], low.as_str());

    let (_, body) = app
        .admin(Method::GET, "/api/v1/stock?low_only=true", None)
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn procurement_is_editable_only_while_requested() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("INV-5K", "Inverter", 0).await);
    let id = request_procurement(&app, &item_id, 2).await;

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/procurements/{id}"),
            Some(json!({ "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(dec(&body["data"]["total_amount"]), Decimal::from(126_000));

    advance_procurement(&app, &id, 1).await;
    let (status, _) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/procurements/{id}"),
            Some(json!({ "quantity": 30 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/procurements/{id}"), None)
        .await;
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(body["data"]["status"], "Approved");
}

#[tokio::test]
async fn received_procurement_cannot_be_deleted() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("INV-5K", "Inverter", 1).await);

    let pending = request_procurement(&app, &item_id, 1).await;
    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/procurements/{pending}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let received = request_procurement(&app, &item_id, 4).await;
    advance_procurement(&app, &received, 3).await;
    assert_eq!(quantity_of(&app, &item_id).await, 5);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/procurements/{received}"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/procurements/{received}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Received");
    assert_eq!(quantity_of(&app, &item_id).await, 5);
}

#[tokio::test]
async fn concurrent_receipts_book_stock_once() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("MOD-540", "Module", 10).await);
    let id = request_procurement(&app, &item_id, 40).await;
    advance_procurement(&app, &id, 2).await;

    let uri = format!("/api/v1/procurements/{id}/advance");
    let ((first, _), (second, _)) = tokio::join!(
        app.admin(Method::POST, &uri, None),
        app.admin(Method::POST, &uri, None)
    );
    let statuses = [first, second];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses
        .iter()
        .all(|s| [StatusCode::OK, StatusCode::BAD_REQUEST, StatusCode::CONFLICT].contains(s)));
    assert_eq!(quantity_of(&app, &item_id).await, 50);
}

#[tokio::test]
async fn concurrent_assignment_deletes_restore_stock_once() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("INV-5K", "Inverter", 5).await);
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/assignments",
            Some(json!({
                "customer_name": "Walk-in customer",
                "region": "guntur",
                "stock_item_id": item_id,
                "quantity": 2
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let uri = format!("/api/v1/assignments/{}", id_of(&body["data"]));
    assert_eq!(quantity_of(&app, &item_id).await, 3);

    let ((first, _), (second, _)) = tokio::join!(
        app.admin(Method::DELETE, &uri, None),
        app.admin(Method::DELETE, &uri, None)
    );
    let statuses = [first, second];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::NO_CONTENT).count(), 1);
    assert!(statuses.contains(&StatusCode::NOT_FOUND));
    assert_eq!(quantity_of(&app, &item_id).await, 5);
}

#[tokio::test]
async fn extreme_adjustments_are_rejected_cleanly() {
    let app = TestApp::new().await;
    let item_id = id_of(&app.create_stock_item("ACC-MC4", "Accessory", 3).await);

    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/v1/stock/{item_id}/adjust"),
            Some(json!({ "delta": i32::MIN, "reason": "typo" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/stock/{item_id}/adjust"),
            Some(json!({ "delta": -1_000_000, "reason": "write-off" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("1000000 requested"));
    assert_eq!(quantity_of(&app, &item_id).await, 3);
}

#[tokio::test]
async fn low_stock_filter_tolerates_huge_pages() {
    let app = TestApp::new().await;
    app.create_stock_item("MOD-LOW", "Module", 1).await;

    let (status, body) = app
        .admin(
            Method::GET,
            "/api/v1/stock?low_only=true&page=18446744073709551615",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
}
