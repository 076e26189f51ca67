mod common;

use axum::http::{Method, StatusCode};
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn payment_within_balance_reduces_outstanding() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 300_000, 50_000).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({
                "project_id": id,
                "amount": "100000",
                "payment_mode": "UPI",
                "reference": "UTR123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["payment_mode"], "UPI");
    assert_eq!(body["data"]["project_kind"], "project");

    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/projects/{id}/balance"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"]["paid_amount"]), Decimal::from(100_000));
    assert_eq!(dec(&body["data"]["outstanding_balance"]), Decimal::from(150_000));
    assert_eq!(body["data"]["payment_count"], 1);
}

#[tokio::test]
async fn over_balance_payment_is_rejected_and_not_written() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 40_000).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({
                "project_id": id,
                "amount": "60001",
                "payment_mode": "Cash"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("exceeds outstanding balance"));

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/projects/{id}/payments"), None)
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn exact_outstanding_settles_the_project() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 40_000).await);

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": id, "amount": "60000", "payment_mode": "Bank Transfer" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/projects/{id}/balance"), None)
        .await;
    assert_eq!(dec(&body["data"]["outstanding_balance"]), Decimal::ZERO);

    // Nothing left to pay
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": id, "amount": "1", "payment_mode": "Cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 0).await);

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": id, "amount": "0", "payment_mode": "Cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_for_missing_project_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({
                "project_id": uuid::Uuid::new_v4(),
                "amount": "10",
                "payment_mode": "Cash"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chitoor_payments_are_tracked_separately() {
    let app = TestApp::new().await;
    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/chitoor-projects",
            Some(json!({
                "customer_name": "Lakshmi",
                "capacity_kw": "3",
                "proposal_amount": "150000",
                "advance_payment": "30000"
            })),
        )
        .await;
    let chitoor_id = id_of(&body["data"]);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({
                "project_id": chitoor_id,
                "project_kind": "chitoor",
                "amount": "20000",
                "payment_mode": "Cheque"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, body) = app
        .admin(
            Method::GET,
            &format!("/api/v1/chitoor-projects/{chitoor_id}/balance"),
            None,
        )
        .await;
    assert_eq!(dec(&body["data"]["outstanding_balance"]), Decimal::from(100_000));

    // The same id under the residential kind does not exist
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": chitoor_id, "amount": "10", "payment_mode": "Cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_and_receipt_describe_the_payment() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 200_000, 0).await);

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": id, "amount": "50000", "payment_mode": "UPI" })),
        )
        .await;
    let payment_id = id_of(&body["data"]);

    let (status, body) = app.admin(Method::GET, "/api/v1/payments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let entry = &body["data"]["items"][0];
    assert_eq!(entry["id"], payment_id.as_str());
    assert_eq!(entry["region"], "guntur");
    assert_eq!(entry["customer_name"], "Customer in guntur");

    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/payments/{payment_id}/receipt"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let receipt = &body["data"];
    assert!(receipt["receipt_number"]
        .as_str()
        .unwrap_or_default()
        .starts_with("RCPT-"));
    assert_eq!(dec(&receipt["total_paid"]), Decimal::from(50_000));
    assert_eq!(dec(&receipt["balance_after_payment"]), Decimal::from(150_000));
    assert_eq!(receipt["currency"], "INR");
}

#[tokio::test]
async fn deleting_a_payment_restores_the_balance() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 0).await);

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "project_id": id, "amount": "25000", "payment_mode": "Cash" })),
        )
        .await;
    let payment_id = id_of(&body["data"]);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/payments/{payment_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/projects/{id}/balance"), None)
        .await;
    assert_eq!(dec(&body["data"]["outstanding_balance"]), Decimal::from(100_000));
}

#[tokio::test]
async fn invoice_splits_gst_for_intra_state_supply() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 0).await);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "project_id": id,
                "place_of_supply": "Andhra Pradesh",
                "taxable_amount": "100000",
                "gst_rate": "12"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let invoice = &body["data"];
    assert_eq!(dec(&invoice["cgst"]), Decimal::from(6_000));
    assert_eq!(dec(&invoice["sgst"]), Decimal::from(6_000));
    assert_eq!(dec(&invoice["igst"]), Decimal::ZERO);
    assert_eq!(dec(&invoice["total_amount"]), Decimal::from(112_000));
    assert_eq!(invoice["customer_name"], "Customer in guntur");
    assert!(invoice["invoice_number"]
        .as_str()
        .unwrap_or_default()
        .ends_with("-00001"));
}

#[tokio::test]
async fn tax_is_attributed_over_every_payment_of_the_project() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/projects",
            Some(json!({
                "customer_name": "Lakshmi",
                "region": "guntur",
                "capacity_kw": "4",
                "proposal_amount": "200000",
                "advance_payment": "0",
                "tax_amount": "20000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = id_of(&body["data"]);

    let mut payment_ids = Vec::new();
    for (amount, paid_at) in [("50000", "2025-01-15T10:00:00Z"), ("150000", "2025-03-10T10:00:00Z")] {
        let (status, body) = app
            .admin(
                Method::POST,
                "/api/v1/payments",
                Some(json!({
                    "project_id": id,
                    "amount": amount,
                    "payment_mode": "Bank Transfer",
                    "paid_at": paid_at
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        payment_ids.push(id_of(&body["data"]));
    }

    // The March window holds one payment, but its share is taken against both
    let (status, body) = app
        .admin(
            Method::GET,
            "/api/v1/payments?from=2025-03-01T00:00:00Z",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let entry = &body["data"]["items"][0];
    assert_eq!(entry["id"], payment_ids[1].as_str());
    assert_eq!(dec(&entry["attributed_tax"]), Decimal::from(15_000));

    let (status, body) = app
        .admin(
            Method::GET,
            &format!("/api/v1/payments/{}/receipt", payment_ids[0]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let receipt = &body["data"];
    assert_eq!(dec(&receipt["attributed_tax"]), Decimal::from(5_000));
    assert_eq!(dec(&receipt["total_paid"]), Decimal::from(200_000));
    assert_eq!(dec(&receipt["balance_after_payment"]), Decimal::from(150_000));
}

#[tokio::test]
async fn huge_page_numbers_return_empty_pages() {
    let app = TestApp::new().await;
    let id = id_of(&app.create_project("guntur", 100_000, 0).await);
    app.admin(
        Method::POST,
        "/api/v1/payments",
        Some(json!({ "project_id": id, "amount": "1000", "payment_mode": "Cash" })),
    )
    .await;

    for uri in [
        "/api/v1/payments?page=18446744073709551615",
        "/api/v1/projects?page=18446744073709551615&limit=18446744073709551615",
    ] {
        let (status, body) = app.admin(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert_eq!(body["data"]["total"], 1, "{uri}");
        assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0), "{uri}");
    }
}
