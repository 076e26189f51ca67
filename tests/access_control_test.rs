mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, read_json, TestApp};
use serde_json::json;
use solar_console_api::{auth::modules, entities::app_user::UserRole};
use uuid::Uuid;

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = read_json(
        app.request(Method::GET, "/api/v1/projects", None, None).await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn garbage_and_unknown_subject_tokens_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(Method::GET, "/api/v1/projects", None, "not-a-jwt")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but nobody by that id
    let stranger = app.token_for(Uuid::new_v4());
    let (status, _) = app
        .call(Method::GET, "/api/v1/projects", None, &stranger)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = TestApp::new().await;

    let (status, body) = read_json(app.request(Method::GET, "/health", None, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");

    let (status, body) = read_json(
        app.request(Method::GET, "/api-docs/openapi.json", None, None)
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/projects"].is_object());
}

#[tokio::test]
async fn module_grant_is_required() {
    let app = TestApp::new().await;
    let token = app.staff_token(&["guntur"], &[modules::PROJECTS]).await;

    let (status, _) = app.call(Method::GET, "/api/v1/projects", None, &token).await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/api/v1/stock", "/api/v1/payments", "/api/v1/users", "/api/v1/reports/projects"] {
        let (status, _) = app.call(Method::GET, uri, None, &token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn lists_only_show_the_sessions_regions() {
    let app = TestApp::new().await;
    let guntur = id_of(&app.create_project("guntur", 100_000, 0).await);
    let nellore = id_of(&app.create_project("nellore", 100_000, 0).await);
    let token = app.staff_token(&["Guntur"], &[modules::PROJECTS]).await;

    let (status, body) = app.call(Method::GET, "/api/v1/projects", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], guntur.as_str());

    let (status, _) = app
        .call(Method::GET, &format!("/api/v1/projects/{nellore}"), None, &token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/projects/{nellore}/advance"),
            None,
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/projects",
            Some(json!({
                "customer_name": "Out of region",
                "region": "nellore",
                "capacity_kw": "3",
                "proposal_amount": "90000"
            })),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn chitoor_projects_need_the_chitoor_region() {
    let app = TestApp::new().await;
    let token = app.staff_token(&["guntur"], &[modules::PROJECTS]).await;

    let (status, _) = app
        .call(Method::GET, "/api/v1/chitoor-projects", None, &token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let chitoor = app.staff_token(&["chitoor"], &[modules::PROJECTS]).await;
    let (status, _) = app
        .call(Method::GET, "/api/v1/chitoor-projects", None, &chitoor)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_returns_the_resolved_session() {
    let app = TestApp::new().await;
    let user = app
        .seed_user(UserRole::Manager, &["guntur", "nellore"], &[modules::FINANCE])
        .await;
    let token = app.token_for(user.id);

    let (status, body) = app.call(Method::GET, "/api/v1/me", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], user.id.to_string());
    assert_eq!(body["data"]["role"], "manager");
    assert_eq!(body["data"]["regions"], json!(["guntur", "nellore"]));
    assert_eq!(body["data"]["modules"], json!(["finance"]));
}

#[tokio::test]
async fn deactivated_users_are_forbidden() {
    let app = TestApp::new().await;
    let user = app
        .seed_user(UserRole::Staff, &["guntur"], &[modules::PROJECTS])
        .await;
    let token = app.token_for(user.id);

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/users/{}/deactivate", user.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = app.call(Method::GET, "/api/v1/me", None, &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_grant_admin_rights() {
    let app = TestApp::new().await;
    let hr = app
        .staff_token(&["guntur"], &[modules::HR, modules::SERVICE])
        .await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "email": "new.admin@example.com",
                "full_name": "New Admin",
                "role": "admin",
                "regions": ["*"]
            })),
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "email": "Field.Tech@Example.com",
                "full_name": "Field Tech",
                "role": "staff",
                "regions": ["guntur"],
                "modules": ["service"]
            })),
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["email"], "field.tech@example.com");

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "email": "new.admin@example.com",
                "full_name": "New Admin",
                "role": "admin",
                "regions": ["*"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn hr_staff_grant_only_access_they_hold() {
    let app = TestApp::new().await;
    let hr = app.staff_token(&["nellore"], &[modules::HR]).await;

    for (regions, module_keys) in [
        (json!(["nellore", "chitoor"]), json!([])),
        (json!(["nellore"]), json!(["finance"])),
    ] {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/v1/users",
                Some(json!({
                    "email": format!("clerk-{}@example.com", Uuid::new_v4().simple()),
                    "full_name": "Clerk",
                    "role": "staff",
                    "regions": regions,
                    "modules": module_keys
                })),
                &hr,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    }

    let clerk = app
        .seed_user(UserRole::Staff, &["nellore"], &[])
        .await;
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}", clerk.id),
            Some(json!({ "role": "manager" })),
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}", clerk.id),
            Some(json!({ "modules": ["hr"] })),
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["modules"], "hr");
}

#[tokio::test]
async fn hr_staff_cannot_widen_their_own_access() {
    let app = TestApp::new().await;
    let me = app
        .seed_user(UserRole::Staff, &["nellore"], &[modules::HR])
        .await;
    let token = app.token_for(me.id);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}", me.id),
            Some(json!({
                "regions": ["nellore", "chitoor", "kurnool"],
                "modules": ["projects", "finance", "hr", "stock", "reports"]
            })),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}", me.id),
            Some(json!({ "full_name": "Renamed Clerk" })),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["modules"], "hr");
    assert_eq!(body["data"]["regions"], "nellore");
}

#[tokio::test]
async fn admin_profiles_are_off_limits_to_hr_staff() {
    let app = TestApp::new().await;
    let hr = app.staff_token(&["nellore"], &[modules::HR]).await;
    let other_admin = app
        .seed_user(UserRole::Admin, &["*"], modules::ALL)
        .await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}", other_admin.id),
            Some(json!({ "is_active": false })),
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/users/{}/deactivate", other_admin.id),
            None,
            &hr,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/users/{}", other_admin.id), None)
        .await;
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn unknown_modules_are_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "email": "someone@example.com",
                "full_name": "Someone",
                "role": "staff",
                "modules": ["projects", "payroll"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
