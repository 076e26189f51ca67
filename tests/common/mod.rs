#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use solar_console_api::{
    auth::{modules, Claims},
    config::AppConfig,
    db,
    entities::app_user::{self, UserRole, ALL_REGIONS},
    events::{self, EventSender},
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness: a migrated SQLite database in a temp dir behind the full router.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state and one admin user.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("solar_console_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = solar_console_api::build_router(state.clone());

        let mut app = Self {
            router,
            state,
            admin_token: String::new(),
            _db_dir: db_dir,
            _event_task: event_task,
        };
        let admin = app
            .seed_user(UserRole::Admin, &[ALL_REGIONS], modules::ALL)
            .await;
        app.admin_token = app.token_for(admin.id);
        app
    }

    /// Bearer token for the seeded admin.
    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Inserts a console profile directly.
    pub async fn seed_user(
        &self,
        role: UserRole,
        regions: &[&str],
        module_keys: &[&str],
    ) -> app_user::Model {
        let id = Uuid::new_v4();
        app_user::ActiveModel {
            id: Set(id),
            email: Set(format!("user-{}@example.com", id.simple())),
            full_name: Set(format!("Test {}", role)),
            role: Set(role),
            regions: Set(app_user::join_list(regions)),
            modules: Set(app_user::join_list(module_keys)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
    }

    /// Staff profile plus its token.
    pub async fn staff_token(&self, regions: &[&str], module_keys: &[&str]) -> String {
        let user = self.seed_user(UserRole::Staff, regions, module_keys).await;
        self.token_for(user.id)
    }

    /// Mints the identity provider's token for `user_id`.
    pub fn token_for(&self, user_id: Uuid) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            iat: Some(now.timestamp()),
            aud: None,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("encode access token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request as admin, returning the status and parsed JSON body.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, Some(self.admin_token())).await;
        read_json(response).await
    }

    /// Request with `token`, returning the status and parsed JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, Some(token)).await;
        read_json(response).await
    }

    /// Creates a residential project and returns its `data` object.
    pub async fn create_project(&self, region: &str, proposal: i64, advance: i64) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/projects",
                Some(serde_json::json!({
                    "customer_name": format!("Customer in {}", region),
                    "region": region,
                    "capacity_kw": "5",
                    "proposal_amount": proposal.to_string(),
                    "advance_payment": advance.to_string(),
                    "tax_amount": "0"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body["data"].clone()
    }

    /// Creates a catalog item and returns its `data` object.
    pub async fn create_stock_item(&self, sku: &str, category: &str, quantity: i32) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/stock",
                Some(serde_json::json!({
                    "sku": sku,
                    "name": format!("Item {}", sku),
                    "category": category,
                    "quantity": quantity,
                    "unit_cost": "1000",
                    "reorder_level": 2
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create stock item failed: {body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Status plus JSON body; an empty body reads as `Value::Null`.
pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let value = serde_json::from_slice(&bytes).expect("response body is JSON");
    (status, value)
}

/// Decimals travel as strings; accepts numbers too.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub fn id_of(data: &Value) -> String {
    data["id"].as_str().expect("id field").to_string()
}
