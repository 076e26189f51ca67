//! Solar Console API Library
//!
//! Back office for a rooftop solar installer: projects and their stages,
//! payments, GST invoices, estimations, stock, procurement, logistics,
//! service tickets and HR, behind region and module guards.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod stages;
pub mod tracing;

use std::{sync::Arc, time::Duration};

use axum::{response::Json, routing::get, Extension, Router};
use chrono::Utc;
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::{modules, AuthRouterExt, AuthService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires every service against one pool and event channel
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        let auth_service = Arc::new(AuthService::new(
            auth::AuthConfig::new(config.jwt_secret.clone(), config.jwt_audience.clone()),
            db.clone(),
        ));

        Self {
            db,
            config,
            event_sender,
            services,
            auth_service,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn response_without_request_scope_has_no_request_id() {
        let response = ApiResponse::success(1);
        let meta = response.meta.expect("metadata expected");
        assert!(meta.request_id.is_none());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every `/api/v1` route; each feature area sits behind its module guard
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/projects",
            handlers::projects::project_routes().with_module(modules::PROJECTS),
        )
        .nest(
            "/chitoor-projects",
            handlers::chitoor_projects::chitoor_project_routes().with_module(modules::PROJECTS),
        )
        .nest(
            "/payments",
            handlers::payments::payment_routes().with_module(modules::FINANCE),
        )
        .nest(
            "/invoices",
            handlers::invoices::invoice_routes().with_module(modules::FINANCE),
        )
        .nest(
            "/estimations",
            handlers::estimations::estimation_routes().with_module(modules::PROJECTS),
        )
        .nest(
            "/service-tickets",
            handlers::service_tickets::service_ticket_routes().with_module(modules::SERVICE),
        )
        .nest(
            "/logistics",
            handlers::logistics::logistics_routes().with_module(modules::LOGISTICS),
        )
        .nest(
            "/procurements",
            handlers::procurement::procurement_routes().with_module(modules::PROCUREMENT),
        )
        .nest(
            "/stock",
            handlers::stock::stock_routes().with_module(modules::STOCK),
        )
        .nest(
            "/assignments",
            handlers::assignments::assignment_routes().with_module(modules::STOCK),
        )
        .nest(
            "/users",
            handlers::users::user_routes().with_module(modules::HR),
        )
        .nest(
            "/reports",
            handlers::reports::report_routes().with_module(modules::REPORTS),
        )
        .merge(
            Router::new()
                .route("/me", get(handlers::users::me))
                .with_auth(),
        )
}

/// CORS from configuration; permissive only in development or on explicit opt-in
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            environment = %cfg.environment,
            "using permissive CORS because no explicit origins are configured"
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("no CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full application router: health, `/api/v1`, Swagger UI and the shared layers
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let auth_service = state.auth_service.clone();
    let db = state.db.clone();

    Router::<AppState>::new()
        .route("/", get(|| async { "solar-console-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
        .nest("/health", health::health_routes_with_state(db))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        // Auth middleware looks the service up in request extensions
        .layer(Extension(auth_service))
        .layer(crate::tracing::configure_http_tracing())
        // Outermost so every span and error body sees the request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
