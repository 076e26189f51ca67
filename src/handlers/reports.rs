use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::reports::{ProjectSummary, StockValuation, TicketSummary, VendorSpend},
    ApiResponse, ApiResult,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(project_summary))
        .route("/collections", get(monthly_collections))
        .route("/stock", get(stock_valuation))
        .route("/procurement", get(procurement_spend))
        .route("/tickets", get(ticket_summary))
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Portfolio by stage and region, with collected and outstanding totals
#[utoipa::path(
    get,
    path = "/api/v1/reports/projects",
    responses(
        (status = 200, description = "Project summary", body = ApiResponse<ProjectSummary>)
    ),
    tag = "reports"
)]
pub async fn project_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ProjectSummary> {
    let summary = state.services.reports.project_summary(&user).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Payments received, keyed by `YYYY-MM`
#[utoipa::path(
    get,
    path = "/api/v1/reports/collections",
    params(CollectionsQuery),
    responses(
        (status = 200, description = "Monthly collections", body = ApiResponse<BTreeMap<String, Decimal>>),
        (status = 400, description = "Range is inverted", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn monthly_collections(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CollectionsQuery>,
) -> ApiResult<BTreeMap<String, Decimal>> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ServiceError::ValidationError(
                "from must not be after to".to_string(),
            ));
        }
    }
    let months = state
        .services
        .reports
        .monthly_collections(&user, query.from, query.to)
        .await?;
    Ok(Json(ApiResponse::success(months)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/stock",
    responses(
        (status = 200, description = "Stock valuation", body = ApiResponse<StockValuation>)
    ),
    tag = "reports"
)]
pub async fn stock_valuation(State(state): State<AppState>) -> ApiResult<StockValuation> {
    let valuation = state.services.reports.stock_valuation().await?;
    Ok(Json(ApiResponse::success(valuation)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/procurement",
    responses(
        (status = 200, description = "Spend per vendor", body = ApiResponse<Vec<VendorSpend>>)
    ),
    tag = "reports"
)]
pub async fn procurement_spend(State(state): State<AppState>) -> ApiResult<Vec<VendorSpend>> {
    let spend = state.services.reports.procurement_spend().await?;
    Ok(Json(ApiResponse::success(spend)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/tickets",
    responses(
        (status = 200, description = "Ticket summary", body = ApiResponse<TicketSummary>)
    ),
    tag = "reports"
)]
pub async fn ticket_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<TicketSummary> {
    let summary = state.services.reports.ticket_summary(&user).await?;
    Ok(Json(ApiResponse::success(summary)))
}
