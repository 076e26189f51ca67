use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{paginated, validate_input, PageParams};
use crate::{
    entities::stock_item::{self, StockCategory},
    errors::ServiceError,
    handlers::AppState,
    services::stock::{CreateStockItemInput, StockFilter, UpdateStockItemInput},
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low", get(low_stock))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_item))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStockItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub category: StockCategory,
    pub brand: Option<String>,
    /// Defaults to `nos`
    pub unit: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_cost: Decimal,
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStockItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub category: Option<StockCategory>,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub unit_cost: Option<Decimal>,
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed change to the on-hand quantity
    pub delta: i32,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<StockCategory>,
    /// Only items at or below their reorder level
    #[serde(default)]
    pub low_only: bool,
    /// Matches part of the name or SKU
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/stock",
    request_body = CreateStockItemRequest,
    responses(
        (status = 201, description = "Stock item created", body = ApiResponse<stock_item::Model>),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<stock_item::Model>>), ServiceError> {
    validate_input(&payload)?;

    let item = state
        .services
        .stock
        .create_item(CreateStockItemInput {
            sku: payload.sku,
            name: payload.name,
            category: payload.category,
            brand: payload.brand,
            unit: payload.unit,
            quantity: payload.quantity,
            unit_cost: payload.unit_cost,
            reorder_level: payload.reorder_level,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock listed", body = ApiResponse<PaginatedResponse<stock_item::Model>>)
    ),
    tag = "stock"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> ApiResult<PaginatedResponse<stock_item::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = StockFilter {
        category: query.category,
        low_only: query.low_only,
        search: query.search,
    };
    let (items, total) = state.services.stock.list_items(filter, page, limit).await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

/// Items at or below their reorder level, scarcest first
#[utoipa::path(
    get,
    path = "/api/v1/stock/low",
    responses(
        (status = 200, description = "Low stock listed", body = ApiResponse<Vec<stock_item::Model>>)
    ),
    tag = "stock"
)]
pub async fn low_stock(State(state): State<AppState>) -> ApiResult<Vec<stock_item::Model>> {
    let items = state.services.stock.low_stock().await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/{id}",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Stock item fetched", body = ApiResponse<stock_item::Model>),
        (status = 404, description = "Stock item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<stock_item::Model> {
    let item = state.services.stock.get_item(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/stock/{id}",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    request_body = UpdateStockItemRequest,
    responses(
        (status = 200, description = "Stock item updated", body = ApiResponse<stock_item::Model>)
    ),
    tag = "stock"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockItemRequest>,
) -> ApiResult<stock_item::Model> {
    validate_input(&payload)?;

    let item = state
        .services
        .stock
        .update_item(
            id,
            UpdateStockItemInput {
                name: payload.name,
                category: payload.category,
                brand: payload.brand,
                unit: payload.unit,
                unit_cost: payload.unit_cost,
                reorder_level: payload.reorder_level,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stock/{id}",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 204, description = "Stock item deleted"),
        (status = 409, description = "Item has assignments", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.stock.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Correct the on-hand quantity by a signed delta
#[utoipa::path(
    post,
    path = "/api/v1/stock/{id}/adjust",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Quantity adjusted", body = ApiResponse<stock_item::Model>),
        (status = 422, description = "Quantity would drop below zero", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn adjust_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> ApiResult<stock_item::Model> {
    validate_input(&payload)?;
    let item = state
        .services
        .stock
        .adjust(id, payload.delta, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}
