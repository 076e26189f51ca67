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

use super::common::{non_blank, paginated, validate_input, PageParams};
use crate::{
    entities::procurement_item,
    errors::ServiceError,
    handlers::AppState,
    services::procurement::{CreateProcurementInput, ProcurementFilter, UpdateProcurementInput},
    stages::StageMove,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn procurement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_procurements).post(create_procurement))
        .route(
            "/:id",
            get(get_procurement)
                .put(update_procurement)
                .delete(delete_procurement),
        )
        .route("/:id/advance", post(advance_procurement))
        .route("/:id/regress", post(regress_procurement))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProcurementRequest {
    #[validate(length(min = 1, max = 200))]
    pub vendor: String,
    #[validate(length(min = 1, max = 200))]
    pub item_name: String,
    /// Catalog entry that receives the quantity once received
    pub stock_item_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProcurementRequest {
    #[validate(length(min = 1, max = 200))]
    pub vendor: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub item_name: Option<String>,
    pub stock_item_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProcurementListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub vendor: Option<String>,
}

/// Raise a purchase request
#[utoipa::path(
    post,
    path = "/api/v1/procurements",
    request_body = CreateProcurementRequest,
    responses(
        (status = 201, description = "Procurement requested", body = ApiResponse<procurement_item::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn create_procurement(
    State(state): State<AppState>,
    Json(payload): Json<CreateProcurementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<procurement_item::Model>>), ServiceError> {
    validate_input(&payload)?;

    let item = state
        .services
        .procurement
        .create_procurement(CreateProcurementInput {
            vendor: payload.vendor,
            item_name: payload.item_name,
            stock_item_id: payload.stock_item_id,
            quantity: payload.quantity,
            unit_price: payload.unit_price,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/procurements",
    params(ProcurementListQuery),
    responses(
        (status = 200, description = "Procurements listed", body = ApiResponse<PaginatedResponse<procurement_item::Model>>)
    ),
    tag = "procurements"
)]
pub async fn list_procurements(
    State(state): State<AppState>,
    Query(query): Query<ProcurementListQuery>,
) -> ApiResult<PaginatedResponse<procurement_item::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = ProcurementFilter {
        status: non_blank(query.status),
        vendor: query.vendor,
    };
    let (items, total) = state
        .services
        .procurement
        .list_procurements(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/procurements/{id}",
    params(("id" = Uuid, Path, description = "Procurement ID")),
    responses(
        (status = 200, description = "Procurement fetched", body = ApiResponse<procurement_item::Model>),
        (status = 404, description = "Procurement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn get_procurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<procurement_item::Model> {
    let item = state.services.procurement.get_procurement(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/procurements/{id}",
    params(("id" = Uuid, Path, description = "Procurement ID")),
    request_body = UpdateProcurementRequest,
    responses(
        (status = 200, description = "Procurement updated", body = ApiResponse<procurement_item::Model>),
        (status = 400, description = "No longer in Requested status", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn update_procurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProcurementRequest>,
) -> ApiResult<procurement_item::Model> {
    validate_input(&payload)?;

    let item = state
        .services
        .procurement
        .update_procurement(
            id,
            UpdateProcurementInput {
                vendor: payload.vendor,
                item_name: payload.item_name,
                stock_item_id: payload.stock_item_id,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/procurements/{id}",
    params(("id" = Uuid, Path, description = "Procurement ID")),
    responses(
        (status = 204, description = "Procurement deleted"),
        (status = 400, description = "Already received", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn delete_procurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.procurement.delete_procurement(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Advance the purchase; reaching Received books the quantity into stock
#[utoipa::path(
    post,
    path = "/api/v1/procurements/{id}/advance",
    params(("id" = Uuid, Path, description = "Procurement ID")),
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<procurement_item::Model>),
        (status = 400, description = "Already received", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn advance_procurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<procurement_item::Model> {
    let item = state
        .services
        .procurement
        .move_status(id, StageMove::Advance)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/procurements/{id}/regress",
    params(("id" = Uuid, Path, description = "Procurement ID")),
    responses(
        (status = 200, description = "Status regressed", body = ApiResponse<procurement_item::Model>),
        (status = 400, description = "Requested or already received", body = crate::errors::ErrorResponse)
    ),
    tag = "procurements"
)]
pub async fn regress_procurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<procurement_item::Model> {
    let item = state
        .services
        .procurement
        .move_status(id, StageMove::Regress)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}
