use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{paginated, validate_input, PageParams};
use crate::{
    auth::AuthUser,
    entities::estimation_cost,
    errors::ServiceError,
    handlers::AppState,
    services::estimations::{CostLines, CreateEstimateInput},
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn estimation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_estimates).post(create_estimate))
        .route("/:id", get(get_estimate).delete(delete_estimate))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEstimateRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 64))]
    pub region: String,
    pub capacity_kw: Decimal,
    #[serde(default)]
    pub module_cost: Decimal,
    #[serde(default)]
    pub inverter_cost: Decimal,
    #[serde(default)]
    pub structure_cost: Decimal,
    #[serde(default)]
    pub cabling_cost: Decimal,
    #[serde(default)]
    pub installation_cost: Decimal,
    #[serde(default)]
    pub other_cost: Decimal,
    #[serde(default)]
    pub margin_percent: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstimateListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// Price a prospective installation
#[utoipa::path(
    post,
    path = "/api/v1/estimations",
    request_body = CreateEstimateRequest,
    responses(
        (status = 201, description = "Estimate created", body = ApiResponse<estimation_cost::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "estimations"
)]
pub async fn create_estimate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateEstimateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<estimation_cost::Model>>), ServiceError> {
    validate_input(&payload)?;

    let estimate = state
        .services
        .estimations
        .create_estimate(
            &user,
            CreateEstimateInput {
                customer_name: payload.customer_name,
                region: payload.region,
                capacity_kw: payload.capacity_kw,
                lines: CostLines {
                    module_cost: payload.module_cost,
                    inverter_cost: payload.inverter_cost,
                    structure_cost: payload.structure_cost,
                    cabling_cost: payload.cabling_cost,
                    installation_cost: payload.installation_cost,
                    other_cost: payload.other_cost,
                },
                margin_percent: payload.margin_percent,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(estimate))))
}

#[utoipa::path(
    get,
    path = "/api/v1/estimations",
    params(EstimateListQuery),
    responses(
        (status = 200, description = "Estimates listed", body = ApiResponse<PaginatedResponse<estimation_cost::Model>>)
    ),
    tag = "estimations"
)]
pub async fn list_estimates(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EstimateListQuery>,
) -> ApiResult<PaginatedResponse<estimation_cost::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let (items, total) = state
        .services
        .estimations
        .list_estimates(&user, query.search, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/estimations/{id}",
    params(("id" = Uuid, Path, description = "Estimate ID")),
    responses(
        (status = 200, description = "Estimate fetched", body = ApiResponse<estimation_cost::Model>),
        (status = 404, description = "Estimate not found", body = crate::errors::ErrorResponse)
    ),
    tag = "estimations"
)]
pub async fn get_estimate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<estimation_cost::Model> {
    let estimate = state.services.estimations.get_estimate(&user, id).await?;
    Ok(Json(ApiResponse::success(estimate)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/estimations/{id}",
    params(("id" = Uuid, Path, description = "Estimate ID")),
    responses(
        (status = 204, description = "Estimate deleted")
    ),
    tag = "estimations"
)]
pub async fn delete_estimate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.estimations.delete_estimate(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
