use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{non_blank, paginated, validate_input, PageParams};
use crate::{
    auth::AuthUser,
    entities::logistics_record,
    errors::ServiceError,
    handlers::AppState,
    services::logistics::{CreateDispatchInput, DispatchFilter, UpdateDispatchInput},
    stages::StageMove,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn logistics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_dispatches).post(create_dispatch))
        .route(
            "/:id",
            get(get_dispatch).put(update_dispatch).delete(delete_dispatch),
        )
        .route("/:id/advance", post(advance_dispatch))
        .route("/:id/regress", post(regress_dispatch))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchRequest {
    pub project_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 64))]
    pub region: String,
    /// Free-text bill of materials
    #[validate(length(min = 1))]
    pub materials: String,
    #[validate(length(max = 20))]
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDispatchRequest {
    #[validate(length(min = 1))]
    pub materials: Option<String>,
    #[validate(length(max = 20))]
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DispatchListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub region: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/logistics",
    request_body = CreateDispatchRequest,
    responses(
        (status = 201, description = "Dispatch record created", body = ApiResponse<logistics_record::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "logistics"
)]
pub async fn create_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDispatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<logistics_record::Model>>), ServiceError> {
    validate_input(&payload)?;

    let record = state
        .services
        .logistics
        .create_dispatch(
            &user,
            CreateDispatchInput {
                project_id: payload.project_id,
                customer_name: payload.customer_name,
                region: payload.region,
                materials: payload.materials,
                vehicle_number: payload.vehicle_number,
                driver_name: payload.driver_name,
                dispatch_date: payload.dispatch_date,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

#[utoipa::path(
    get,
    path = "/api/v1/logistics",
    params(DispatchListQuery),
    responses(
        (status = 200, description = "Dispatch records listed", body = ApiResponse<PaginatedResponse<logistics_record::Model>>)
    ),
    tag = "logistics"
)]
pub async fn list_dispatches(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DispatchListQuery>,
) -> ApiResult<PaginatedResponse<logistics_record::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = DispatchFilter {
        status: non_blank(query.status),
        region: non_blank(query.region),
    };
    let (items, total) = state
        .services
        .logistics
        .list_dispatches(&user, filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/logistics/{id}",
    params(("id" = Uuid, Path, description = "Dispatch record ID")),
    responses(
        (status = 200, description = "Dispatch record fetched", body = ApiResponse<logistics_record::Model>),
        (status = 404, description = "Dispatch record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "logistics"
)]
pub async fn get_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<logistics_record::Model> {
    let record = state.services.logistics.get_dispatch(&user, id).await?;
    Ok(Json(ApiResponse::success(record)))
}

#[utoipa::path(
    put,
    path = "/api/v1/logistics/{id}",
    params(("id" = Uuid, Path, description = "Dispatch record ID")),
    request_body = UpdateDispatchRequest,
    responses(
        (status = 200, description = "Dispatch record updated", body = ApiResponse<logistics_record::Model>)
    ),
    tag = "logistics"
)]
pub async fn update_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDispatchRequest>,
) -> ApiResult<logistics_record::Model> {
    validate_input(&payload)?;

    let record = state
        .services
        .logistics
        .update_dispatch(
            &user,
            id,
            UpdateDispatchInput {
                materials: payload.materials,
                vehicle_number: payload.vehicle_number,
                driver_name: payload.driver_name,
                dispatch_date: payload.dispatch_date,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/logistics/{id}",
    params(("id" = Uuid, Path, description = "Dispatch record ID")),
    responses(
        (status = 204, description = "Dispatch record deleted")
    ),
    tag = "logistics"
)]
pub async fn delete_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.logistics.delete_dispatch(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/logistics/{id}/advance",
    params(("id" = Uuid, Path, description = "Dispatch record ID")),
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<logistics_record::Model>),
        (status = 400, description = "Already delivered", body = crate::errors::ErrorResponse)
    ),
    tag = "logistics"
)]
pub async fn advance_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<logistics_record::Model> {
    let record = state
        .services
        .logistics
        .move_status(&user, id, StageMove::Advance)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[utoipa::path(
    post,
    path = "/api/v1/logistics/{id}/regress",
    params(("id" = Uuid, Path, description = "Dispatch record ID")),
    responses(
        (status = 200, description = "Status regressed", body = ApiResponse<logistics_record::Model>),
        (status = 400, description = "Still pending", body = crate::errors::ErrorResponse)
    ),
    tag = "logistics"
)]
pub async fn regress_dispatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<logistics_record::Model> {
    let record = state
        .services
        .logistics
        .move_status(&user, id, StageMove::Regress)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}
