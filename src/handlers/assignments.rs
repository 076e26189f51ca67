use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::validate_input;
use crate::{
    auth::AuthUser,
    entities::payment_history::ProjectKind,
    entities::project_assignment,
    errors::ServiceError,
    handlers::AppState,
    services::assignments::{AssignmentFilter, CreateAssignmentInput},
    ApiResponse, ApiResult,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route("/:id", get(get_assignment).delete(delete_assignment))
}

/// Either `project_id` or `customer_name` + `region` identifies the recipient
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentRequest {
    pub project_id: Option<Uuid>,
    pub project_kind: Option<ProjectKind>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,
    pub region: Option<String>,
    pub stock_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Comma-separated panel or inverter serials
    pub serial_numbers: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentListQuery {
    pub project_id: Option<Uuid>,
    pub customer_name: Option<String>,
}

/// Assign modules or inverters; the stock item is decremented
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Hardware assigned", body = ApiResponse<project_assignment::Model>),
        (status = 400, description = "Item is not a module or inverter", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock on hand", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<project_assignment::Model>>), ServiceError> {
    validate_input(&payload)?;

    let assignment = state
        .services
        .assignments
        .create_assignment(
            &user,
            CreateAssignmentInput {
                project_id: payload.project_id,
                project_kind: payload.project_kind,
                customer_name: payload.customer_name,
                region: payload.region,
                stock_item_id: payload.stock_item_id,
                quantity: payload.quantity,
                serial_numbers: payload.serial_numbers,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(assignment))))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "Assignments listed", body = ApiResponse<Vec<project_assignment::Model>>)
    ),
    tag = "assignments"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AssignmentListQuery>,
) -> ApiResult<Vec<project_assignment::Model>> {
    let assignments = state
        .services
        .assignments
        .list_assignments(
            &user,
            AssignmentFilter {
                project_id: query.project_id,
                customer_name: query.customer_name,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(assignments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment fetched", body = ApiResponse<project_assignment::Model>),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<project_assignment::Model> {
    let assignment = state.services.assignments.get_assignment(&user, id).await?;
    Ok(Json(ApiResponse::success(assignment)))
}

/// Remove an assignment and return its units to stock
#[utoipa::path(
    delete,
    path = "/api/v1/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment removed")
    ),
    tag = "assignments"
)]
pub async fn delete_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.assignments.delete_assignment(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
