use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{non_blank, paginated, validate_input, PageParams};
use super::projects::SetStageRequest;
use crate::{
    auth::AuthUser,
    entities::payment_history::{self, ProjectKind},
    entities::{chitoor_project, project_assignment},
    errors::ServiceError,
    handlers::AppState,
    services::assignments::AssignmentFilter,
    services::chitoor_projects::{
        ChitoorProjectFilter, CreateChitoorProjectInput, UpdateChitoorProjectInput,
    },
    services::payments::ProjectBalance,
    stages::StageMove,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn chitoor_project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/advance", post(advance_stage))
        .route("/:id/regress", post(regress_stage))
        .route("/:id/stage", put(set_stage))
        .route("/:id/balance", get(project_balance))
        .route("/:id/payments", get(project_payments))
        .route("/:id/assignments", get(project_assignments))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateChitoorProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub mandal: Option<String>,
    /// Electricity service connection number
    pub service_number: Option<String>,
    pub capacity_kw: Decimal,
    pub stage: Option<String>,
    pub proposal_amount: Decimal,
    #[serde(default)]
    pub advance_payment: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateChitoorProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub mandal: Option<String>,
    pub service_number: Option<String>,
    pub capacity_kw: Option<Decimal>,
    pub proposal_amount: Option<Decimal>,
    pub advance_payment: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChitoorProjectListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub stage: Option<String>,
    pub mandal: Option<String>,
    pub search: Option<String>,
}

/// Register a Chitoor project
#[utoipa::path(
    post,
    path = "/api/v1/chitoor-projects",
    request_body = CreateChitoorProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<chitoor_project::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Chitoor region not granted", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateChitoorProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<chitoor_project::Model>>), ServiceError> {
    validate_input(&payload)?;

    let created = state
        .services
        .chitoor_projects
        .create_project(
            &user,
            CreateChitoorProjectInput {
                customer_name: payload.customer_name,
                phone: payload.phone,
                address: payload.address,
                mandal: payload.mandal,
                service_number: payload.service_number,
                capacity_kw: payload.capacity_kw,
                stage: payload.stage,
                proposal_amount: payload.proposal_amount,
                advance_payment: payload.advance_payment,
                tax_amount: payload.tax_amount,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/chitoor-projects",
    params(ChitoorProjectListQuery),
    responses(
        (status = 200, description = "Projects listed", body = ApiResponse<PaginatedResponse<chitoor_project::Model>>),
        (status = 403, description = "Chitoor region not granted", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ChitoorProjectListQuery>,
) -> ApiResult<PaginatedResponse<chitoor_project::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = ChitoorProjectFilter {
        stage: non_blank(query.stage),
        mandal: query.mandal,
        search: query.search,
    };
    let (items, total) = state
        .services
        .chitoor_projects
        .list_projects(&user, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/chitoor-projects/{id}",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Project fetched", body = ApiResponse<chitoor_project::Model>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<chitoor_project::Model> {
    let project = state.services.chitoor_projects.get_project(&user, id).await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    put,
    path = "/api/v1/chitoor-projects/{id}",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    request_body = UpdateChitoorProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<chitoor_project::Model>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateChitoorProjectRequest>,
) -> ApiResult<chitoor_project::Model> {
    validate_input(&payload)?;

    let updated = state
        .services
        .chitoor_projects
        .update_project(
            &user,
            id,
            UpdateChitoorProjectInput {
                customer_name: payload.customer_name,
                phone: payload.phone,
                address: payload.address,
                mandal: payload.mandal,
                service_number: payload.service_number,
                capacity_kw: payload.capacity_kw,
                proposal_amount: payload.proposal_amount,
                advance_payment: payload.advance_payment,
                tax_amount: payload.tax_amount,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chitoor-projects/{id}",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 409, description = "Project has payments or assignments", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.chitoor_projects.delete_project(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/chitoor-projects/{id}/advance",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Stage advanced", body = ApiResponse<chitoor_project::Model>),
        (status = 400, description = "Already at the final stage", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn advance_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<chitoor_project::Model> {
    let project = state
        .services
        .chitoor_projects
        .move_stage(&user, id, StageMove::Advance)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    post,
    path = "/api/v1/chitoor-projects/{id}/regress",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Stage regressed", body = ApiResponse<chitoor_project::Model>),
        (status = 400, description = "Already at the first stage", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn regress_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<chitoor_project::Model> {
    let project = state
        .services
        .chitoor_projects
        .move_stage(&user, id, StageMove::Regress)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    put,
    path = "/api/v1/chitoor-projects/{id}/stage",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    request_body = SetStageRequest,
    responses(
        (status = 200, description = "Stage set", body = ApiResponse<chitoor_project::Model>),
        (status = 400, description = "Unknown stage", body = crate::errors::ErrorResponse)
    ),
    tag = "chitoor-projects"
)]
pub async fn set_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStageRequest>,
) -> ApiResult<chitoor_project::Model> {
    validate_input(&payload)?;
    let project = state
        .services
        .chitoor_projects
        .set_stage(&user, id, payload.stage.trim())
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    get,
    path = "/api/v1/chitoor-projects/{id}/balance",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Balance computed", body = ApiResponse<ProjectBalance>)
    ),
    tag = "chitoor-projects"
)]
pub async fn project_balance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ProjectBalance> {
    let balance = state
        .services
        .payments
        .project_balance(&user, ProjectKind::Chitoor, id)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

#[utoipa::path(
    get,
    path = "/api/v1/chitoor-projects/{id}/payments",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Payments listed", body = ApiResponse<Vec<payment_history::Model>>)
    ),
    tag = "chitoor-projects"
)]
pub async fn project_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<payment_history::Model>> {
    let payments = state
        .services
        .payments
        .list_for_project(&user, ProjectKind::Chitoor, id)
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/chitoor-projects/{id}/assignments",
    params(("id" = Uuid, Path, description = "Chitoor project ID")),
    responses(
        (status = 200, description = "Assignments listed", body = ApiResponse<Vec<project_assignment::Model>>)
    ),
    tag = "chitoor-projects"
)]
pub async fn project_assignments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<project_assignment::Model>> {
    state.services.chitoor_projects.get_project(&user, id).await?;
    let assignments = state
        .services
        .assignments
        .list_assignments(
            &user,
            AssignmentFilter {
                project_id: Some(id),
                customer_name: None,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(assignments)))
}
