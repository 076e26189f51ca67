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
use crate::{
    auth::AuthUser,
    entities::payment_history::{self, ProjectKind},
    entities::{project, project_assignment},
    errors::ServiceError,
    handlers::AppState,
    services::assignments::AssignmentFilter,
    services::payments::ProjectBalance,
    services::projects::{CreateProjectInput, ProjectFilter, UpdateProjectInput},
    stages::StageMove,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn project_routes() -> Router<AppState> {
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
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub region: String,
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
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub region: Option<String>,
    pub capacity_kw: Option<Decimal>,
    pub proposal_amount: Option<Decimal>,
    pub advance_payment: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetStageRequest {
    #[validate(length(min = 1))]
    pub stage: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub region: Option<String>,
    pub stage: Option<String>,
    /// Matches part of the customer name
    pub search: Option<String>,
}

/// Create a project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<project::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Region not granted", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<project::Model>>), ServiceError> {
    validate_input(&payload)?;

    let created = state
        .services
        .projects
        .create_project(
            &user,
            CreateProjectInput {
                customer_name: payload.customer_name,
                phone: payload.phone,
                address: payload.address,
                region: payload.region,
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

/// List projects in the caller's regions
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projects listed", body = ApiResponse<PaginatedResponse<project::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<PaginatedResponse<project::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = ProjectFilter {
        region: non_blank(query.region),
        stage: non_blank(query.stage),
        search: query.search,
    };
    let (items, total) = state
        .services
        .projects
        .list_projects(&user, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

/// Get a project by id
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project fetched", body = ApiResponse<project::Model>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<project::Model> {
    let project = state.services.projects.get_project(&user, id).await?;
    Ok(Json(ApiResponse::success(project)))
}

/// Update project details
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<project::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<project::Model> {
    validate_input(&payload)?;

    let updated = state
        .services
        .projects
        .update_project(
            &user,
            id,
            UpdateProjectInput {
                customer_name: payload.customer_name,
                phone: payload.phone,
                address: payload.address,
                region: payload.region,
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

/// Delete a project without payments or assignments
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 409, description = "Project has payments or assignments", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.projects.delete_project(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a project to the next stage
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/advance",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Stage advanced", body = ApiResponse<project::Model>),
        (status = 400, description = "Already at the final stage", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn advance_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<project::Model> {
    let project = state
        .services
        .projects
        .move_stage(&user, id, StageMove::Advance)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// Move a project back one stage
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/regress",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Stage regressed", body = ApiResponse<project::Model>),
        (status = 400, description = "Already at the first stage", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn regress_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<project::Model> {
    let project = state
        .services
        .projects
        .move_stage(&user, id, StageMove::Regress)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// Set a project's stage explicitly
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}/stage",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = SetStageRequest,
    responses(
        (status = 200, description = "Stage set", body = ApiResponse<project::Model>),
        (status = 400, description = "Unknown stage", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn set_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStageRequest>,
) -> ApiResult<project::Model> {
    validate_input(&payload)?;
    let project = state
        .services
        .projects
        .set_stage(&user, id, payload.stage.trim())
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// Proposal, advance, payments and outstanding balance
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/balance",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Balance computed", body = ApiResponse<ProjectBalance>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn project_balance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ProjectBalance> {
    let balance = state
        .services
        .payments
        .project_balance(&user, ProjectKind::Project, id)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// Payment history of a project, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/payments",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Payments listed", body = ApiResponse<Vec<payment_history::Model>>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn project_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<payment_history::Model>> {
    let payments = state
        .services
        .payments
        .list_for_project(&user, ProjectKind::Project, id)
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

/// Modules and inverters assigned to a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/assignments",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Assignments listed", body = ApiResponse<Vec<project_assignment::Model>>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn project_assignments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<project_assignment::Model>> {
    state.services.projects.get_project(&user, id).await?;
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
