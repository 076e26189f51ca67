use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{paginated, validate_input, PageParams};
use crate::{
    auth::AuthUser,
    entities::app_user::{self, UserRole},
    errors::ServiceError,
    handlers::AppState,
    services::users::{CreateUserInput, UpdateUserInput},
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
        .route("/:id/deactivate", post(deactivate_user))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Identity-provider subject; generated when omitted
    pub id: Option<Uuid>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub regions: Option<Vec<String>>,
    pub modules: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// The signed-in user's resolved session
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<AuthUser>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn me(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users listed", body = ApiResponse<PaginatedResponse<app_user::Model>>)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<PaginatedResponse<app_user::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let (items, total) = state
        .services
        .users
        .list_users(query.include_inactive, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User fetched", body = ApiResponse<app_user::Model>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<app_user::Model> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<app_user::Model>),
        (status = 403, description = "Only admins may grant admin access", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<app_user::Model>>), ServiceError> {
    validate_input(&payload)?;

    let user = state
        .services
        .users
        .create_user(
            &actor,
            CreateUserInput {
                id: payload.id,
                email: payload.email,
                full_name: payload.full_name,
                role: payload.role,
                regions: payload.regions,
                modules: payload.modules,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<app_user::Model>)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<app_user::Model> {
    validate_input(&payload)?;

    let user = state
        .services
        .users
        .update_user(
            &actor,
            id,
            UpdateUserInput {
                full_name: payload.full_name,
                role: payload.role,
                regions: payload.regions,
                modules: payload.modules,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<app_user::Model>),
        (status = 400, description = "Cannot deactivate yourself", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<app_user::Model> {
    let user = state.services.users.deactivate_user(&actor, id).await?;
    Ok(Json(ApiResponse::success(user)))
}
