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

use super::common::{non_blank, paginated, validate_input, PageParams};
use crate::{
    auth::AuthUser,
    entities::service_ticket::{self, TicketPriority},
    errors::ServiceError,
    handlers::AppState,
    services::service_tickets::{CreateTicketInput, TicketFilter, UpdateTicketInput},
    stages::StageMove,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn service_ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route(
            "/:id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/:id/advance", post(advance_ticket))
        .route("/:id/regress", post(regress_ticket))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    pub project_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 64))]
    pub region: String,
    #[validate(length(min = 1, max = 200))]
    pub issue: String,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketRequest {
    #[validate(length(min = 1, max = 200))]
    pub issue: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub region: Option<String>,
    pub priority: Option<TicketPriority>,
}

/// Open a service ticket
#[utoipa::path(
    post,
    path = "/api/v1/service-tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = ApiResponse<service_ticket::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "service-tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<service_ticket::Model>>), ServiceError> {
    validate_input(&payload)?;

    let ticket = state
        .services
        .service_tickets
        .create_ticket(
            &user,
            CreateTicketInput {
                project_id: payload.project_id,
                customer_name: payload.customer_name,
                region: payload.region,
                issue: payload.issue,
                description: payload.description,
                priority: payload.priority,
                assigned_to: payload.assigned_to,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(ticket))))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-tickets",
    params(TicketListQuery),
    responses(
        (status = 200, description = "Tickets listed", body = ApiResponse<PaginatedResponse<service_ticket::Model>>)
    ),
    tag = "service-tickets"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> ApiResult<PaginatedResponse<service_ticket::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = TicketFilter {
        status: non_blank(query.status),
        region: non_blank(query.region),
        priority: query.priority,
    };
    let (items, total) = state
        .services
        .service_tickets
        .list_tickets(&user, filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket fetched", body = ApiResponse<service_ticket::Model>),
        (status = 404, description = "Ticket not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<service_ticket::Model> {
    let ticket = state.services.service_tickets.get_ticket(&user, id).await?;
    Ok(Json(ApiResponse::success(ticket)))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated", body = ApiResponse<service_ticket::Model>)
    ),
    tag = "service-tickets"
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketRequest>,
) -> ApiResult<service_ticket::Model> {
    validate_input(&payload)?;

    let ticket = state
        .services
        .service_tickets
        .update_ticket(
            &user,
            id,
            UpdateTicketInput {
                issue: payload.issue,
                description: payload.description,
                priority: payload.priority,
                assigned_to: payload.assigned_to,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(ticket)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 204, description = "Ticket deleted")
    ),
    tag = "service-tickets"
)]
pub async fn delete_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.service_tickets.delete_ticket(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/service-tickets/{id}/advance",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<service_ticket::Model>),
        (status = 400, description = "Ticket already closed", body = crate::errors::ErrorResponse)
    ),
    tag = "service-tickets"
)]
pub async fn advance_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<service_ticket::Model> {
    let ticket = state
        .services
        .service_tickets
        .move_status(&user, id, StageMove::Advance)
        .await?;
    Ok(Json(ApiResponse::success(ticket)))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-tickets/{id}/regress",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Status regressed", body = ApiResponse<service_ticket::Model>),
        (status = 400, description = "Ticket is still open", body = crate::errors::ErrorResponse)
    ),
    tag = "service-tickets"
)]
pub async fn regress_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<service_ticket::Model> {
    let ticket = state
        .services
        .service_tickets
        .move_status(&user, id, StageMove::Regress)
        .await?;
    Ok(Json(ApiResponse::success(ticket)))
}
