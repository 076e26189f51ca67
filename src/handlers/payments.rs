use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{paginated, validate_input, PageParams};
use crate::{
    auth::AuthUser,
    entities::payment_history::{self, PaymentMode, ProjectKind},
    errors::ServiceError,
    handlers::AppState,
    services::payments::{LedgerEntry, LedgerFilter, PaymentReceipt, RecordPaymentInput},
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ledger).post(record_payment))
        .route("/:id", delete(delete_payment))
        .route("/:id/receipt", get(payment_receipt))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    pub project_id: Uuid,
    /// Defaults to `project`
    #[serde(default)]
    pub project_kind: Option<ProjectKind>,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LedgerQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub project_kind: Option<ProjectKind>,
    pub project_id: Option<Uuid>,
    /// Paid at or after
    pub from: Option<DateTime<Utc>>,
    /// Paid at or before
    pub to: Option<DateTime<Utc>>,
}

/// Record a payment against a project
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<payment_history::Model>),
        (status = 400, description = "Amount is not positive or exceeds the outstanding balance", body = crate::errors::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<payment_history::Model>>), ServiceError> {
    validate_input(&payload)?;

    let payment = state
        .services
        .payments
        .record_payment(
            &user,
            RecordPaymentInput {
                project_id: payload.project_id,
                project_kind: payload.project_kind.unwrap_or(ProjectKind::Project),
                amount: payload.amount,
                payment_mode: payload.payment_mode,
                reference: payload.reference,
                paid_at: payload.paid_at,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(payment))))
}

/// Finance ledger with tax attributed to each payment
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Ledger listed", body = ApiResponse<PaginatedResponse<LedgerEntry>>)
    ),
    tag = "payments"
)]
pub async fn ledger(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<PaginatedResponse<LedgerEntry>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = LedgerFilter {
        project_kind: query.project_kind,
        project_id: query.project_id,
        from: query.from,
        to: query.to,
    };
    let (items, total) = state
        .services
        .payments
        .ledger(&user, filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

/// Receipt data for one payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}/receipt",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Receipt built", body = ApiResponse<PaymentReceipt>),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn payment_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<PaymentReceipt> {
    let receipt = state.services.payments.receipt(&user, id).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.payments.delete_payment(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
