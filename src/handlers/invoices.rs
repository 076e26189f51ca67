use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
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
    entities::payment_history::ProjectKind,
    entities::tax_invoice,
    errors::ServiceError,
    handlers::AppState,
    services::invoicing::CreateInvoiceInput,
    ApiResponse, ApiResult, PaginatedResponse,
};

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice).delete(delete_invoice))
}

/// Either `project_id` or `customer_name` + `region` identifies the buyer
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub project_id: Option<Uuid>,
    pub project_kind: Option<ProjectKind>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(equal = 15))]
    pub customer_gstin: Option<String>,
    pub region: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub place_of_supply: String,
    #[serde(default)]
    pub inter_state: bool,
    pub taxable_amount: Decimal,
    /// Percentage; the configured default applies when omitted
    pub gst_rate: Option<Decimal>,
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub project_id: Option<Uuid>,
}

/// Issue a GST tax invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice issued", body = ApiResponse<tax_invoice::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<tax_invoice::Model>>), ServiceError> {
    validate_input(&payload)?;

    let invoice = state
        .services
        .invoices
        .create_invoice(
            &user,
            CreateInvoiceInput {
                project_id: payload.project_id,
                project_kind: payload.project_kind,
                customer_name: payload.customer_name,
                customer_gstin: payload.customer_gstin,
                region: payload.region,
                place_of_supply: payload.place_of_supply,
                inter_state: payload.inter_state,
                taxable_amount: payload.taxable_amount,
                gst_rate: payload.gst_rate,
                issued_at: payload.issued_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(invoice))))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(InvoiceListQuery),
    responses(
        (status = 200, description = "Invoices listed", body = ApiResponse<PaginatedResponse<tax_invoice::Model>>)
    ),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InvoiceListQuery>,
) -> ApiResult<PaginatedResponse<tax_invoice::Model>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let (items, total) = state
        .services
        .invoices
        .list_invoices(&user, query.project_id, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice fetched", body = ApiResponse<tax_invoice::Model>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<tax_invoice::Model> {
    let invoice = state.services.invoices.get_invoice(&user, id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.invoices.delete_invoice(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
