use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solar Console API",
        version = "1.0.0",
        description = r#"
# Solar Console API

Back office for a rooftop solar installer.

## Features

- **Projects**: customer installations moving through an ordered set of stages
- **Chitoor Projects**: the Chitoor regional book, tracked on its own stage list
- **Finance**: payments against a project's balance, receipts, ledger and GST invoices
- **Estimations**: per-kW costing with margin
- **Stock**: hardware catalog, manual adjustments and low-stock alerts
- **Procurement**: purchase requests; receipt books the quantity into stock
- **Assignments**: modules and inverters handed to a customer's project
- **Logistics**: material dispatches to site
- **Service**: after-sales tickets
- **HR**: console users, their regions and modules
- **Reports**: portfolio, collections, stock valuation and ticket summaries

## Authentication

Every `/api/v1` endpoint requires a bearer token issued by the identity provider:

```
Authorization: Bearer <jwt>
```

The token subject must match an active console user. Each feature area is
gated by a module grant, and rows are filtered to the user's regions.

## Pagination

List endpoints accept `page` (default 1) and `limit` (clamped to the
configured maximum).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "projects", description = "Residential project tracking"),
        (name = "chitoor-projects", description = "Chitoor regional projects"),
        (name = "payments", description = "Payments, receipts and ledger"),
        (name = "invoices", description = "GST tax invoices"),
        (name = "estimations", description = "Cost estimations"),
        (name = "service-tickets", description = "After-sales service tickets"),
        (name = "logistics", description = "Material dispatches"),
        (name = "procurements", description = "Purchase requests"),
        (name = "stock", description = "Hardware catalog and quantities"),
        (name = "assignments", description = "Module and inverter assignments"),
        (name = "users", description = "Console users and sessions"),
        (name = "reports", description = "Aggregated reports")
    ),
    paths(
        // Projects
        crate::handlers::projects::list_projects,
        crate::handlers::projects::create_project,
        crate::handlers::projects::get_project,
        crate::handlers::projects::update_project,
        crate::handlers::projects::delete_project,
        crate::handlers::projects::advance_stage,
        crate::handlers::projects::regress_stage,
        crate::handlers::projects::set_stage,
        crate::handlers::projects::project_balance,
        crate::handlers::projects::project_payments,
        crate::handlers::projects::project_assignments,

        // Chitoor projects
        crate::handlers::chitoor_projects::list_projects,
        crate::handlers::chitoor_projects::create_project,
        crate::handlers::chitoor_projects::get_project,
        crate::handlers::chitoor_projects::update_project,
        crate::handlers::chitoor_projects::delete_project,
        crate::handlers::chitoor_projects::advance_stage,
        crate::handlers::chitoor_projects::regress_stage,
        crate::handlers::chitoor_projects::set_stage,
        crate::handlers::chitoor_projects::project_balance,
        crate::handlers::chitoor_projects::project_payments,
        crate::handlers::chitoor_projects::project_assignments,

        // Finance
        crate::handlers::payments::record_payment,
        crate::handlers::payments::ledger,
        crate::handlers::payments::payment_receipt,
        crate::handlers::payments::delete_payment,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::delete_invoice,

        // Estimations
        crate::handlers::estimations::create_estimate,
        crate::handlers::estimations::list_estimates,
        crate::handlers::estimations::get_estimate,
        crate::handlers::estimations::delete_estimate,

        // Service
        crate::handlers::service_tickets::create_ticket,
        crate::handlers::service_tickets::list_tickets,
        crate::handlers::service_tickets::get_ticket,
        crate::handlers::service_tickets::update_ticket,
        crate::handlers::service_tickets::delete_ticket,
        crate::handlers::service_tickets::advance_ticket,
        crate::handlers::service_tickets::regress_ticket,

        // Logistics
        crate::handlers::logistics::create_dispatch,
        crate::handlers::logistics::list_dispatches,
        crate::handlers::logistics::get_dispatch,
        crate::handlers::logistics::update_dispatch,
        crate::handlers::logistics::delete_dispatch,
        crate::handlers::logistics::advance_dispatch,
        crate::handlers::logistics::regress_dispatch,

        // Procurement
        crate::handlers::procurement::create_procurement,
        crate::handlers::procurement::list_procurements,
        crate::handlers::procurement::get_procurement,
        crate::handlers::procurement::update_procurement,
        crate::handlers::procurement::delete_procurement,
        crate::handlers::procurement::advance_procurement,
        crate::handlers::procurement::regress_procurement,

        // Stock
        crate::handlers::stock::create_item,
        crate::handlers::stock::list_items,
        crate::handlers::stock::low_stock,
        crate::handlers::stock::get_item,
        crate::handlers::stock::update_item,
        crate::handlers::stock::delete_item,
        crate::handlers::stock::adjust_item,
        crate::handlers::assignments::create_assignment,
        crate::handlers::assignments::list_assignments,
        crate::handlers::assignments::get_assignment,
        crate::handlers::assignments::delete_assignment,

        // HR
        crate::handlers::users::me,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::deactivate_user,

        // Reports
        crate::handlers::reports::project_summary,
        crate::handlers::reports::monthly_collections,
        crate::handlers::reports::stock_valuation,
        crate::handlers::reports::procurement_spend,
        crate::handlers::reports::ticket_summary
    ),
    components(
        schemas(
            // Entities
            crate::entities::project::Model,
            crate::entities::chitoor_project::Model,
            crate::entities::payment_history::Model,
            crate::entities::payment_history::ProjectKind,
            crate::entities::payment_history::PaymentMode,
            crate::entities::tax_invoice::Model,
            crate::entities::estimation_cost::Model,
            crate::entities::service_ticket::Model,
            crate::entities::service_ticket::TicketPriority,
            crate::entities::logistics_record::Model,
            crate::entities::procurement_item::Model,
            crate::entities::stock_item::Model,
            crate::entities::stock_item::StockCategory,
            crate::entities::project_assignment::Model,
            crate::entities::app_user::Model,
            crate::entities::app_user::UserRole,

            // Requests
            crate::handlers::projects::CreateProjectRequest,
            crate::handlers::projects::UpdateProjectRequest,
            crate::handlers::projects::SetStageRequest,
            crate::handlers::chitoor_projects::CreateChitoorProjectRequest,
            crate::handlers::chitoor_projects::UpdateChitoorProjectRequest,
            crate::handlers::payments::RecordPaymentRequest,
            crate::handlers::invoices::CreateInvoiceRequest,
            crate::handlers::estimations::CreateEstimateRequest,
            crate::handlers::service_tickets::CreateTicketRequest,
            crate::handlers::service_tickets::UpdateTicketRequest,
            crate::handlers::logistics::CreateDispatchRequest,
            crate::handlers::logistics::UpdateDispatchRequest,
            crate::handlers::procurement::CreateProcurementRequest,
            crate::handlers::procurement::UpdateProcurementRequest,
            crate::handlers::stock::CreateStockItemRequest,
            crate::handlers::stock::UpdateStockItemRequest,
            crate::handlers::stock::AdjustStockRequest,
            crate::handlers::assignments::CreateAssignmentRequest,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,

            // Computed views
            crate::services::payments::ProjectBalance,
            crate::services::payments::LedgerEntry,
            crate::services::payments::PaymentReceipt,
            crate::services::invoicing::GstBreakdown,
            crate::services::estimations::EstimateBreakdown,
            crate::services::reports::ProjectSummary,
            crate::services::reports::CategoryValuation,
            crate::services::reports::StockValuation,
            crate::services::reports::VendorSpend,
            crate::services::reports::TicketSummary,
            crate::auth::AuthUser,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_feature_area() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Solar Console API"));
        assert!(json.contains("/api/v1/projects/{id}/advance"));
        assert!(json.contains("/api/v1/chitoor-projects"));
        assert!(json.contains("/api/v1/stock/low"));
        assert!(json.contains("/api/v1/reports/collections"));
        assert!(json.contains("bearer_auth"));
    }
}
