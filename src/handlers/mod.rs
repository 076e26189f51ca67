pub mod assignments;
pub mod chitoor_projects;
pub mod common;
pub mod estimations;
pub mod invoices;
pub mod logistics;
pub mod payments;
pub mod procurement;
pub mod projects;
pub mod reports;
pub mod service_tickets;
pub mod stock;
pub mod users;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    assignments::AssignmentService, chitoor_projects::ChitoorProjectService,
    estimations::EstimationService, invoicing::InvoiceService, logistics::LogisticsService,
    payments::PaymentService, procurement::ProcurementService, projects::ProjectService,
    reports::ReportService, service_tickets::ServiceTicketService, stock::StockService,
    users::UserService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub projects: Arc<ProjectService>,
    pub chitoor_projects: Arc<ChitoorProjectService>,
    pub payments: Arc<PaymentService>,
    pub invoices: Arc<InvoiceService>,
    pub estimations: Arc<EstimationService>,
    pub service_tickets: Arc<ServiceTicketService>,
    pub logistics: Arc<LogisticsService>,
    pub procurement: Arc<ProcurementService>,
    pub stock: Arc<StockService>,
    pub assignments: Arc<AssignmentService>,
    pub users: Arc<UserService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let threshold = config.low_stock_threshold;

        Self {
            projects: Arc::new(ProjectService::new(db_pool.clone(), event_sender.clone())),
            chitoor_projects: Arc::new(ChitoorProjectService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.currency.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.invoice_prefix.clone(),
                config.default_gst_rate,
            )),
            estimations: Arc::new(EstimationService::new(db_pool.clone())),
            service_tickets: Arc::new(ServiceTicketService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            logistics: Arc::new(LogisticsService::new(db_pool.clone(), event_sender.clone())),
            procurement: Arc::new(ProcurementService::new(
                db_pool.clone(),
                event_sender.clone(),
                threshold,
            )),
            stock: Arc::new(StockService::new(
                db_pool.clone(),
                event_sender.clone(),
                threshold,
            )),
            assignments: Arc::new(AssignmentService::new(
                db_pool.clone(),
                event_sender.clone(),
                threshold,
            )),
            users: Arc::new(UserService::new(db_pool.clone(), event_sender)),
            reports: Arc::new(ReportService::new(db_pool, threshold)),
        }
    }
}
