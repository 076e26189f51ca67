pub mod app_user;
pub mod chitoor_project;
pub mod estimation_cost;
pub mod logistics_record;
pub mod payment_history;
pub mod procurement_item;
pub mod project;
pub mod project_assignment;
pub mod service_ticket;
pub mod stock_item;
pub mod tax_invoice;
