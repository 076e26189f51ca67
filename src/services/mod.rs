pub mod assignments;
pub mod chitoor_projects;
pub mod estimations;
pub mod invoicing;
pub mod logistics;
pub mod payments;
pub mod procurement;
pub mod project_ref;
pub mod projects;
pub mod reports;
pub mod service_tickets;
pub mod stock;
pub mod users;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::auth::AuthUser;
use crate::errors::ServiceError;

/// Restricts a query to the regions the session may see
pub(crate) fn scope_to_regions<E>(query: Select<E>, column: E::Column, user: &AuthUser) -> Select<E>
where
    E: EntityTrait,
{
    match user.region_scope() {
        None => query,
        Some(regions) => query.filter(column.is_in(regions)),
    }
}

/// Region keys are stored trimmed and lowercase
pub(crate) fn normalize_region(region: &str) -> Result<String, ServiceError> {
    let region = region.trim().to_ascii_lowercase();
    if region.is_empty() {
        return Err(ServiceError::ValidationError(
            "region is required".to_string(),
        ));
    }
    Ok(region)
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} is required",
            field
        )));
    }
    Ok(value.to_string())
}

pub(crate) fn require_non_negative(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(value)
}

pub(crate) fn require_positive_qty(field: &str, value: i32) -> Result<i32, ServiceError> {
    if value <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(value)
}

/// Money is kept at paisa precision
pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Rows to skip for a 1-based page when paging in memory
pub(crate) fn page_offset(page: u64, limit: u64) -> usize {
    let offset = page.max(1).saturating_sub(1).saturating_mul(limit);
    usize::try_from(offset).unwrap_or(usize::MAX)
}

pub(crate) fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}
