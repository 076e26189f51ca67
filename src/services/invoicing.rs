use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{normalize_region, project_ref, require_text, round_money, scope_to_regions};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::payment_history::ProjectKind,
    entities::tax_invoice,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// GST split of a taxable amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GstBreakdown {
    pub taxable_amount: Decimal,
    pub gst_rate: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
}

/// `gst = taxable * rate / 100`; intra-state halves go to CGST and SGST, inter-state to IGST.
///
/// When the tax has an odd paisa, SGST takes the remainder so the halves always sum to the tax.
pub fn compute_gst(
    taxable_amount: Decimal,
    gst_rate: Decimal,
    inter_state: bool,
) -> Result<GstBreakdown, ServiceError> {
    if taxable_amount.is_sign_negative() && !taxable_amount.is_zero() {
        return Err(ServiceError::ValidationError(
            "taxable_amount cannot be negative".to_string(),
        ));
    }
    if gst_rate < Decimal::ZERO || gst_rate > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(
            "gst_rate must be between 0 and 100".to_string(),
        ));
    }

    let taxable_amount = round_money(taxable_amount);
    let total_tax = round_money(taxable_amount * gst_rate / Decimal::ONE_HUNDRED);
    let (cgst, sgst, igst) = if inter_state {
        (Decimal::ZERO, Decimal::ZERO, total_tax)
    } else {
        let cgst = round_money(total_tax / Decimal::TWO);
        (cgst, total_tax - cgst, Decimal::ZERO)
    };

    Ok(GstBreakdown {
        taxable_amount,
        gst_rate,
        cgst,
        sgst,
        igst,
        total_tax,
        total_amount: taxable_amount + total_tax,
    })
}

/// `<prefix>-<YYYY>-<seq:05>`
pub fn format_invoice_number(prefix: &str, year: i32, seq: u32) -> String {
    format!("{}-{}-{:05}", prefix, year, seq)
}

/// Sequence following the highest number already issued for the prefix and year
pub fn next_sequence<'a>(existing: impl IntoIterator<Item = &'a str>, prefix: &str, year: i32) -> u32 {
    let head = format!("{}-{}-", prefix, year);
    existing
        .into_iter()
        .filter_map(|number| number.strip_prefix(head.as_str()))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub project_id: Option<Uuid>,
    pub project_kind: Option<ProjectKind>,
    pub customer_name: Option<String>,
    pub customer_gstin: Option<String>,
    pub region: Option<String>,
    pub place_of_supply: String,
    pub inter_state: bool,
    pub taxable_amount: Decimal,
    pub gst_rate: Option<Decimal>,
    pub issued_at: Option<DateTime<Utc>>,
}

/// Service for GST tax invoices
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    prefix: String,
    default_gst_rate: Decimal,
}

impl InvoiceService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        prefix: String,
        default_gst_rate: Decimal,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            prefix,
            default_gst_rate,
        }
    }

    async fn allocate_number<C: ConnectionTrait>(&self, db: &C, year: i32) -> Result<String, ServiceError> {
        let head = format!("{}-{}-", self.prefix, year);
        let numbers: Vec<String> = tax_invoice::Entity::find()
            .select_only()
            .column(tax_invoice::Column::InvoiceNumber)
            .filter(tax_invoice::Column::InvoiceNumber.starts_with(head.as_str()))
            .into_tuple()
            .all(db)
            .await?;
        let seq = next_sequence(numbers.iter().map(String::as_str), &self.prefix, year);
        Ok(format_invoice_number(&self.prefix, year, seq))
    }

    #[instrument(skip(self, user, input))]
    pub async fn create_invoice(
        &self,
        user: &AuthUser,
        input: CreateInvoiceInput,
    ) -> Result<tax_invoice::Model, ServiceError> {
        let db = &*self.db_pool;

        let (customer_name, region, project_kind) = match input.project_id {
            Some(project_id) => {
                let kind = input.project_kind.unwrap_or(ProjectKind::Project);
                let project = project_ref::load(db, kind, project_id).await?;
                let name = input
                    .customer_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(project.customer_name);
                (name, project.region, Some(kind))
            }
            None => {
                let name = require_text("customer_name", input.customer_name.as_deref().unwrap_or(""))?;
                let region = normalize_region(input.region.as_deref().unwrap_or(""))?;
                (name, region, None)
            }
        };
        user.ensure_region(&region)?;

        let gst = compute_gst(
            input.taxable_amount,
            input.gst_rate.unwrap_or(self.default_gst_rate),
            input.inter_state,
        )?;
        let issued_at = input.issued_at.unwrap_or_else(Utc::now);
        let invoice_number = self.allocate_number(db, issued_at.year()).await?;

        let invoice = tax_invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(invoice_number),
            project_id: Set(input.project_id),
            project_kind: Set(project_kind),
            customer_name: Set(customer_name),
            customer_gstin: Set(input.customer_gstin.filter(|g| !g.trim().is_empty())),
            region: Set(region),
            place_of_supply: Set(require_text("place_of_supply", &input.place_of_supply)?),
            inter_state: Set(input.inter_state),
            taxable_amount: Set(gst.taxable_amount),
            gst_rate: Set(gst.gst_rate),
            cgst: Set(gst.cgst),
            sgst: Set(gst.sgst),
            igst: Set(gst.igst),
            total_amount: Set(gst.total_amount),
            issued_at: Set(issued_at),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(invoice_number = %invoice.invoice_number, total = %invoice.total_amount, "tax invoice issued");
        self.event_sender
            .send_or_log(Event::InvoiceIssued {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                total_amount: invoice.total_amount,
            })
            .await;

        Ok(invoice)
    }

    #[instrument(skip(self, user))]
    pub async fn get_invoice(&self, user: &AuthUser, id: Uuid) -> Result<tax_invoice::Model, ServiceError> {
        let invoice = tax_invoice::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tax invoice", id))?;
        user.ensure_region(&invoice.region)?;
        Ok(invoice)
    }

    #[instrument(skip(self, user))]
    pub async fn list_invoices(
        &self,
        user: &AuthUser,
        project_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<tax_invoice::Model>, u64), ServiceError> {
        let mut query = scope_to_regions(tax_invoice::Entity::find(), tax_invoice::Column::Region, user);
        if let Some(project_id) = project_id {
            query = query.filter(tax_invoice::Column::ProjectId.eq(project_id));
        }

        let paginator = query
            .order_by_desc(tax_invoice::Column::IssuedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, user))]
    pub async fn delete_invoice(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.get_invoice(user, id).await?;
        tax_invoice::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn intra_state_splits_into_halves() {
        let gst = compute_gst(dec!(100000), dec!(12), false).unwrap();
        assert_eq!(gst.total_tax, dec!(12000));
        assert_eq!(gst.cgst, dec!(6000));
        assert_eq!(gst.sgst, dec!(6000));
        assert_eq!(gst.igst, Decimal::ZERO);
        assert_eq!(gst.total_amount, dec!(112000));
    }

    #[test]
    fn inter_state_is_igst_only() {
        let gst = compute_gst(dec!(50000), dec!(18), true).unwrap();
        assert_eq!(gst.igst, dec!(9000));
        assert_eq!(gst.cgst + gst.sgst, Decimal::ZERO);
    }

    #[test]
    fn odd_paisa_still_sums_to_tax() {
        let gst = compute_gst(dec!(0.25), dec!(12), false).unwrap();
        assert_eq!(gst.total_tax, dec!(0.03));
        assert_eq!(gst.cgst + gst.sgst, gst.total_tax);
    }

    #[test]
    fn rate_outside_percentage_is_rejected() {
        assert!(compute_gst(dec!(100), dec!(101), false).is_err());
        assert!(compute_gst(dec!(100), dec!(-1), false).is_err());
    }

    #[test]
    fn invoice_numbers_continue_from_highest() {
        assert_eq!(format_invoice_number("INV", 2026, 7), "INV-2026-00007");
        let issued = ["INV-2026-00002", "INV-2026-00011", "INV-2025-00099", "OTHER-2026-00500"];
        assert_eq!(next_sequence(issued.iter().copied(), "INV", 2026), 12);
        assert_eq!(next_sequence(std::iter::empty(), "INV", 2027), 1);
    }
}
