use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::project_ref::{self, ProjectSnapshot};
use super::{page_offset, round_money};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::payment_history::{self, PaymentMode, ProjectKind},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// `proposal - advance - paid`
pub fn outstanding_balance(proposal_amount: Decimal, advance_payment: Decimal, paid: Decimal) -> Decimal {
    round_money(proposal_amount - advance_payment - paid)
}

/// Share of the project's tax carried by one payment, pro rata to its amount
pub fn attributed_tax(project_tax: Decimal, payment_amount: Decimal, total_payments: Decimal) -> Decimal {
    if total_payments.is_zero() {
        return Decimal::ZERO;
    }
    round_money(project_tax * payment_amount / total_payments)
}

pub fn sum_amounts<'a>(payments: impl IntoIterator<Item = &'a payment_history::Model>) -> Decimal {
    payments.into_iter().map(|p| p.amount).sum()
}

/// Validates a new payment against the balance it would draw down
pub fn check_payment_amount(amount: Decimal, outstanding: Decimal) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "payment amount must be greater than zero".to_string(),
        ));
    }
    if amount > outstanding {
        return Err(ServiceError::ValidationError(format!(
            "payment amount {} exceeds outstanding balance {}",
            amount.round_dp(2),
            outstanding.round_dp(2)
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    pub project_id: Uuid,
    pub project_kind: ProjectKind,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub project_kind: Option<ProjectKind>,
    pub project_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Project balance after every recorded payment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectBalance {
    pub project_id: Uuid,
    pub project_kind: ProjectKind,
    pub customer_name: String,
    pub proposal_amount: Decimal,
    pub advance_payment: Decimal,
    pub paid_amount: Decimal,
    pub outstanding_balance: Decimal,
    pub tax_amount: Decimal,
    pub payment_count: u64,
}

/// Finance ledger row
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerEntry {
    #[serde(flatten)]
    #[schema(inline)]
    pub payment: payment_history::Model,
    pub customer_name: String,
    pub region: String,
    pub attributed_tax: Decimal,
}

/// Everything a printed receipt shows
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentReceipt {
    pub receipt_number: String,
    pub payment: payment_history::Model,
    pub project: ProjectSnapshot,
    pub currency: String,
    pub total_paid: Decimal,
    pub balance_after_payment: Decimal,
    pub attributed_tax: Decimal,
}

pub fn receipt_number(payment_id: Uuid) -> String {
    let simple = payment_id.simple().to_string().to_ascii_uppercase();
    format!("RCPT-{}", &simple[..8])
}

/// Service for payment history, balances and receipts
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    currency: String,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, currency: String) -> Self {
        Self {
            db_pool,
            event_sender,
            currency,
        }
    }

    async fn payments_for<C: ConnectionTrait>(
        db: &C,
        kind: ProjectKind,
        project_id: Uuid,
    ) -> Result<Vec<payment_history::Model>, ServiceError> {
        Ok(payment_history::Entity::find()
            .filter(payment_history::Column::ProjectKind.eq(kind))
            .filter(payment_history::Column::ProjectId.eq(project_id))
            .order_by_asc(payment_history::Column::PaidAt)
            .order_by_asc(payment_history::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Records a payment. Over-balance or non-positive amounts write nothing.
    #[instrument(skip(self, user, input), fields(project_id = %input.project_id))]
    pub async fn record_payment(
        &self,
        user: &AuthUser,
        input: RecordPaymentInput,
    ) -> Result<payment_history::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let project = project_ref::load(&txn, input.project_kind, input.project_id).await?;
        user.ensure_region(&project.region)?;

        let paid = sum_amounts(&Self::payments_for(&txn, input.project_kind, input.project_id).await?);
        let outstanding = outstanding_balance(project.proposal_amount, project.advance_payment, paid);
        check_payment_amount(input.amount, outstanding)?;

        let payment = payment_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            project_kind: Set(input.project_kind),
            amount: Set(round_money(input.amount)),
            payment_mode: Set(input.payment_mode),
            reference: Set(input.reference.filter(|r| !r.trim().is_empty())),
            paid_at: Set(input.paid_at.unwrap_or_else(Utc::now)),
            recorded_by: Set(Some(user.user_id)),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        let outstanding_after = outstanding - payment.amount;
        counter!("solar_console_payments_recorded_total", 1);
        info!(payment_id = %payment.id, amount = %payment.amount, "payment recorded");
        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                payment_id: payment.id,
                project_id: payment.project_id,
                kind: payment.project_kind,
                amount: payment.amount,
                outstanding_after,
            })
            .await;

        Ok(payment)
    }

    #[instrument(skip(self, user))]
    pub async fn list_for_project(
        &self,
        user: &AuthUser,
        kind: ProjectKind,
        project_id: Uuid,
    ) -> Result<Vec<payment_history::Model>, ServiceError> {
        let db = &*self.db_pool;
        let project = project_ref::load(db, kind, project_id).await?;
        user.ensure_region(&project.region)?;
        Self::payments_for(db, kind, project_id).await
    }

    #[instrument(skip(self, user))]
    pub async fn project_balance(
        &self,
        user: &AuthUser,
        kind: ProjectKind,
        project_id: Uuid,
    ) -> Result<ProjectBalance, ServiceError> {
        let db = &*self.db_pool;
        let project = project_ref::load(db, kind, project_id).await?;
        user.ensure_region(&project.region)?;

        let payments = Self::payments_for(db, kind, project_id).await?;
        let paid = sum_amounts(&payments);

        Ok(ProjectBalance {
            project_id,
            project_kind: kind,
            customer_name: project.customer_name,
            proposal_amount: project.proposal_amount,
            advance_payment: project.advance_payment,
            paid_amount: paid,
            outstanding_balance: outstanding_balance(
                project.proposal_amount,
                project.advance_payment,
                paid,
            ),
            tax_amount: project.tax_amount,
            payment_count: payments.len() as u64,
        })
    }

    /// Finance ledger across both project kinds, newest first, with attributed tax per row
    #[instrument(skip(self, user))]
    pub async fn ledger(
        &self,
        user: &AuthUser,
        filter: LedgerFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LedgerEntry>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = payment_history::Entity::find();
        if let Some(kind) = filter.project_kind {
            query = query.filter(payment_history::Column::ProjectKind.eq(kind));
        }
        if let Some(project_id) = filter.project_id {
            query = query.filter(payment_history::Column::ProjectId.eq(project_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(payment_history::Column::PaidAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(payment_history::Column::PaidAt.lte(to));
        }
        let payments = query
            .order_by_desc(payment_history::Column::PaidAt)
            .all(db)
            .await?;

        let mut refs: Vec<(ProjectKind, Uuid)> =
            payments.iter().map(|p| (p.project_kind, p.project_id)).collect();
        refs.sort_by_key(|(kind, id)| (kind.to_string(), *id));
        refs.dedup();
        let projects = project_ref::load_many(db, &refs).await?;

        // Attribution is over every payment of a project, not just the filtered window
        let project_ids: Vec<Uuid> = refs.iter().map(|(_, id)| *id).collect();
        let mut totals: HashMap<(ProjectKind, Uuid), Decimal> = HashMap::new();
        if !project_ids.is_empty() {
            for p in payment_history::Entity::find()
                .filter(payment_history::Column::ProjectId.is_in(project_ids))
                .all(db)
                .await?
            {
                *totals.entry((p.project_kind, p.project_id)).or_default() += p.amount;
            }
        }

        let entries: Vec<LedgerEntry> = payments
            .into_iter()
            .filter_map(|payment| {
                let key = (payment.project_kind, payment.project_id);
                let project = projects.get(&key)?;
                if !user.can_access_region(&project.region) {
                    return None;
                }
                let total = totals.get(&key).copied().unwrap_or_default();
                Some(LedgerEntry {
                    attributed_tax: attributed_tax(project.tax_amount, payment.amount, total),
                    customer_name: project.customer_name.clone(),
                    region: project.region.clone(),
                    payment,
                })
            })
            .collect();

        let total = entries.len() as u64;
        let start = page_offset(page, limit);
        let items = entries.into_iter().skip(start).take(limit as usize).collect();

        Ok((items, total))
    }

    #[instrument(skip(self, user))]
    pub async fn receipt(&self, user: &AuthUser, payment_id: Uuid) -> Result<PaymentReceipt, ServiceError> {
        let db = &*self.db_pool;
        let payment = payment_history::Entity::find_by_id(payment_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", payment_id))?;

        let project = project_ref::load(db, payment.project_kind, payment.project_id).await?;
        user.ensure_region(&project.region)?;

        let payments = Self::payments_for(db, payment.project_kind, payment.project_id).await?;
        let total_paid = sum_amounts(&payments);

        // payments are ordered oldest first, so everything up to this one has been paid
        let mut paid_through = Decimal::ZERO;
        for p in &payments {
            paid_through += p.amount;
            if p.id == payment.id {
                break;
            }
        }

        Ok(PaymentReceipt {
            receipt_number: receipt_number(payment.id),
            balance_after_payment: outstanding_balance(
                project.proposal_amount,
                project.advance_payment,
                paid_through,
            ),
            attributed_tax: attributed_tax(project.tax_amount, payment.amount, total_paid),
            currency: self.currency.clone(),
            total_paid,
            payment,
            project,
        })
    }

    #[instrument(skip(self, user))]
    pub async fn delete_payment(&self, user: &AuthUser, payment_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let payment = payment_history::Entity::find_by_id(payment_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", payment_id))?;

        let project = project_ref::load(db, payment.project_kind, payment.project_id).await?;
        user.ensure_region(&project.region)?;

        payment_history::Entity::delete_by_id(payment_id)
            .exec(db)
            .await?;

        info!(%payment_id, "payment deleted");
        self.event_sender
            .send_or_log(Event::PaymentDeleted {
                payment_id,
                project_id: payment.project_id,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(300000), dec!(50000), dec!(100000), dec!(150000) ; "partially paid")]
    #[test_case(dec!(300000), dec!(50000), dec!(250000), dec!(0) ; "fully paid")]
    #[test_case(dec!(120000), dec!(0), dec!(0), dec!(120000) ; "nothing paid")]
    fn outstanding(proposal: Decimal, advance: Decimal, paid: Decimal, expected: Decimal) {
        assert_eq!(outstanding_balance(proposal, advance, paid), expected);
    }

    #[test]
    fn attributed_tax_is_pro_rata() {
        assert_eq!(attributed_tax(dec!(18000), dec!(50000), dec!(200000)), dec!(4500));
        assert_eq!(attributed_tax(dec!(1000), dec!(1), dec!(3)), dec!(333.33));
    }

    #[test]
    fn attributed_tax_is_zero_without_payments() {
        assert_eq!(attributed_tax(dec!(18000), dec!(0), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn payment_amount_bounds() {
        assert!(check_payment_amount(dec!(45000), dec!(45000)).is_ok());
        assert_matches!(
            check_payment_amount(dec!(45000.01), dec!(45000)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            check_payment_amount(dec!(0), dec!(45000)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn receipt_number_is_stable() {
        let id = Uuid::parse_str("8f14e45f-ceea-467f-a0e6-7b4f1c2d3e4f").unwrap();
        assert_eq!(receipt_number(id), "RCPT-8F14E45F");
    }
}
