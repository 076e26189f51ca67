use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::payments::outstanding_balance;
use super::project_ref::ProjectSnapshot;
use super::scope_to_regions;
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::chitoor_project::{self, CHITOOR_REGION},
    entities::payment_history::{self, ProjectKind},
    entities::service_ticket::{self, TicketPriority},
    entities::stock_item::{self, StockCategory},
    entities::{procurement_item, project},
    errors::ServiceError,
    stages::{TICKET_RESOLVED, TICKET_STATUSES},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ProjectSummary {
    pub total_projects: u64,
    pub by_stage: BTreeMap<String, u64>,
    pub by_region: BTreeMap<String, u64>,
    pub total_capacity_kw: Decimal,
    pub total_proposal_value: Decimal,
    pub total_collected: Decimal,
    pub total_outstanding: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryValuation {
    pub items: u64,
    pub quantity: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StockValuation {
    pub by_category: BTreeMap<String, CategoryValuation>,
    pub total_value: Decimal,
    pub low_stock_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct VendorSpend {
    pub vendor: String,
    pub orders: u64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TicketSummary {
    pub total: u64,
    pub open: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
}

/// Project counts and money totals. `collected` is keyed by `(kind, id)`.
pub fn project_summary(
    projects: &[ProjectSnapshot],
    collected: &HashMap<(ProjectKind, Uuid), Decimal>,
) -> ProjectSummary {
    projects.iter().fold(ProjectSummary::default(), |mut acc, p| {
        let paid = collected.get(&(p.kind, p.id)).copied().unwrap_or_default();
        acc.total_projects += 1;
        *acc.by_stage.entry(p.stage.clone()).or_default() += 1;
        *acc.by_region.entry(p.region.clone()).or_default() += 1;
        acc.total_capacity_kw += p.capacity_kw;
        acc.total_proposal_value += p.proposal_amount;
        acc.total_collected += p.advance_payment + paid;
        acc.total_outstanding += outstanding_balance(p.proposal_amount, p.advance_payment, paid);
        acc
    })
}

/// `YYYY-MM` to amount collected, in calendar order
pub fn monthly_collections<'a>(
    payments: impl IntoIterator<Item = &'a payment_history::Model>,
) -> BTreeMap<String, Decimal> {
    payments.into_iter().fold(BTreeMap::new(), |mut acc, p| {
        *acc.entry(p.paid_at.format("%Y-%m").to_string()).or_default() += p.amount;
        acc
    })
}

pub fn stock_valuation(items: &[stock_item::Model], low_stock_threshold: i32) -> StockValuation {
    items.iter().fold(StockValuation::default(), |mut acc, item| {
        let value = Decimal::from(item.quantity) * item.unit_cost;
        let entry = acc.by_category.entry(item.category.to_string()).or_default();
        entry.items += 1;
        entry.quantity += i64::from(item.quantity);
        entry.value += value;
        acc.total_value += value;
        if item.is_low(low_stock_threshold) {
            acc.low_stock_count += 1;
        }
        acc
    })
}

/// Spend per vendor, largest first
pub fn procurement_spend(items: &[procurement_item::Model]) -> Vec<VendorSpend> {
    let mut by_vendor: HashMap<&str, VendorSpend> = HashMap::new();
    for item in items {
        let entry = by_vendor.entry(item.vendor.as_str()).or_insert_with(|| VendorSpend {
            vendor: item.vendor.clone(),
            ..Default::default()
        });
        entry.orders += 1;
        entry.total_amount += item.total_amount;
    }

    let mut spend: Vec<VendorSpend> = by_vendor.into_values().collect();
    spend.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.vendor.cmp(&b.vendor))
    });
    spend
}

/// A ticket is open until it reaches `Resolved`
pub fn ticket_summary(tickets: &[service_ticket::Model]) -> TicketSummary {
    let resolved_at = TICKET_STATUSES
        .iter()
        .position(|s| *s == TICKET_RESOLVED)
        .unwrap_or(TICKET_STATUSES.len());

    tickets.iter().fold(TicketSummary::default(), |mut acc, t| {
        acc.total += 1;
        *acc.by_status.entry(t.status.clone()).or_default() += 1;
        *acc.by_priority.entry(t.priority.to_string()).or_default() += 1;
        let open = TICKET_STATUSES
            .iter()
            .position(|s| *s == t.status)
            .map_or(true, |idx| idx < resolved_at);
        if open {
            acc.open += 1;
        }
        acc
    })
}

/// Read-only aggregations over the caller's regions
pub struct ReportService {
    db_pool: Arc<DbPool>,
    low_stock_threshold: i32,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, low_stock_threshold: i32) -> Self {
        Self {
            db_pool,
            low_stock_threshold,
        }
    }

    async fn visible_projects(&self, user: &AuthUser) -> Result<Vec<ProjectSnapshot>, ServiceError> {
        let db = &*self.db_pool;
        let mut projects: Vec<ProjectSnapshot> =
            scope_to_regions(project::Entity::find(), project::Column::Region, user)
                .all(db)
                .await?
                .into_iter()
                .map(ProjectSnapshot::from)
                .collect();

        if user.can_access_region(CHITOOR_REGION) {
            projects.extend(
                chitoor_project::Entity::find()
                    .all(db)
                    .await?
                    .into_iter()
                    .map(ProjectSnapshot::from),
            );
        }
        Ok(projects)
    }

    async fn visible_payments(
        &self,
        projects: &[ProjectSnapshot],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<payment_history::Model>, ServiceError> {
        if projects.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let mut query = payment_history::Entity::find()
            .filter(payment_history::Column::ProjectId.is_in(ids));
        if let Some(from) = from {
            query = query.filter(payment_history::Column::PaidAt.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(payment_history::Column::PaidAt.lte(to));
        }

        let keys: std::collections::HashSet<(ProjectKind, Uuid)> =
            projects.iter().map(|p| (p.kind, p.id)).collect();
        Ok(query
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .filter(|p| keys.contains(&(p.project_kind, p.project_id)))
            .collect())
    }

    #[instrument(skip(self, user))]
    pub async fn project_summary(&self, user: &AuthUser) -> Result<ProjectSummary, ServiceError> {
        let projects = self.visible_projects(user).await?;
        let payments = self.visible_payments(&projects, None, None).await?;

        let mut collected: HashMap<(ProjectKind, Uuid), Decimal> = HashMap::new();
        for p in &payments {
            *collected.entry((p.project_kind, p.project_id)).or_default() += p.amount;
        }
        Ok(project_summary(&projects, &collected))
    }

    #[instrument(skip(self, user))]
    pub async fn monthly_collections(
        &self,
        user: &AuthUser,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<BTreeMap<String, Decimal>, ServiceError> {
        let projects = self.visible_projects(user).await?;
        let payments = self.visible_payments(&projects, from, to).await?;
        Ok(monthly_collections(&payments))
    }

    #[instrument(skip(self))]
    pub async fn stock_valuation(&self) -> Result<StockValuation, ServiceError> {
        let items = stock_item::Entity::find().all(&*self.db_pool).await?;
        Ok(stock_valuation(&items, self.low_stock_threshold))
    }

    #[instrument(skip(self))]
    pub async fn procurement_spend(&self) -> Result<Vec<VendorSpend>, ServiceError> {
        let items = procurement_item::Entity::find().all(&*self.db_pool).await?;
        Ok(procurement_spend(&items))
    }

    #[instrument(skip(self, user))]
    pub async fn ticket_summary(&self, user: &AuthUser) -> Result<TicketSummary, ServiceError> {
        let tickets = scope_to_regions(
            service_ticket::Entity::find(),
            service_ticket::Column::Region,
            user,
        )
        .all(&*self.db_pool)
        .await?;
        Ok(ticket_summary(&tickets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use crate::entities::payment_history::PaymentMode;

    fn snapshot(region: &str, stage: &str, proposal: Decimal, advance: Decimal) -> ProjectSnapshot {
        ProjectSnapshot {
            id: Uuid::new_v4(),
            kind: ProjectKind::Project,
            customer_name: "Customer".into(),
            region: region.into(),
            stage: stage.into(),
            capacity_kw: dec!(5),
            proposal_amount: proposal,
            advance_payment: advance,
            tax_amount: dec!(0),
        }
    }

    fn payment(amount: Decimal, y: i32, m: u32, d: u32) -> payment_history::Model {
        payment_history::Model {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            project_kind: ProjectKind::Project,
            amount,
            payment_mode: PaymentMode::Upi,
            reference: None,
            paid_at: Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
            recorded_by: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn stock(category: StockCategory, quantity: i32, unit_cost: Decimal) -> stock_item::Model {
        stock_item::Model {
            id: Uuid::new_v4(),
            sku: format!("SKU-{}", quantity),
            name: "Item".into(),
            category,
            brand: None,
            unit: "nos".into(),
            quantity,
            unit_cost,
            reorder_level: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn project_summary_totals() {
        let a = snapshot("nellore", "Enquiry", dec!(300000), dec!(50000));
        let b = snapshot("chitoor", "Installation", dec!(200000), dec!(0));
        let mut collected = HashMap::new();
        collected.insert((a.kind, a.id), dec!(100000));

        let summary = project_summary(&[a, b], &collected);
        assert_eq!(summary.total_projects, 2);
        assert_eq!(summary.by_region["nellore"], 1);
        assert_eq!(summary.by_stage["Installation"], 1);
        assert_eq!(summary.total_capacity_kw, dec!(10));
        assert_eq!(summary.total_proposal_value, dec!(500000));
        assert_eq!(summary.total_collected, dec!(150000));
        assert_eq!(summary.total_outstanding, dec!(350000));
    }

    #[test]
    fn collections_group_by_month_in_order() {
        let payments = vec![
            payment(dec!(1000), 2026, 3, 2),
            payment(dec!(500), 2026, 1, 30),
            payment(dec!(250), 2026, 3, 28),
        ];
        let months = monthly_collections(&payments);
        let keys: Vec<&String> = months.keys().collect();
        assert_eq!(keys, vec!["2026-01", "2026-03"]);
        assert_eq!(months["2026-03"], dec!(1250));
    }

    #[test]
    fn stock_value_per_category() {
        let items = vec![
            stock(StockCategory::Module, 40, dec!(11000)),
            stock(StockCategory::Module, 2, dec!(9000)),
            stock(StockCategory::Inverter, 10, dec!(30000)),
        ];
        let valuation = stock_valuation(&items, 5);
        assert_eq!(valuation.by_category["Module"].value, dec!(458000));
        assert_eq!(valuation.by_category["Module"].quantity, 42);
        assert_eq!(valuation.total_value, dec!(758000));
        assert_eq!(valuation.low_stock_count, 1);
    }

    #[test]
    fn vendor_spend_sorted_by_amount() {
        let mk = |vendor: &str, total: Decimal| procurement_item::Model {
            id: Uuid::new_v4(),
            vendor: vendor.into(),
            item_name: "Panel".into(),
            stock_item_id: None,
            quantity: 1,
            unit_price: total,
            total_amount: total,
            status: "Requested".into(),
            received_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let spend = procurement_spend(&[mk("Waaree", dec!(100)), mk("Adani", dec!(300)), mk("Waaree", dec!(250))]);
        assert_eq!(spend[0].vendor, "Waaree");
        assert_eq!(spend[0].orders, 2);
        assert_eq!(spend[0].total_amount, dec!(350));
        assert_eq!(spend[1].vendor, "Adani");
    }

    #[test]
    fn open_tickets_exclude_resolved_and_closed() {
        let mk = |status: &str, priority: TicketPriority| service_ticket::Model {
            id: Uuid::new_v4(),
            project_id: None,
            customer_name: "C".into(),
            region: "nellore".into(),
            issue: "Inverter fault".into(),
            description: None,
            priority,
            status: status.into(),
            assigned_to: None,
            resolved_at: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let summary = ticket_summary(&[
            mk("Open", TicketPriority::High),
            mk("In Progress", TicketPriority::High),
            mk("Resolved", TicketPriority::Low),
            mk("Closed", TicketPriority::Medium),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.open, 2);
        assert_eq!(summary.by_priority["High"], 2);
    }
}
