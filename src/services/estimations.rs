use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{normalize_region, require_non_negative, require_text, round_money, scope_to_regions};
use crate::{auth::AuthUser, db::DbPool, entities::estimation_cost, errors::ServiceError};

/// Line items of an estimate before margin
#[derive(Debug, Clone, Default)]
pub struct CostLines {
    pub module_cost: Decimal,
    pub inverter_cost: Decimal,
    pub structure_cost: Decimal,
    pub cabling_cost: Decimal,
    pub installation_cost: Decimal,
    pub other_cost: Decimal,
}

impl CostLines {
    fn all(&self) -> [(&'static str, Decimal); 6] {
        [
            ("module_cost", self.module_cost),
            ("inverter_cost", self.inverter_cost),
            ("structure_cost", self.structure_cost),
            ("cabling_cost", self.cabling_cost),
            ("installation_cost", self.installation_cost),
            ("other_cost", self.other_cost),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EstimateBreakdown {
    pub subtotal: Decimal,
    pub margin_amount: Decimal,
    pub total_cost: Decimal,
    pub cost_per_kw: Decimal,
}

pub fn compute_estimate(
    capacity_kw: Decimal,
    lines: &CostLines,
    margin_percent: Decimal,
) -> Result<EstimateBreakdown, ServiceError> {
    if capacity_kw <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "capacity_kw must be greater than zero".to_string(),
        ));
    }
    require_non_negative("margin_percent", margin_percent)?;

    let mut subtotal = Decimal::ZERO;
    for (field, value) in lines.all() {
        subtotal += require_non_negative(field, value)?;
    }
    let subtotal = round_money(subtotal);
    let margin_amount = round_money(subtotal * margin_percent / Decimal::ONE_HUNDRED);
    let total_cost = subtotal + margin_amount;

    Ok(EstimateBreakdown {
        subtotal,
        margin_amount,
        total_cost,
        cost_per_kw: round_money(total_cost / capacity_kw),
    })
}

#[derive(Debug, Clone)]
pub struct CreateEstimateInput {
    pub customer_name: String,
    pub region: String,
    pub capacity_kw: Decimal,
    pub lines: CostLines,
    pub margin_percent: Decimal,
    pub notes: Option<String>,
}

pub struct EstimationService {
    db_pool: Arc<DbPool>,
}

impl EstimationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create_estimate(
        &self,
        user: &AuthUser,
        input: CreateEstimateInput,
    ) -> Result<estimation_cost::Model, ServiceError> {
        let region = normalize_region(&input.region)?;
        user.ensure_region(&region)?;
        let breakdown = compute_estimate(input.capacity_kw, &input.lines, input.margin_percent)?;

        let model = estimation_cost::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_name: Set(require_text("customer_name", &input.customer_name)?),
            region: Set(region),
            capacity_kw: Set(input.capacity_kw),
            module_cost: Set(input.lines.module_cost),
            inverter_cost: Set(input.lines.inverter_cost),
            structure_cost: Set(input.lines.structure_cost),
            cabling_cost: Set(input.lines.cabling_cost),
            installation_cost: Set(input.lines.installation_cost),
            other_cost: Set(input.lines.other_cost),
            margin_percent: Set(input.margin_percent),
            subtotal: Set(breakdown.subtotal),
            margin_amount: Set(breakdown.margin_amount),
            total_cost: Set(breakdown.total_cost),
            cost_per_kw: Set(breakdown.cost_per_kw),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(estimate_id = %model.id, total = %model.total_cost, "estimate created");
        Ok(model)
    }

    #[instrument(skip(self, user))]
    pub async fn get_estimate(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<estimation_cost::Model, ServiceError> {
        let model = estimation_cost::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Estimate", id))?;
        user.ensure_region(&model.region)?;
        Ok(model)
    }

    #[instrument(skip(self, user))]
    pub async fn list_estimates(
        &self,
        user: &AuthUser,
        search: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<estimation_cost::Model>, u64), ServiceError> {
        let mut query = scope_to_regions(
            estimation_cost::Entity::find(),
            estimation_cost::Column::Region,
            user,
        );
        if let Some(search) = search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(estimation_cost::Column::CustomerName.contains(search));
        }

        let paginator = query
            .order_by_desc(estimation_cost::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, user))]
    pub async fn delete_estimate(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.get_estimate(user, id).await?;
        estimation_cost::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn lines() -> CostLines {
        CostLines {
            module_cost: dec!(150000),
            inverter_cost: dec!(60000),
            structure_cost: dec!(30000),
            cabling_cost: dec!(10000),
            installation_cost: dec!(25000),
            other_cost: dec!(5000),
        }
    }

    #[test]
    fn estimate_adds_margin_and_divides_by_capacity() {
        let e = compute_estimate(dec!(5), &lines(), dec!(10)).unwrap();
        assert_eq!(e.subtotal, dec!(280000));
        assert_eq!(e.margin_amount, dec!(28000));
        assert_eq!(e.total_cost, dec!(308000));
        assert_eq!(e.cost_per_kw, dec!(61600));
    }

    #[test]
    fn capacity_must_be_positive() {
        assert_matches!(
            compute_estimate(dec!(0), &lines(), dec!(10)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn negative_line_is_rejected() {
        let mut l = lines();
        l.cabling_cost = dec!(-1);
        assert!(compute_estimate(dec!(3), &l, dec!(0)).is_err());
    }
}
