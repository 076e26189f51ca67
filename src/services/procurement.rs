use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::stock::{announce_movement, move_stock};
use super::{require_non_negative, require_positive_qty, require_text, round_money};
use crate::{
    db::DbPool,
    entities::{procurement_item, stock_item},
    errors::ServiceError,
    events::{Event, EventSender},
    stages::{self, StageMove, PROCUREMENT_RECEIVED, PROCUREMENT_REQUESTED, PROCUREMENT_STATUSES},
};

pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_price)
}

#[derive(Debug, Clone)]
pub struct CreateProcurementInput {
    pub vendor: String,
    pub item_name: String,
    pub stock_item_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProcurementInput {
    pub vendor: Option<String>,
    pub item_name: Option<String>,
    pub stock_item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProcurementFilter {
    pub status: Option<String>,
    pub vendor: Option<String>,
}

pub struct ProcurementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    low_stock_threshold: i32,
}

impl ProcurementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, low_stock_threshold: i32) -> Self {
        Self {
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    async fn ensure_stock_item(&self, id: Uuid) -> Result<(), ServiceError> {
        stock_item::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Stock item", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create_procurement(
        &self,
        input: CreateProcurementInput,
    ) -> Result<procurement_item::Model, ServiceError> {
        let quantity = require_positive_qty("quantity", input.quantity)?;
        let unit_price = require_non_negative("unit_price", input.unit_price)?;
        if let Some(stock_item_id) = input.stock_item_id {
            self.ensure_stock_item(stock_item_id).await?;
        }

        let item = procurement_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor: Set(require_text("vendor", &input.vendor)?),
            item_name: Set(require_text("item_name", &input.item_name)?),
            stock_item_id: Set(input.stock_item_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            total_amount: Set(line_total(quantity, unit_price)),
            status: Set(PROCUREMENT_REQUESTED.to_string()),
            received_at: Set(None),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(procurement_id = %item.id, vendor = %item.vendor, "procurement requested");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get_procurement(&self, id: Uuid) -> Result<procurement_item::Model, ServiceError> {
        procurement_item::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Procurement", id))
    }

    #[instrument(skip(self))]
    pub async fn list_procurements(
        &self,
        filter: ProcurementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<procurement_item::Model>, u64), ServiceError> {
        let mut query = procurement_item::Entity::find();
        if let Some(status) = filter.status.as_deref() {
            query = query.filter(
                procurement_item::Column::Status
                    .eq(stages::ensure_valid(PROCUREMENT_STATUSES, status)?),
            );
        }
        if let Some(vendor) = filter.vendor.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(procurement_item::Column::Vendor.contains(vendor));
        }

        let paginator = query
            .order_by_desc(procurement_item::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    /// Only still-requested purchases may be edited
    #[instrument(skip(self, input))]
    pub async fn update_procurement(
        &self,
        id: Uuid,
        input: UpdateProcurementInput,
    ) -> Result<procurement_item::Model, ServiceError> {
        let existing = self.get_procurement(id).await?;
        if existing.status != PROCUREMENT_REQUESTED {
            return Err(ServiceError::InvalidOperation(format!(
                "procurement is {} and can no longer be edited",
                existing.status
            )));
        }
        if let Some(stock_item_id) = input.stock_item_id {
            self.ensure_stock_item(stock_item_id).await?;
        }

        let quantity = match input.quantity {
            Some(q) => require_positive_qty("quantity", q)?,
            None => existing.quantity,
        };
        let unit_price = match input.unit_price {
            Some(p) => require_non_negative("unit_price", p)?,
            None => existing.unit_price,
        };

        let mut model: procurement_item::ActiveModel = existing.into();
        if let Some(vendor) = input.vendor {
            model.vendor = Set(require_text("vendor", &vendor)?);
        }
        if let Some(name) = input.item_name {
            model.item_name = Set(require_text("item_name", &name)?);
        }
        if input.stock_item_id.is_some() {
            model.stock_item_id = Set(input.stock_item_id);
        }
        if input.notes.is_some() {
            model.notes = Set(input.notes);
        }
        model.quantity = Set(quantity);
        model.unit_price = Set(unit_price);
        model.total_amount = Set(line_total(quantity, unit_price));

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_procurement(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_procurement(id).await?;
        if existing.status == PROCUREMENT_RECEIVED {
            return Err(ServiceError::InvalidOperation(
                "received procurements cannot be deleted".to_string(),
            ));
        }
        let deleted = procurement_item::Entity::delete_many()
            .filter(procurement_item::Column::Id.eq(id))
            .filter(procurement_item::Column::Status.ne(PROCUREMENT_RECEIVED))
            .exec(&*self.db_pool)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(
                "received procurements cannot be deleted".to_string(),
            ));
        }
        Ok(())
    }

    /// Moving into `Received` books the quantity into the linked stock item in the same transaction
    #[instrument(skip(self))]
    pub async fn move_status(
        &self,
        id: Uuid,
        direction: StageMove,
    ) -> Result<procurement_item::Model, ServiceError> {
        let existing = self.get_procurement(id).await?;
        let from = existing.status.clone();
        if from == PROCUREMENT_RECEIVED && direction == StageMove::Regress {
            return Err(ServiceError::InvalidOperation(
                "received procurements cannot be moved back".to_string(),
            ));
        }
        let next = stages::step(PROCUREMENT_STATUSES, &from, direction)?;
        let receiving = next == PROCUREMENT_RECEIVED;
        let stock_item_id = existing.stock_item_id;
        let quantity = existing.quantity;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        // claim the transition; a concurrent move of the same row matches nothing
        let mut claim = procurement_item::Entity::update_many()
            .col_expr(procurement_item::Column::Status, Expr::value(next))
            .col_expr(procurement_item::Column::UpdatedAt, Expr::value(Some(Utc::now())));
        if receiving {
            claim = claim.col_expr(
                procurement_item::Column::ReceivedAt,
                Expr::value(Some(Utc::now())),
            );
        }
        let claimed = claim
            .filter(procurement_item::Column::Id.eq(id))
            .filter(procurement_item::Column::Status.eq(from.as_str()))
            .exec(&txn)
            .await?;
        if claimed.rows_affected != 1 {
            return Err(ServiceError::Conflict(format!(
                "procurement {} changed while moving from {}; reload and retry",
                id, from
            )));
        }

        let movement = match (receiving, stock_item_id) {
            (true, Some(stock_item_id)) => Some(move_stock(&txn, stock_item_id, quantity).await?),
            _ => None,
        };
        let updated = procurement_item::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Procurement", id))?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::ProcurementStatusChanged {
                procurement_id: updated.id,
                from,
                to: updated.status.clone(),
            })
            .await;
        if let Some(movement) = movement {
            info!(procurement_id = %updated.id, sku = %movement.item.sku, quantity, "procurement received into stock");
            announce_movement(&self.event_sender, &movement, "procurement received", self.low_stock_threshold)
                .await;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_is_quantity_times_price() {
        assert_eq!(line_total(40, dec!(11250.50)), dec!(450020));
        assert_eq!(line_total(3, dec!(0.333)), dec!(1.00));
    }
}
