use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{page_offset, require_non_negative, require_text};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::project_assignment,
    entities::stock_item::{self, StockCategory},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Largest single manual correction
pub const MAX_ADJUSTMENT: i32 = 1_000_000;

/// Result of a quantity change inside a caller's transaction
#[derive(Debug, Clone)]
pub(crate) struct StockMovement {
    pub item: stock_item::Model,
    pub old_quantity: i32,
}

/// Applies a signed delta to a catalog entry. The quantity never drops below zero.
///
/// The change is a single conditional `UPDATE`, so concurrent movements on the
/// same item cannot overwrite each other or overdraw it.
pub(crate) async fn move_stock<C: ConnectionTrait>(
    db: &C,
    stock_item_id: Uuid,
    delta: i32,
) -> Result<StockMovement, ServiceError> {
    let item = stock_item::Entity::find_by_id(stock_item_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Stock item", stock_item_id))?;
    let short = |on_hand: i32| {
        ServiceError::InsufficientStock(format!(
            "{} has {} on hand, {} requested",
            item.sku,
            on_hand,
            delta.unsigned_abs()
        ))
    };

    let projected = item
        .quantity
        .checked_add(delta)
        .ok_or_else(|| ServiceError::InvalidInput("quantity overflow".to_string()))?;
    if projected < 0 {
        return Err(short(item.quantity));
    }

    let result = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::Quantity,
            Expr::col(stock_item::Column::Quantity).add(delta),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Some(Utc::now())))
        .filter(stock_item::Column::Id.eq(stock_item_id))
        .filter(stock_item::Column::Quantity.gte(-i64::from(delta)))
        .exec(db)
        .await?;

    let item = stock_item::Entity::find_by_id(stock_item_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Stock item", stock_item_id))?;
    if result.rows_affected == 0 {
        // drained by a concurrent movement between the read and the update
        return Err(short(item.quantity));
    }

    Ok(StockMovement {
        old_quantity: item.quantity - delta,
        item,
    })
}

/// Publishes the events for a committed movement
pub(crate) async fn announce_movement(
    event_sender: &EventSender,
    movement: &StockMovement,
    reason: &str,
    low_stock_threshold: i32,
) {
    counter!("solar_console_stock_moves_total", 1, "reason" => reason.to_string());
    event_sender
        .send_or_log(Event::StockAdjusted {
            stock_item_id: movement.item.id,
            old_quantity: movement.old_quantity,
            new_quantity: movement.item.quantity,
            reason: reason.to_string(),
        })
        .await;

    if movement.item.is_low(low_stock_threshold) && movement.item.quantity < movement.old_quantity {
        warn!(sku = %movement.item.sku, quantity = movement.item.quantity, "stock running low");
        event_sender
            .send_or_log(Event::LowStock {
                stock_item_id: movement.item.id,
                sku: movement.item.sku.clone(),
                quantity: movement.item.quantity,
            })
            .await;
    }
}

#[derive(Debug, Clone)]
pub struct CreateStockItemInput {
    pub sku: String,
    pub name: String,
    pub category: StockCategory,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub reorder_level: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStockItemInput {
    pub name: Option<String>,
    pub category: Option<StockCategory>,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub reorder_level: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub category: Option<StockCategory>,
    pub low_only: bool,
    pub search: Option<String>,
}

/// Warehouse catalog. Stock is shared across regions.
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    low_stock_threshold: i32,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, low_stock_threshold: i32) -> Self {
        Self {
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_item(&self, input: CreateStockItemInput) -> Result<stock_item::Model, ServiceError> {
        let db = &*self.db_pool;
        let sku = require_text("sku", &input.sku)?.to_ascii_uppercase();
        if input.quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity cannot be negative".to_string(),
            ));
        }

        let duplicate = stock_item::Entity::find()
            .filter(stock_item::Column::Sku.eq(sku.as_str()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
        }

        let item = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku),
            name: Set(require_text("name", &input.name)?),
            category: Set(input.category),
            brand: Set(input.brand),
            unit: Set(input.unit.unwrap_or_else(|| "nos".to_string())),
            quantity: Set(input.quantity),
            unit_cost: Set(require_non_negative("unit_cost", input.unit_cost)?),
            reorder_level: Set(input.reorder_level),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(stock_item_id = %item.id, "stock item created");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> Result<stock_item::Model, ServiceError> {
        stock_item::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Stock item", id))
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: StockFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_item::Model>, u64), ServiceError> {
        let mut query = stock_item::Entity::find();
        if let Some(category) = filter.category {
            query = query.filter(stock_item::Column::Category.eq(category));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                stock_item::Column::Name
                    .contains(search)
                    .or(stock_item::Column::Sku.contains(search)),
            );
        }
        let query = query.order_by_asc(stock_item::Column::Sku);

        if filter.low_only {
            // per-item reorder levels make this a row predicate, filtered after fetch
            let low: Vec<_> = query
                .all(&*self.db_pool)
                .await?
                .into_iter()
                .filter(|item| item.is_low(self.low_stock_threshold))
                .collect();
            let total = low.len() as u64;
            let start = page_offset(page, limit);
            return Ok((low.into_iter().skip(start).take(limit as usize).collect(), total));
        }

        let paginator = query.paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<stock_item::Model>, ServiceError> {
        Ok(stock_item::Entity::find()
            .order_by_asc(stock_item::Column::Quantity)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .filter(|item| item.is_low(self.low_stock_threshold))
            .collect())
    }

    /// Quantity is only changed through [`StockService::adjust`], receipts and assignments
    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        id: Uuid,
        input: UpdateStockItemInput,
    ) -> Result<stock_item::Model, ServiceError> {
        let existing = self.get_item(id).await?;
        let mut model: stock_item::ActiveModel = existing.into();

        if let Some(name) = input.name {
            model.name = Set(require_text("name", &name)?);
        }
        if let Some(category) = input.category {
            model.category = Set(category);
        }
        if input.brand.is_some() {
            model.brand = Set(input.brand);
        }
        if let Some(unit) = input.unit {
            model.unit = Set(require_text("unit", &unit)?);
        }
        if let Some(cost) = input.unit_cost {
            model.unit_cost = Set(require_non_negative("unit_cost", cost)?);
        }
        if input.reorder_level.is_some() {
            model.reorder_level = Set(input.reorder_level);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_item(id).await?;

        let assigned = project_assignment::Entity::find()
            .filter(project_assignment::Column::StockItemId.eq(id))
            .count(db)
            .await?;
        if assigned > 0 {
            return Err(ServiceError::Conflict(format!(
                "stock item {} is referenced by {} assignment(s)",
                id, assigned
            )));
        }

        stock_item::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }

    /// Manual correction by a signed delta
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        id: Uuid,
        delta: i32,
        reason: &str,
    ) -> Result<stock_item::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::ValidationError(
                "delta must not be zero".to_string(),
            ));
        }
        if delta.unsigned_abs() > MAX_ADJUSTMENT.unsigned_abs() {
            return Err(ServiceError::ValidationError(format!(
                "delta must be within {} either way",
                MAX_ADJUSTMENT
            )));
        }
        let reason = require_text("reason", reason)?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let movement = move_stock(&txn, id, delta).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            stock_item_id = %id,
            old = movement.old_quantity,
            new = movement.item.quantity,
            "stock adjusted"
        );
        announce_movement(&self.event_sender, &movement, &reason, self.low_stock_threshold).await;
        Ok(movement.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn pool_with_item(quantity: i32) -> (DbPool, Uuid) {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "stock_module_test_secret_with_enough_length".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        let pool = db::establish_connection_from_app_config(&cfg).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let item = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set("MOD-540".into()),
            name: Set("540 Wp module".into()),
            category: Set(StockCategory::Module),
            brand: Set(None),
            unit: Set("pcs".into()),
            quantity: Set(quantity),
            unit_cost: Set(dec!(13500)),
            reorder_level: Set(Some(2)),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();
        (pool, item.id)
    }

    #[tokio::test]
    async fn movements_report_the_quantity_before_and_after() {
        let (pool, id) = pool_with_item(10).await;
        let movement = move_stock(&pool, id, -4).await.unwrap();
        assert_eq!(movement.old_quantity, 10);
        assert_eq!(movement.item.quantity, 6);
    }

    #[tokio::test]
    async fn most_negative_delta_is_insufficient_stock() {
        let (pool, id) = pool_with_item(3).await;
        let err = move_stock(&pool, id, i32::MIN).await.unwrap_err();
        assert_matches!(&err, ServiceError::InsufficientStock(msg) if msg.contains("2147483648 requested"));

        let item = stock_item::Entity::find_by_id(id).one(&pool).await.unwrap().unwrap();
        assert_eq!(item.quantity, 3);
    }
}
