use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::stock::{announce_movement, move_stock};
use super::{normalize_region, project_ref, require_positive_qty, require_text, scope_to_regions};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::payment_history::ProjectKind,
    entities::{project_assignment, stock_item},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateAssignmentInput {
    pub project_id: Option<Uuid>,
    pub project_kind: Option<ProjectKind>,
    pub customer_name: Option<String>,
    pub region: Option<String>,
    pub stock_item_id: Uuid,
    pub quantity: i32,
    pub serial_numbers: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub project_id: Option<Uuid>,
    pub customer_name: Option<String>,
}

/// Module and inverter hand-outs; each one moves warehouse stock
pub struct AssignmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    low_stock_threshold: i32,
}

impl AssignmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, low_stock_threshold: i32) -> Self {
        Self {
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self, user, input), fields(stock_item_id = %input.stock_item_id))]
    pub async fn create_assignment(
        &self,
        user: &AuthUser,
        input: CreateAssignmentInput,
    ) -> Result<project_assignment::Model, ServiceError> {
        let quantity = require_positive_qty("quantity", input.quantity)?;

        let (customer_name, region, project_kind) = match input.project_id {
            Some(project_id) => {
                let kind = input.project_kind.unwrap_or(ProjectKind::Project);
                let project = project_ref::load(&*self.db_pool, kind, project_id).await?;
                (project.customer_name, project.region, Some(kind))
            }
            None => (
                require_text("customer_name", input.customer_name.as_deref().unwrap_or(""))?,
                normalize_region(input.region.as_deref().unwrap_or(""))?,
                None,
            ),
        };
        user.ensure_region(&region)?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let item = stock_item::Entity::find_by_id(input.stock_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Stock item", input.stock_item_id))?;
        if !item.category.is_assignable() {
            return Err(ServiceError::ValidationError(format!(
                "{} is a {} item; only modules and inverters are assigned",
                item.sku, item.category
            )));
        }

        let movement = move_stock(&txn, item.id, -quantity).await?;
        let assignment = project_assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            project_kind: Set(project_kind),
            customer_name: Set(customer_name),
            region: Set(region),
            stock_item_id: Set(item.id),
            item_category: Set(item.category),
            quantity: Set(quantity),
            serial_numbers: Set(input.serial_numbers.filter(|s| !s.trim().is_empty())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(assignment_id = %assignment.id, quantity, "hardware assigned");
        self.event_sender
            .send_or_log(Event::AssignmentCreated {
                assignment_id: assignment.id,
                stock_item_id: assignment.stock_item_id,
                quantity,
            })
            .await;
        announce_movement(&self.event_sender, &movement, "assignment", self.low_stock_threshold).await;

        Ok(assignment)
    }

    #[instrument(skip(self, user))]
    pub async fn get_assignment(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<project_assignment::Model, ServiceError> {
        let assignment = project_assignment::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assignment", id))?;
        user.ensure_region(&assignment.region)?;
        Ok(assignment)
    }

    #[instrument(skip(self, user))]
    pub async fn list_assignments(
        &self,
        user: &AuthUser,
        filter: AssignmentFilter,
    ) -> Result<Vec<project_assignment::Model>, ServiceError> {
        let mut query = scope_to_regions(
            project_assignment::Entity::find(),
            project_assignment::Column::Region,
            user,
        );
        if let Some(project_id) = filter.project_id {
            query = query.filter(project_assignment::Column::ProjectId.eq(project_id));
        }
        if let Some(name) = filter.customer_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(project_assignment::Column::CustomerName.eq(name));
        }

        Ok(query
            .order_by_desc(project_assignment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    /// Removing an assignment puts its units back on the shelf
    #[instrument(skip(self, user))]
    pub async fn delete_assignment(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        let assignment = self.get_assignment(user, id).await?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let deleted = project_assignment::Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected != 1 {
            // already removed by a concurrent request; its stock was restored there
            return Err(ServiceError::not_found("Assignment", id));
        }
        let movement = move_stock(&txn, assignment.stock_item_id, assignment.quantity).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::AssignmentDeleted {
                assignment_id: id,
                stock_item_id: assignment.stock_item_id,
                quantity: assignment.quantity,
            })
            .await;
        announce_movement(&self.event_sender, &movement, "assignment removed", self.low_stock_threshold)
            .await;
        Ok(())
    }
}
