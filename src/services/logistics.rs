use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{normalize_region, require_text, scope_to_regions};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::logistics_record,
    errors::ServiceError,
    events::{Event, EventSender},
    stages::{self, StageMove, DISPATCH_DELIVERED, DISPATCH_STATUSES},
};

const DISPATCHED: &str = "Dispatched";

#[derive(Debug, Clone)]
pub struct CreateDispatchInput {
    pub project_id: Option<Uuid>,
    pub customer_name: String,
    pub region: String,
    pub materials: String,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDispatchInput {
    pub materials: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchFilter {
    pub status: Option<String>,
    pub region: Option<String>,
}

pub struct LogisticsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LogisticsService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create_dispatch(
        &self,
        user: &AuthUser,
        input: CreateDispatchInput,
    ) -> Result<logistics_record::Model, ServiceError> {
        let region = normalize_region(&input.region)?;
        user.ensure_region(&region)?;

        let record = logistics_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            customer_name: Set(require_text("customer_name", &input.customer_name)?),
            region: Set(region),
            materials: Set(require_text("materials", &input.materials)?),
            vehicle_number: Set(input.vehicle_number),
            driver_name: Set(input.driver_name),
            status: Set(stages::initial(DISPATCH_STATUSES).to_string()),
            dispatch_date: Set(input.dispatch_date),
            delivered_at: Set(None),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(record_id = %record.id, "dispatch record created");
        Ok(record)
    }

    #[instrument(skip(self, user))]
    pub async fn get_dispatch(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<logistics_record::Model, ServiceError> {
        let record = logistics_record::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Dispatch record", id))?;
        user.ensure_region(&record.region)?;
        Ok(record)
    }

    #[instrument(skip(self, user))]
    pub async fn list_dispatches(
        &self,
        user: &AuthUser,
        filter: DispatchFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<logistics_record::Model>, u64), ServiceError> {
        let mut query = scope_to_regions(
            logistics_record::Entity::find(),
            logistics_record::Column::Region,
            user,
        );
        if let Some(status) = filter.status.as_deref() {
            query = query.filter(
                logistics_record::Column::Status.eq(stages::ensure_valid(DISPATCH_STATUSES, status)?),
            );
        }
        if let Some(region) = filter.region.as_deref().filter(|r| !r.trim().is_empty()) {
            query = query.filter(logistics_record::Column::Region.eq(normalize_region(region)?));
        }

        let paginator = query
            .order_by_desc(logistics_record::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, user, input))]
    pub async fn update_dispatch(
        &self,
        user: &AuthUser,
        id: Uuid,
        input: UpdateDispatchInput,
    ) -> Result<logistics_record::Model, ServiceError> {
        let existing = self.get_dispatch(user, id).await?;
        let mut model: logistics_record::ActiveModel = existing.into();

        if let Some(materials) = input.materials {
            model.materials = Set(require_text("materials", &materials)?);
        }
        if input.vehicle_number.is_some() {
            model.vehicle_number = Set(input.vehicle_number);
        }
        if input.driver_name.is_some() {
            model.driver_name = Set(input.driver_name);
        }
        if input.dispatch_date.is_some() {
            model.dispatch_date = Set(input.dispatch_date);
        }
        if input.notes.is_some() {
            model.notes = Set(input.notes);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, user))]
    pub async fn delete_dispatch(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.get_dispatch(user, id).await?;
        logistics_record::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }

    /// `Dispatched` fills an empty dispatch date; `Delivered` stamps `delivered_at`
    #[instrument(skip(self, user))]
    pub async fn move_status(
        &self,
        user: &AuthUser,
        id: Uuid,
        direction: StageMove,
    ) -> Result<logistics_record::Model, ServiceError> {
        let existing = self.get_dispatch(user, id).await?;
        let from = existing.status.clone();
        let had_dispatch_date = existing.dispatch_date.is_some();
        let next = stages::step(DISPATCH_STATUSES, &from, direction)?;

        let mut model: logistics_record::ActiveModel = existing.into();
        model.status = Set(next.to_string());
        if next == DISPATCHED && !had_dispatch_date {
            model.dispatch_date = Set(Some(Utc::now()));
        }
        if next == DISPATCH_DELIVERED {
            model.delivered_at = Set(Some(Utc::now()));
        } else if from == DISPATCH_DELIVERED {
            model.delivered_at = Set(None);
        }
        let updated = model.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::DispatchStatusChanged {
                record_id: updated.id,
                from,
                to: updated.status.clone(),
            })
            .await;
        Ok(updated)
    }
}
