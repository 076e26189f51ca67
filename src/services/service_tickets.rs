use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{normalize_region, require_text, scope_to_regions};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::service_ticket::{self, TicketPriority},
    errors::ServiceError,
    events::{Event, EventSender},
    stages::{self, StageMove, TICKET_RESOLVED, TICKET_STATUSES},
};

#[derive(Debug, Clone)]
pub struct CreateTicketInput {
    pub project_id: Option<Uuid>,
    pub customer_name: String,
    pub region: String,
    pub issue: String,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTicketInput {
    pub issue: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub region: Option<String>,
    pub priority: Option<TicketPriority>,
}

pub struct ServiceTicketService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ServiceTicketService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create_ticket(
        &self,
        user: &AuthUser,
        input: CreateTicketInput,
    ) -> Result<service_ticket::Model, ServiceError> {
        let region = normalize_region(&input.region)?;
        user.ensure_region(&region)?;

        let ticket = service_ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            customer_name: Set(require_text("customer_name", &input.customer_name)?),
            region: Set(region),
            issue: Set(require_text("issue", &input.issue)?),
            description: Set(input.description),
            priority: Set(input.priority.unwrap_or(TicketPriority::Medium)),
            status: Set(stages::initial(TICKET_STATUSES).to_string()),
            assigned_to: Set(input.assigned_to),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(ticket_id = %ticket.id, priority = %ticket.priority, "service ticket opened");
        Ok(ticket)
    }

    #[instrument(skip(self, user))]
    pub async fn get_ticket(&self, user: &AuthUser, id: Uuid) -> Result<service_ticket::Model, ServiceError> {
        let ticket = service_ticket::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service ticket", id))?;
        user.ensure_region(&ticket.region)?;
        Ok(ticket)
    }

    #[instrument(skip(self, user))]
    pub async fn list_tickets(
        &self,
        user: &AuthUser,
        filter: TicketFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<service_ticket::Model>, u64), ServiceError> {
        let mut query = scope_to_regions(
            service_ticket::Entity::find(),
            service_ticket::Column::Region,
            user,
        );
        if let Some(status) = filter.status.as_deref() {
            query = query.filter(
                service_ticket::Column::Status.eq(stages::ensure_valid(TICKET_STATUSES, status)?),
            );
        }
        if let Some(region) = filter.region.as_deref().filter(|r| !r.trim().is_empty()) {
            query = query.filter(service_ticket::Column::Region.eq(normalize_region(region)?));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(service_ticket::Column::Priority.eq(priority));
        }

        let paginator = query
            .order_by_desc(service_ticket::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, user, input))]
    pub async fn update_ticket(
        &self,
        user: &AuthUser,
        id: Uuid,
        input: UpdateTicketInput,
    ) -> Result<service_ticket::Model, ServiceError> {
        let existing = self.get_ticket(user, id).await?;
        let mut model: service_ticket::ActiveModel = existing.into();

        if let Some(issue) = input.issue {
            model.issue = Set(require_text("issue", &issue)?);
        }
        if input.description.is_some() {
            model.description = Set(input.description);
        }
        if let Some(priority) = input.priority {
            model.priority = Set(priority);
        }
        if input.assigned_to.is_some() {
            model.assigned_to = Set(input.assigned_to);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, user))]
    pub async fn delete_ticket(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        self.get_ticket(user, id).await?;
        service_ticket::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }

    /// Entering `Resolved` stamps `resolved_at` once; moving back before it clears the stamp
    #[instrument(skip(self, user))]
    pub async fn move_status(
        &self,
        user: &AuthUser,
        id: Uuid,
        direction: StageMove,
    ) -> Result<service_ticket::Model, ServiceError> {
        let existing = self.get_ticket(user, id).await?;
        let from = existing.status.clone();
        let next = stages::step(TICKET_STATUSES, &from, direction)?;

        let resolved_idx = stages::position(TICKET_STATUSES, TICKET_RESOLVED);
        let next_idx = stages::position(TICKET_STATUSES, next);
        let already_resolved = existing.resolved_at.is_some();

        let mut model: service_ticket::ActiveModel = existing.into();
        model.status = Set(next.to_string());
        if next == TICKET_RESOLVED && !already_resolved {
            model.resolved_at = Set(Some(Utc::now()));
        } else if next_idx < resolved_idx {
            model.resolved_at = Set(None);
        }
        let updated = model.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::TicketStatusChanged {
                ticket_id: updated.id,
                from,
                to: updated.status.clone(),
            })
            .await;
        Ok(updated)
    }
}
