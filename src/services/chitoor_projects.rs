use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{require_non_negative, require_text};
use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::chitoor_project::{self, CHITOOR_REGION},
    entities::payment_history::{self, ProjectKind},
    entities::project_assignment,
    errors::ServiceError,
    events::{Event, EventSender},
    stages::{self, StageMove, CHITOOR_STAGES},
};

#[derive(Debug, Clone)]
pub struct CreateChitoorProjectInput {
    pub customer_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub mandal: Option<String>,
    pub service_number: Option<String>,
    pub capacity_kw: Decimal,
    pub stage: Option<String>,
    pub proposal_amount: Decimal,
    pub advance_payment: Decimal,
    pub tax_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateChitoorProjectInput {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub mandal: Option<String>,
    pub service_number: Option<String>,
    pub capacity_kw: Option<Decimal>,
    pub proposal_amount: Option<Decimal>,
    pub advance_payment: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChitoorProjectFilter {
    pub stage: Option<String>,
    pub mandal: Option<String>,
    pub search: Option<String>,
}

/// Service for Chitoor region projects. Every row lives in the `chitoor` region.
pub struct ChitoorProjectService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ChitoorProjectService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create_project(
        &self,
        user: &AuthUser,
        input: CreateChitoorProjectInput,
    ) -> Result<chitoor_project::Model, ServiceError> {
        user.ensure_region(CHITOOR_REGION)?;

        let stage = match input.stage.as_deref() {
            Some(stage) => stages::ensure_valid(CHITOOR_STAGES, stage)?,
            None => stages::initial(CHITOOR_STAGES),
        };

        let model = chitoor_project::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_name: Set(require_text("customer_name", &input.customer_name)?),
            phone: Set(input.phone),
            address: Set(input.address),
            mandal: Set(input.mandal),
            service_number: Set(input.service_number),
            capacity_kw: Set(require_non_negative("capacity_kw", input.capacity_kw)?),
            stage: Set(stage.to_string()),
            proposal_amount: Set(require_non_negative("proposal_amount", input.proposal_amount)?),
            advance_payment: Set(require_non_negative("advance_payment", input.advance_payment)?),
            tax_amount: Set(require_non_negative("tax_amount", input.tax_amount)?),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(project_id = %model.id, "chitoor project created");
        self.event_sender
            .send_or_log(Event::ProjectCreated {
                project_id: model.id,
                kind: ProjectKind::Chitoor,
                region: CHITOOR_REGION.to_string(),
            })
            .await;

        Ok(model)
    }

    async fn find(&self, user: &AuthUser, id: Uuid) -> Result<chitoor_project::Model, ServiceError> {
        user.ensure_region(CHITOOR_REGION)?;
        chitoor_project::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Chitoor project", id))
    }

    #[instrument(skip(self, user))]
    pub async fn get_project(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<chitoor_project::Model, ServiceError> {
        self.find(user, id).await
    }

    #[instrument(skip(self, user))]
    pub async fn list_projects(
        &self,
        user: &AuthUser,
        filter: ChitoorProjectFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<chitoor_project::Model>, u64), ServiceError> {
        user.ensure_region(CHITOOR_REGION)?;
        let db = &*self.db_pool;
        let mut query = chitoor_project::Entity::find();

        if let Some(stage) = filter.stage.as_deref() {
            query = query.filter(
                chitoor_project::Column::Stage.eq(stages::ensure_valid(CHITOOR_STAGES, stage)?),
            );
        }
        if let Some(mandal) = filter.mandal.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(chitoor_project::Column::Mandal.eq(mandal));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(chitoor_project::Column::CustomerName.contains(search));
        }

        let paginator = query
            .order_by_desc(chitoor_project::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;

        Ok((items, total))
    }

    #[instrument(skip(self, user, input))]
    pub async fn update_project(
        &self,
        user: &AuthUser,
        id: Uuid,
        input: UpdateChitoorProjectInput,
    ) -> Result<chitoor_project::Model, ServiceError> {
        let existing = self.find(user, id).await?;
        let mut model: chitoor_project::ActiveModel = existing.into();

        if let Some(name) = input.customer_name {
            model.customer_name = Set(require_text("customer_name", &name)?);
        }
        if input.phone.is_some() {
            model.phone = Set(input.phone);
        }
        if input.address.is_some() {
            model.address = Set(input.address);
        }
        if input.mandal.is_some() {
            model.mandal = Set(input.mandal);
        }
        if input.service_number.is_some() {
            model.service_number = Set(input.service_number);
        }
        if let Some(v) = input.capacity_kw {
            model.capacity_kw = Set(require_non_negative("capacity_kw", v)?);
        }
        if let Some(v) = input.proposal_amount {
            model.proposal_amount = Set(require_non_negative("proposal_amount", v)?);
        }
        if let Some(v) = input.advance_payment {
            model.advance_payment = Set(require_non_negative("advance_payment", v)?);
        }
        if let Some(v) = input.tax_amount {
            model.tax_amount = Set(require_non_negative("tax_amount", v)?);
        }
        if input.notes.is_some() {
            model.notes = Set(input.notes);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, user))]
    pub async fn delete_project(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.find(user, id).await?;

        let payments = payment_history::Entity::find()
            .filter(payment_history::Column::ProjectKind.eq(ProjectKind::Chitoor))
            .filter(payment_history::Column::ProjectId.eq(id))
            .count(db)
            .await?;
        let assignments = project_assignment::Entity::find()
            .filter(project_assignment::Column::ProjectId.eq(id))
            .count(db)
            .await?;
        if payments > 0 || assignments > 0 {
            return Err(ServiceError::Conflict(format!(
                "chitoor project {} has {} payment(s) and {} assignment(s)",
                id, payments, assignments
            )));
        }

        chitoor_project::Entity::delete_by_id(id).exec(db).await?;
        self.event_sender
            .send_or_log(Event::ProjectDeleted {
                project_id: id,
                kind: ProjectKind::Chitoor,
            })
            .await;
        Ok(())
    }

    #[instrument(skip(self, user))]
    pub async fn move_stage(
        &self,
        user: &AuthUser,
        id: Uuid,
        direction: StageMove,
    ) -> Result<chitoor_project::Model, ServiceError> {
        let existing = self.find(user, id).await?;
        let next = stages::step(CHITOOR_STAGES, &existing.stage, direction)?;
        self.write_stage(existing, next).await
    }

    #[instrument(skip(self, user))]
    pub async fn set_stage(
        &self,
        user: &AuthUser,
        id: Uuid,
        stage: &str,
    ) -> Result<chitoor_project::Model, ServiceError> {
        let next = stages::ensure_valid(CHITOOR_STAGES, stage)?;
        let existing = self.find(user, id).await?;
        self.write_stage(existing, next).await
    }

    async fn write_stage(
        &self,
        existing: chitoor_project::Model,
        next: &str,
    ) -> Result<chitoor_project::Model, ServiceError> {
        let from = existing.stage.clone();
        let mut model: chitoor_project::ActiveModel = existing.into();
        model.stage = Set(next.to_string());
        let updated = model.update(&*self.db_pool).await?;

        counter!("solar_console_stage_moves_total", 1, "kind" => "chitoor");
        self.event_sender
            .send_or_log(Event::ProjectStageChanged {
                project_id: updated.id,
                kind: ProjectKind::Chitoor,
                from,
                to: updated.stage.clone(),
            })
            .await;

        Ok(updated)
    }
}
