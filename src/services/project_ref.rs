use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::chitoor_project::{self, CHITOOR_REGION};
use crate::entities::payment_history::ProjectKind;
use crate::entities::project;
use crate::errors::ServiceError;

/// The fields of either project kind that finance and stock code need
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectSnapshot {
    pub id: Uuid,
    pub kind: ProjectKind,
    pub customer_name: String,
    pub region: String,
    pub stage: String,
    pub capacity_kw: Decimal,
    pub proposal_amount: Decimal,
    pub advance_payment: Decimal,
    pub tax_amount: Decimal,
}

impl From<project::Model> for ProjectSnapshot {
    fn from(p: project::Model) -> Self {
        Self {
            id: p.id,
            kind: ProjectKind::Project,
            customer_name: p.customer_name,
            region: p.region,
            stage: p.stage,
            capacity_kw: p.capacity_kw,
            proposal_amount: p.proposal_amount,
            advance_payment: p.advance_payment,
            tax_amount: p.tax_amount,
        }
    }
}

impl From<chitoor_project::Model> for ProjectSnapshot {
    fn from(p: chitoor_project::Model) -> Self {
        Self {
            id: p.id,
            kind: ProjectKind::Chitoor,
            customer_name: p.customer_name,
            region: CHITOOR_REGION.to_string(),
            stage: p.stage,
            capacity_kw: p.capacity_kw,
            proposal_amount: p.proposal_amount,
            advance_payment: p.advance_payment,
            tax_amount: p.tax_amount,
        }
    }
}

/// Loads one project of the given kind
pub async fn load<C: ConnectionTrait>(
    db: &C,
    kind: ProjectKind,
    id: Uuid,
) -> Result<ProjectSnapshot, ServiceError> {
    let snapshot = match kind {
        ProjectKind::Project => project::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(ProjectSnapshot::from),
        ProjectKind::Chitoor => chitoor_project::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(ProjectSnapshot::from),
    };

    snapshot.ok_or_else(|| ServiceError::not_found(kind_label(kind), id))
}

/// Loads many projects of both kinds keyed by `(kind, id)`
pub async fn load_many<C: ConnectionTrait>(
    db: &C,
    refs: &[(ProjectKind, Uuid)],
) -> Result<HashMap<(ProjectKind, Uuid), ProjectSnapshot>, ServiceError> {
    let ids_of = |wanted: ProjectKind| -> Vec<Uuid> {
        refs.iter()
            .filter(|(kind, _)| *kind == wanted)
            .map(|(_, id)| *id)
            .collect()
    };

    let mut out = HashMap::new();

    let project_ids = ids_of(ProjectKind::Project);
    if !project_ids.is_empty() {
        for p in project::Entity::find()
            .filter(project::Column::Id.is_in(project_ids))
            .all(db)
            .await?
        {
            out.insert((ProjectKind::Project, p.id), ProjectSnapshot::from(p));
        }
    }

    let chitoor_ids = ids_of(ProjectKind::Chitoor);
    if !chitoor_ids.is_empty() {
        for p in chitoor_project::Entity::find()
            .filter(chitoor_project::Column::Id.is_in(chitoor_ids))
            .all(db)
            .await?
        {
            out.insert((ProjectKind::Chitoor, p.id), ProjectSnapshot::from(p));
        }
    }

    Ok(out)
}

pub fn kind_label(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Project => "Project",
        ProjectKind::Chitoor => "Chitoor project",
    }
}
