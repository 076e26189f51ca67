use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::require_text;
use crate::{
    auth::{modules, AuthUser},
    db::DbPool,
    entities::app_user::{self, join_list, UserRole, ALL_REGIONS},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub regions: Vec<String>,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub regions: Option<Vec<String>>,
    pub modules: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Rejects module keys the console does not know
pub fn validate_modules(keys: &[String]) -> Result<String, ServiceError> {
    let unknown: Vec<&str> = keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty() && !modules::is_known(&k.to_ascii_lowercase()))
        .collect();
    if !unknown.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "unknown module(s): {}",
            unknown.join(", ")
        )));
    }
    Ok(join_list(keys))
}

fn role_rank(role: UserRole) -> u8 {
    match role {
        UserRole::Staff => 0,
        UserRole::Manager => 1,
        UserRole::Admin => 2,
    }
}

/// Non-admins may only hand out access they already hold. The wildcard region
/// and the admin role stay with admins.
fn ensure_may_grant(
    actor: &AuthUser,
    role: Option<UserRole>,
    regions: &[String],
    module_keys: &[String],
) -> Result<(), ServiceError> {
    if actor.is_admin() {
        return Ok(());
    }
    if let Some(role) = role {
        if role_rank(role) > role_rank(actor.role) {
            return Err(ServiceError::Forbidden(format!(
                "you cannot grant the {} role",
                role
            )));
        }
    }
    for region in regions {
        let key = region.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        if key == ALL_REGIONS {
            return Err(ServiceError::Forbidden(
                "only admins can grant all regions".to_string(),
            ));
        }
        if !actor.can_access_region(&key) {
            return Err(ServiceError::Forbidden(format!(
                "you cannot grant region '{}'",
                key
            )));
        }
    }
    for module in module_keys {
        let key = module.trim().to_ascii_lowercase();
        if !key.is_empty() && !actor.has_module(&key) {
            return Err(ServiceError::Forbidden(format!(
                "you cannot grant module '{}'",
                key
            )));
        }
    }
    Ok(())
}

/// HR: console user profiles and their access
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        include_inactive: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<app_user::Model>, u64), ServiceError> {
        let mut query = app_user::Entity::find();
        if !include_inactive {
            query = query.filter(app_user::Column::IsActive.eq(true));
        }
        let paginator = query
            .order_by_asc(app_user::Column::FullName)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<app_user::Model, ServiceError> {
        app_user::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// The profile id should match the identity provider's subject
    #[instrument(skip(self, actor, input), fields(email = %input.email))]
    pub async fn create_user(
        &self,
        actor: &AuthUser,
        input: CreateUserInput,
    ) -> Result<app_user::Model, ServiceError> {
        let db = &*self.db_pool;
        let email = require_text("email", &input.email)?.to_ascii_lowercase();
        let modules = validate_modules(&input.modules)?;
        ensure_may_grant(actor, Some(input.role), &input.regions, &input.modules)?;

        let taken = app_user::Entity::find()
            .filter(app_user::Column::Email.eq(email.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!("{} is already registered", email)));
        }

        let user = app_user::ActiveModel {
            id: Set(input.id.unwrap_or_else(Uuid::new_v4)),
            email: Set(email),
            full_name: Set(require_text("full_name", &input.full_name)?),
            role: Set(input.role),
            regions: Set(join_list(&input.regions)),
            modules: Set(modules),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id = %user.id, role = %user.role, "user created");
        self.event_sender
            .send_or_log(Event::UserChanged {
                user_id: user.id,
                active: true,
            })
            .await;
        Ok(user)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<app_user::Model, ServiceError> {
        let existing = self.get_user(id).await?;
        let changes_access =
            input.role.is_some() || input.regions.is_some() || input.modules.is_some();
        if !actor.is_admin() {
            if existing.role == UserRole::Admin {
                return Err(ServiceError::Forbidden(
                    "only admins can change an admin profile".to_string(),
                ));
            }
            if changes_access && id == actor.user_id {
                return Err(ServiceError::Forbidden(
                    "you cannot change your own access".to_string(),
                ));
            }
        }
        if let Some(keys) = &input.modules {
            validate_modules(keys)?;
        }
        let regions = input.regions.clone().unwrap_or_default();
        let module_keys = input.modules.clone().unwrap_or_default();
        ensure_may_grant(actor, input.role, &regions, &module_keys)?;
        if input.is_active == Some(false) && id == actor.user_id {
            return Err(ServiceError::InvalidOperation(
                "you cannot deactivate your own account".to_string(),
            ));
        }

        let mut model: app_user::ActiveModel = existing.into();
        if let Some(name) = input.full_name {
            model.full_name = Set(require_text("full_name", &name)?);
        }
        if let Some(role) = input.role {
            model.role = Set(role);
        }
        if input.regions.is_some() {
            model.regions = Set(join_list(&regions));
        }
        if input.modules.is_some() {
            model.modules = Set(join_list(&module_keys));
        }
        if let Some(active) = input.is_active {
            model.is_active = Set(active);
        }
        let updated = model.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::UserChanged {
                user_id: updated.id,
                active: updated.is_active,
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn deactivate_user(&self, actor: &AuthUser, id: Uuid) -> Result<app_user::Model, ServiceError> {
        self.update_user(
            actor,
            id,
            UpdateUserInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn manager() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "manager@example.in".into(),
            full_name: "Manager".into(),
            role: UserRole::Manager,
            regions: vec!["chitoor".into()],
            modules: vec!["hr".into()],
        }
    }

    #[test]
    fn module_keys_are_checked() {
        assert_eq!(
            validate_modules(&["Projects".into(), "finance".into()]).unwrap(),
            "projects,finance"
        );
        assert_matches!(
            validate_modules(&["payroll".into()]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn managers_cannot_grant_admin_or_wildcard() {
        let actor = manager();
        assert!(ensure_may_grant(&actor, Some(UserRole::Staff), &["chitoor".into()], &[]).is_ok());
        assert_matches!(
            ensure_may_grant(&actor, Some(UserRole::Admin), &[], &[]),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(
            ensure_may_grant(&actor, Some(UserRole::Staff), &["*".into()], &[]),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[test]
    fn grants_are_limited_to_the_actors_own_access() {
        let actor = manager();
        assert!(ensure_may_grant(&actor, None, &["Chitoor".into()], &["HR".into()]).is_ok());
        assert_matches!(
            ensure_may_grant(&actor, None, &["nellore".into()], &[]),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(
            ensure_may_grant(&actor, None, &[], &["finance".into()]),
            Err(ServiceError::Forbidden(_))
        );

        let staff = AuthUser {
            role: UserRole::Staff,
            ..manager()
        };
        assert_matches!(
            ensure_may_grant(&staff, Some(UserRole::Manager), &[], &[]),
            Err(ServiceError::Forbidden(_))
        );
    }
}
