use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::app_user::{self, UserRole, ALL_REGIONS};
use crate::errors::ServiceError;

/// Feature areas a user can be granted
pub mod modules {
    pub const PROJECTS: &str = "projects";
    pub const FINANCE: &str = "finance";
    pub const HR: &str = "hr";
    pub const LOGISTICS: &str = "logistics";
    pub const PROCUREMENT: &str = "procurement";
    pub const STOCK: &str = "stock";
    pub const SERVICE: &str = "service";
    pub const REPORTS: &str = "reports";

    pub const ALL: &[&str] = &[
        PROJECTS,
        FINANCE,
        HR,
        LOGISTICS,
        PROCUREMENT,
        STOCK,
        SERVICE,
        REPORTS,
    ];

    pub fn is_known(key: &str) -> bool {
        ALL.contains(&key)
    }
}

/// Signed-in session resolved from a verified token and the `users` row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub regions: Vec<String>,
    pub modules: Vec<String>,
}

impl From<app_user::Model> for AuthUser {
    fn from(user: app_user::Model) -> Self {
        Self {
            regions: user.region_list(),
            modules: user.module_list(),
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Module guard. Admins see every module.
    pub fn has_module(&self, module: &str) -> bool {
        self.is_admin() || self.modules.iter().any(|m| m == module)
    }

    fn sees_all_regions(&self) -> bool {
        self.is_admin() || self.regions.iter().any(|r| r == ALL_REGIONS)
    }

    /// Region guard
    pub fn can_access_region(&self, region: &str) -> bool {
        if self.sees_all_regions() {
            return true;
        }
        let region = region.trim().to_ascii_lowercase();
        self.regions.iter().any(|r| *r == region)
    }

    /// Regions a list query must be restricted to; `None` means unrestricted
    pub fn region_scope(&self) -> Option<Vec<String>> {
        if self.sees_all_regions() {
            None
        } else {
            Some(self.regions.clone())
        }
    }

    pub fn ensure_region(&self, region: &str) -> Result<(), ServiceError> {
        if self.can_access_region(region) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "no access to region '{}'",
                region
            )))
        }
    }
}
