use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Region key granting access to every region
pub const ALL_REGIONS: &str = "*";

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "staff")]
    Staff,
}

/// Console user profile. The identity provider owns credentials; this row owns access.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
#[schema(as = AppUser)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    /// Comma-separated region keys
    pub regions: String,
    /// Comma-separated module keys
    pub modules: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn region_list(&self) -> Vec<String> {
        split_list(&self.regions)
    }

    pub fn module_list(&self) -> Vec<String> {
        split_list(&self.modules)
    }
}

/// Splits a stored comma-separated list, dropping blanks and normalizing case
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Inverse of [`split_list`]
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| s.as_ref().trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_normalized_both_ways() {
        assert_eq!(split_list(" Chitoor, ,nellore "), vec!["chitoor", "nellore"]);
        assert_eq!(join_list(&["Chitoor", " ", "nellore"]), "chitoor,nellore");
        assert!(split_list("").is_empty());
    }

    #[test]
    fn joined_lists_drop_repeats_anywhere() {
        assert_eq!(join_list(&["guntur", "Nellore", "GUNTUR", "nellore"]), "guntur,nellore");
    }
}
