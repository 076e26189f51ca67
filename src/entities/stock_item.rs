use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum StockCategory {
    #[sea_orm(string_value = "Module")]
    Module,
    #[sea_orm(string_value = "Inverter")]
    Inverter,
    #[sea_orm(string_value = "Structure")]
    Structure,
    #[sea_orm(string_value = "Cable")]
    Cable,
    #[sea_orm(string_value = "Accessory")]
    Accessory,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl StockCategory {
    /// Only panels and inverters are assigned to customers one by one
    pub fn is_assignable(&self) -> bool {
        matches!(self, StockCategory::Module | StockCategory::Inverter)
    }
}

/// Hardware catalog entry with its on-hand quantity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "stock_warehouse")]
#[schema(as = StockItem)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub category: StockCategory,
    pub brand: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub reorder_level: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Low when at or below its own reorder level, or the global threshold without one
    pub fn is_low(&self, default_threshold: i32) -> bool {
        self.quantity <= self.reorder_level.unwrap_or(default_threshold)
    }
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
