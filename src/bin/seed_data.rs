//! Seed data script: an admin profile and a starter hardware catalog
//!
//! Run with: cargo run --bin seed-data -- --admin-email ops@example.com
//!
//! Safe to re-run; existing users (by email) and SKUs are left untouched.

use std::time::Duration as StdDuration;

use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use uuid::Uuid;

use solar_console_api::{
    auth::modules,
    entities::{
        app_user::{self, UserRole, ALL_REGIONS},
        stock_item::{self, StockCategory},
    },
    migrator::Migrator,
};

#[derive(Parser)]
#[command(name = "seed-data", about = "Seed an admin user and the starter catalog", version)]
struct Cli {
    #[arg(long, help = "Database URL; falls back to DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, help = "Admin email; must match the identity provider account")]
    admin_email: String,

    #[arg(long, default_value = "Console Admin")]
    admin_name: String,

    #[arg(long, help = "Identity provider subject for the admin; generated when omitted")]
    admin_id: Option<Uuid>,

    #[arg(long, help = "Skip the hardware catalog")]
    skip_catalog: bool,
}

struct CatalogEntry {
    sku: &'static str,
    name: &'static str,
    category: StockCategory,
    brand: &'static str,
    unit: &'static str,
    quantity: i32,
    unit_cost: Decimal,
    reorder_level: i32,
}

fn starter_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            sku: "MOD-MONO-540",
            name: "540 Wp mono PERC module",
            category: StockCategory::Module,
            brand: "Waaree",
            unit: "nos",
            quantity: 120,
            unit_cost: dec!(13500),
            reorder_level: 40,
        },
        CatalogEntry {
            sku: "MOD-BIF-550",
            name: "550 Wp bifacial module",
            category: StockCategory::Module,
            brand: "Adani",
            unit: "nos",
            quantity: 60,
            unit_cost: dec!(15200),
            reorder_level: 20,
        },
        CatalogEntry {
            sku: "INV-ONG-3K",
            name: "3 kW on-grid inverter",
            category: StockCategory::Inverter,
            brand: "Growatt",
            unit: "nos",
            quantity: 15,
            unit_cost: dec!(32000),
            reorder_level: 5,
        },
        CatalogEntry {
            sku: "INV-ONG-5K",
            name: "5 kW on-grid inverter",
            category: StockCategory::Inverter,
            brand: "Growatt",
            unit: "nos",
            quantity: 10,
            unit_cost: dec!(46000),
            reorder_level: 4,
        },
        CatalogEntry {
            sku: "STR-GI-1KW",
            name: "GI mounting structure, 1 kW set",
            category: StockCategory::Structure,
            brand: "Local",
            unit: "set",
            quantity: 30,
            unit_cost: dec!(6500),
            reorder_level: 10,
        },
        CatalogEntry {
            sku: "CAB-DC-4SQ",
            name: "4 sq mm DC solar cable",
            category: StockCategory::Cable,
            brand: "Polycab",
            unit: "m",
            quantity: 2000,
            unit_cost: dec!(48),
            reorder_level: 500,
        },
        CatalogEntry {
            sku: "ACC-MC4",
            name: "MC4 connector pair",
            category: StockCategory::Accessory,
            brand: "Staubli",
            unit: "pair",
            quantity: 300,
            unit_cost: dec!(85),
            reorder_level: 100,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://solar_console.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    seed_admin(&db, &cli).await?;

    if !cli.skip_catalog {
        let created = seed_catalog(&db).await?;
        info!("Created {} catalog item(s)", created);
    }

    info!("Seed complete. Explore the API at http://localhost:8080/swagger-ui");
    Ok(())
}

async fn seed_admin(db: &DatabaseConnection, cli: &Cli) -> anyhow::Result<()> {
    let email = cli.admin_email.trim().to_ascii_lowercase();
    let existing = app_user::Entity::find()
        .filter(app_user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if let Some(user) = existing {
        info!(user_id = %user.id, "admin {} already exists", email);
        return Ok(());
    }

    let user = app_user::ActiveModel {
        id: Set(cli.admin_id.unwrap_or_else(Uuid::new_v4)),
        email: Set(email),
        full_name: Set(cli.admin_name.clone()),
        role: Set(UserRole::Admin),
        regions: Set(ALL_REGIONS.to_string()),
        modules: Set(modules::ALL.join(",")),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = %user.id, "created admin {}", user.email);
    Ok(())
}

async fn seed_catalog(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let mut created = 0;
    for entry in starter_catalog() {
        let exists = stock_item::Entity::find()
            .filter(stock_item::Column::Sku.eq(entry.sku))
            .count(db)
            .await?;
        if exists > 0 {
            continue;
        }

        stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(entry.sku.to_string()),
            name: Set(entry.name.to_string()),
            category: Set(entry.category),
            brand: Set(Some(entry.brand.to_string())),
            unit: Set(entry.unit.to_string()),
            quantity: Set(entry.quantity),
            unit_cost: Set(entry.unit_cost),
            reorder_level: Set(Some(entry.reorder_level)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }
    Ok(created)
}
