use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users_table::Migration),
            Box::new(m20260101_000002_create_project_tables::Migration),
            Box::new(m20260101_000003_create_payment_history_table::Migration),
            Box::new(m20260101_000004_create_finance_document_tables::Migration),
            Box::new(m20260101_000005_create_field_operation_tables::Migration),
            Box::new(m20260101_000006_create_stock_tables::Migration),
        ]
    }
}

async fn create_index(
    manager: &SchemaManager<'_>,
    name: &str,
    table: impl IntoTableRef,
    col: impl IntoIndexColumn,
) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .to_owned(),
        )
        .await
}

mod m20260101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::FullName).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::Regions)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Users::Modules)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Email,
        FullName,
        Role,
        Regions,
        Modules,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000002_create_project_tables {
    use super::create_index;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_project_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Projects::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Projects::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Projects::CustomerName).string().not_null())
                        .col(ColumnDef::new(Projects::Phone).string().null())
                        .col(ColumnDef::new(Projects::Address).string().null())
                        .col(ColumnDef::new(Projects::Region).string().not_null())
                        .col(
                            ColumnDef::new(Projects::CapacityKw)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Projects::Stage).string().not_null())
                        .col(
                            ColumnDef::new(Projects::ProposalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Projects::AdvancePayment)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Projects::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Projects::Notes).text().null())
                        .col(
                            ColumnDef::new(Projects::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Projects::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(manager, "idx_projects_region", Projects::Table, Projects::Region)
                .await?;
            create_index(manager, "idx_projects_stage", Projects::Table, Projects::Stage).await?;

            manager
                .create_table(
                    Table::create()
                        .table(ChitoorProjects::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ChitoorProjects::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ChitoorProjects::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ChitoorProjects::Phone).string().null())
                        .col(ColumnDef::new(ChitoorProjects::Address).string().null())
                        .col(ColumnDef::new(ChitoorProjects::Mandal).string().null())
                        .col(ColumnDef::new(ChitoorProjects::ServiceNumber).string().null())
                        .col(
                            ColumnDef::new(ChitoorProjects::CapacityKw)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ChitoorProjects::Stage).string().not_null())
                        .col(
                            ColumnDef::new(ChitoorProjects::ProposalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ChitoorProjects::AdvancePayment)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ChitoorProjects::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ChitoorProjects::Notes).text().null())
                        .col(
                            ColumnDef::new(ChitoorProjects::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ChitoorProjects::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_chitoor_projects_stage",
                ChitoorProjects::Table,
                ChitoorProjects::Stage,
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ChitoorProjects::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Projects::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Projects {
        Table,
        Id,
        CustomerName,
        Phone,
        Address,
        Region,
        CapacityKw,
        Stage,
        ProposalAmount,
        AdvancePayment,
        TaxAmount,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ChitoorProjects {
        Table,
        Id,
        CustomerName,
        Phone,
        Address,
        Mandal,
        ServiceNumber,
        CapacityKw,
        Stage,
        ProposalAmount,
        AdvancePayment,
        TaxAmount,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000003_create_payment_history_table {
    use super::create_index;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_payment_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Payments of both project kinds share this table; project_kind tells them apart
            manager
                .create_table(
                    Table::create()
                        .table(PaymentHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentHistory::ProjectId).uuid().not_null())
                        .col(
                            ColumnDef::new(PaymentHistory::ProjectKind)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentHistory::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(PaymentHistory::PaymentMode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentHistory::Reference).string().null())
                        .col(
                            ColumnDef::new(PaymentHistory::PaidAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentHistory::RecordedBy).uuid().null())
                        .col(ColumnDef::new(PaymentHistory::Notes).text().null())
                        .col(
                            ColumnDef::new(PaymentHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_payment_history_project_id",
                PaymentHistory::Table,
                PaymentHistory::ProjectId,
            )
            .await?;
            create_index(
                manager,
                "idx_payment_history_paid_at",
                PaymentHistory::Table,
                PaymentHistory::PaidAt,
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PaymentHistory {
        Table,
        Id,
        ProjectId,
        ProjectKind,
        Amount,
        PaymentMode,
        Reference,
        PaidAt,
        RecordedBy,
        Notes,
        CreatedAt,
    }
}

mod m20260101_000004_create_finance_document_tables {
    use super::create_index;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_finance_document_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TaxInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TaxInvoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TaxInvoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(TaxInvoices::ProjectId).uuid().null())
                        .col(ColumnDef::new(TaxInvoices::ProjectKind).string().null())
                        .col(ColumnDef::new(TaxInvoices::CustomerName).string().not_null())
                        .col(ColumnDef::new(TaxInvoices::CustomerGstin).string().null())
                        .col(ColumnDef::new(TaxInvoices::Region).string().not_null())
                        .col(ColumnDef::new(TaxInvoices::PlaceOfSupply).string().not_null())
                        .col(
                            ColumnDef::new(TaxInvoices::InterState)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(TaxInvoices::TaxableAmount).decimal().not_null())
                        .col(ColumnDef::new(TaxInvoices::GstRate).decimal().not_null())
                        .col(ColumnDef::new(TaxInvoices::Cgst).decimal().not_null())
                        .col(ColumnDef::new(TaxInvoices::Sgst).decimal().not_null())
                        .col(ColumnDef::new(TaxInvoices::Igst).decimal().not_null())
                        .col(ColumnDef::new(TaxInvoices::TotalAmount).decimal().not_null())
                        .col(
                            ColumnDef::new(TaxInvoices::IssuedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TaxInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TaxInvoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_tax_invoices_region",
                TaxInvoices::Table,
                TaxInvoices::Region,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EstimationCosts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EstimationCosts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EstimationCosts::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EstimationCosts::Region).string().not_null())
                        .col(
                            ColumnDef::new(EstimationCosts::CapacityKw)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EstimationCosts::ModuleCost).decimal().not_null())
                        .col(
                            ColumnDef::new(EstimationCosts::InverterCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EstimationCosts::StructureCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EstimationCosts::CablingCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EstimationCosts::InstallationCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EstimationCosts::OtherCost).decimal().not_null())
                        .col(
                            ColumnDef::new(EstimationCosts::MarginPercent)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EstimationCosts::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(EstimationCosts::MarginAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EstimationCosts::TotalCost).decimal().not_null())
                        .col(ColumnDef::new(EstimationCosts::CostPerKw).decimal().not_null())
                        .col(ColumnDef::new(EstimationCosts::Notes).text().null())
                        .col(
                            ColumnDef::new(EstimationCosts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EstimationCosts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_estimation_costs_region",
                EstimationCosts::Table,
                EstimationCosts::Region,
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EstimationCosts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TaxInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TaxInvoices {
        Table,
        Id,
        InvoiceNumber,
        ProjectId,
        ProjectKind,
        CustomerName,
        CustomerGstin,
        Region,
        PlaceOfSupply,
        InterState,
        TaxableAmount,
        GstRate,
        Cgst,
        Sgst,
        Igst,
        TotalAmount,
        IssuedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum EstimationCosts {
        Table,
        Id,
        CustomerName,
        Region,
        CapacityKw,
        ModuleCost,
        InverterCost,
        StructureCost,
        CablingCost,
        InstallationCost,
        OtherCost,
        MarginPercent,
        Subtotal,
        MarginAmount,
        TotalCost,
        CostPerKw,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000005_create_field_operation_tables {
    use super::create_index;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000005_create_field_operation_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceTickets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceTickets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceTickets::ProjectId).uuid().null())
                        .col(
                            ColumnDef::new(ServiceTickets::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceTickets::Region).string().not_null())
                        .col(ColumnDef::new(ServiceTickets::Issue).string().not_null())
                        .col(ColumnDef::new(ServiceTickets::Description).text().null())
                        .col(ColumnDef::new(ServiceTickets::Priority).string().not_null())
                        .col(ColumnDef::new(ServiceTickets::Status).string().not_null())
                        .col(ColumnDef::new(ServiceTickets::AssignedTo).string().null())
                        .col(
                            ColumnDef::new(ServiceTickets::ResolvedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ServiceTickets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceTickets::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_service_tickets_status",
                ServiceTickets::Table,
                ServiceTickets::Status,
            )
            .await?;
            create_index(
                manager,
                "idx_service_tickets_region",
                ServiceTickets::Table,
                ServiceTickets::Region,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Logistics::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Logistics::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Logistics::ProjectId).uuid().null())
                        .col(ColumnDef::new(Logistics::CustomerName).string().not_null())
                        .col(ColumnDef::new(Logistics::Region).string().not_null())
                        .col(ColumnDef::new(Logistics::Materials).text().not_null())
                        .col(ColumnDef::new(Logistics::VehicleNumber).string().null())
                        .col(ColumnDef::new(Logistics::DriverName).string().null())
                        .col(ColumnDef::new(Logistics::Status).string().not_null())
                        .col(
                            ColumnDef::new(Logistics::DispatchDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Logistics::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Logistics::Notes).text().null())
                        .col(
                            ColumnDef::new(Logistics::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Logistics::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(manager, "idx_logistics_region", Logistics::Table, Logistics::Region)
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Logistics::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ServiceTickets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServiceTickets {
        Table,
        Id,
        ProjectId,
        CustomerName,
        Region,
        Issue,
        Description,
        Priority,
        Status,
        AssignedTo,
        ResolvedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Logistics {
        Table,
        Id,
        ProjectId,
        CustomerName,
        Region,
        Materials,
        VehicleNumber,
        DriverName,
        Status,
        DispatchDate,
        DeliveredAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000006_create_stock_tables {
    use super::create_index;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000006_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockWarehouse::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockWarehouse::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockWarehouse::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StockWarehouse::Name).string().not_null())
                        .col(ColumnDef::new(StockWarehouse::Category).string().not_null())
                        .col(ColumnDef::new(StockWarehouse::Brand).string().null())
                        .col(ColumnDef::new(StockWarehouse::Unit).string().not_null())
                        .col(
                            ColumnDef::new(StockWarehouse::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockWarehouse::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockWarehouse::ReorderLevel).integer().null())
                        .col(
                            ColumnDef::new(StockWarehouse::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockWarehouse::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_stock_warehouse_category",
                StockWarehouse::Table,
                StockWarehouse::Category,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Procurements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Procurements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Procurements::Vendor).string().not_null())
                        .col(ColumnDef::new(Procurements::ItemName).string().not_null())
                        .col(ColumnDef::new(Procurements::StockItemId).uuid().null())
                        .col(ColumnDef::new(Procurements::Quantity).integer().not_null())
                        .col(ColumnDef::new(Procurements::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(Procurements::TotalAmount).decimal().not_null())
                        .col(ColumnDef::new(Procurements::Status).string().not_null())
                        .col(
                            ColumnDef::new(Procurements::ReceivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Procurements::Notes).text().null())
                        .col(
                            ColumnDef::new(Procurements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Procurements::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_procurements_stock_item_id")
                                .from(Procurements::Table, Procurements::StockItemId)
                                .to(StockWarehouse::Table, StockWarehouse::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_procurements_status",
                Procurements::Table,
                Procurements::Status,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProjectAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProjectAssignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProjectAssignments::ProjectId).uuid().null())
                        .col(ColumnDef::new(ProjectAssignments::ProjectKind).string().null())
                        .col(
                            ColumnDef::new(ProjectAssignments::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProjectAssignments::Region).string().not_null())
                        .col(
                            ColumnDef::new(ProjectAssignments::StockItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectAssignments::ItemCategory)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectAssignments::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectAssignments::SerialNumbers)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProjectAssignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_project_assignments_stock_item_id")
                                .from(ProjectAssignments::Table, ProjectAssignments::StockItemId)
                                .to(StockWarehouse::Table, StockWarehouse::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            create_index(
                manager,
                "idx_project_assignments_project_id",
                ProjectAssignments::Table,
                ProjectAssignments::ProjectId,
            )
            .await?;
            create_index(
                manager,
                "idx_project_assignments_customer_name",
                ProjectAssignments::Table,
                ProjectAssignments::CustomerName,
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProjectAssignments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Procurements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockWarehouse::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockWarehouse {
        Table,
        Id,
        Sku,
        Name,
        Category,
        Brand,
        Unit,
        Quantity,
        UnitCost,
        ReorderLevel,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Procurements {
        Table,
        Id,
        Vendor,
        ItemName,
        StockItemId,
        Quantity,
        UnitPrice,
        TotalAmount,
        Status,
        ReceivedAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProjectAssignments {
        Table,
        Id,
        ProjectId,
        ProjectKind,
        CustomerName,
        Region,
        StockItemId,
        ItemCategory,
        Quantity,
        SerialNumbers,
        CreatedAt,
    }
}
