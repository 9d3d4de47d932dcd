//! Initial schema: users, products, conditions, batches, events, notifications

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Users::Username, 64).not_null().unique_key())
                    .col(string_len(Users::Email, 255).not_null().unique_key())
                    .col(string_len(Users::PasswordHash, 255).not_null())
                    .col(string_len(Users::Role, 32).not_null())
                    .col(json(Users::Permissions).not_null())
                    .col(boolean(Users::Enabled).not_null().default(true))
                    .col(boolean(Users::Verified).not_null().default(false))
                    .col(string_len_null(Users::FirstName, 128))
                    .col(string_len_null(Users::LastName, 128))
                    .col(string_len_null(Users::PhoneNumber, 32))
                    .col(string_len_null(Users::ProfileImageUrl, 512))
                    .col(string_len_null(Users::CompanyName, 255))
                    .col(string_len_null(Users::CompanyAddress, 255))
                    .col(string_len_null(Users::LocationCoordinates, 64))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create products table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Products::BatchCode, 64).not_null().unique_key())
                    .col(string_len(Products::Name, 255).not_null())
                    .col(text_null(Products::Description))
                    .col(double(Products::Price).not_null().default(0.0))
                    .col(integer(Products::Stock).not_null().default(0))
                    .col(timestamp_with_time_zone_null(Products::HarvestDate))
                    .col(timestamp_with_time_zone_null(Products::ExpirationDate))
                    .col(string_len_null(Products::ProductType, 64))
                    .col(boolean(Products::Organic).not_null().default(false))
                    .col(string_len_null(Products::Certification, 255))
                    .col(string_len_null(Products::CultivationMethod, 64))
                    .col(string_len_null(Products::ImageUrl, 512))
                    .col(string_len_null(Products::QrCodeUrl, 512))
                    .col(big_integer(Products::UserId).not_null())
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_user_id")
                            .from(Products::Table, Products::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_batch_code")
                    .table(Products::Table)
                    .col(Products::BatchCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_user_id")
                    .table(Products::Table)
                    .col(Products::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_expiration_date")
                    .table(Products::Table)
                    .col(Products::ExpirationDate)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create product_environmental_conditions table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ProductEnvironmentalConditions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductEnvironmentalConditions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(ProductEnvironmentalConditions::ProductId).not_null())
                    .col(double_null(ProductEnvironmentalConditions::Temperature))
                    .col(double_null(ProductEnvironmentalConditions::Humidity))
                    .col(double_null(ProductEnvironmentalConditions::LightExposure))
                    .col(double_null(ProductEnvironmentalConditions::SoilMoisture))
                    .col(double_null(ProductEnvironmentalConditions::SoilPh))
                    .col(double_null(ProductEnvironmentalConditions::AirQuality))
                    .col(string_len_null(ProductEnvironmentalConditions::Location, 255))
                    .col(text_null(ProductEnvironmentalConditions::Notes))
                    .col(string_len_null(ProductEnvironmentalConditions::RecordedBy, 128))
                    .col(
                        timestamp_with_time_zone(ProductEnvironmentalConditions::RecordedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_environmental_conditions_product_id")
                            .from(ProductEnvironmentalConditions::Table, ProductEnvironmentalConditions::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_product_environmental_conditions_product_id")
                    .table(ProductEnvironmentalConditions::Table)
                    .col(ProductEnvironmentalConditions::ProductId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create batches table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Batches::BatchCode, 64).not_null().unique_key())
                    .col(big_integer(Batches::ProductId).not_null())
                    .col(integer(Batches::Quantity).not_null().default(0))
                    .col(timestamp_with_time_zone(Batches::ProductionDate).not_null())
                    .col(timestamp_with_time_zone_null(Batches::ExpirationDate))
                    .col(string_len(Batches::Status, 32).not_null().default("CREATED"))
                    .col(string_len_null(Batches::QrCodeUrl, 512))
                    .col(text_null(Batches::Notes))
                    .col(big_integer(Batches::CreatedBy).not_null())
                    .col(
                        timestamp_with_time_zone(Batches::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batches_product_id")
                            .from(Batches::Table, Batches::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batches_created_by")
                            .from(Batches::Table, Batches::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batches_batch_code")
                    .table(Batches::Table)
                    .col(Batches::BatchCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batches_product_id")
                    .table(Batches::Table)
                    .col(Batches::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batches_status")
                    .table(Batches::Table)
                    .col(Batches::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batches_created_by")
                    .table(Batches::Table)
                    .col(Batches::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create supply_chain_events table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(SupplyChainEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupplyChainEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(SupplyChainEvents::BatchId).not_null())
                    .col(string_len(SupplyChainEvents::EventType, 32).not_null())
                    .col(big_integer(SupplyChainEvents::InitiatedBy).not_null())
                    .col(big_integer_null(SupplyChainEvents::ReceivedBy))
                    .col(string_len_null(SupplyChainEvents::Location, 255))
                    .col(string_len_null(SupplyChainEvents::GeoCoordinates, 64))
                    .col(double_null(SupplyChainEvents::Temperature))
                    .col(double_null(SupplyChainEvents::Humidity))
                    .col(text_null(SupplyChainEvents::Notes))
                    .col(string_len_null(SupplyChainEvents::BlockchainTxHash, 128))
                    .col(text_null(SupplyChainEvents::AdditionalData))
                    .col(
                        timestamp_with_time_zone(SupplyChainEvents::EventTime)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supply_chain_events_batch_id")
                            .from(SupplyChainEvents::Table, SupplyChainEvents::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supply_chain_events_initiated_by")
                            .from(SupplyChainEvents::Table, SupplyChainEvents::InitiatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supply_chain_events_received_by")
                            .from(SupplyChainEvents::Table, SupplyChainEvents::ReceivedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_supply_chain_events_batch_id")
                    .table(SupplyChainEvents::Table)
                    .col(SupplyChainEvents::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_supply_chain_events_event_time")
                    .table(SupplyChainEvents::Table)
                    .col(SupplyChainEvents::EventTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_supply_chain_events_initiated_by")
                    .table(SupplyChainEvents::Table)
                    .col(SupplyChainEvents::InitiatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_supply_chain_events_received_by")
                    .table(SupplyChainEvents::Table)
                    .col(SupplyChainEvents::ReceivedBy)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create notifications table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(Notifications::UserId).not_null())
                    .col(string_len(Notifications::Title, 255).not_null())
                    .col(text(Notifications::Message).not_null())
                    .col(boolean(Notifications::Read).not_null().default(false))
                    .col(string_len(Notifications::NotificationType, 32).not_null())
                    .col(string_len_null(Notifications::RelatedEntityType, 32))
                    .col(big_integer_null(Notifications::RelatedEntityId))
                    .col(
                        timestamp_with_time_zone(Notifications::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_read")
                    .table(Notifications::Table)
                    .col(Notifications::Read)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SupplyChainEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Batches::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProductEnvironmentalConditions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    Permissions,
    Enabled,
    Verified,
    FirstName,
    LastName,
    PhoneNumber,
    ProfileImageUrl,
    CompanyName,
    CompanyAddress,
    LocationCoordinates,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    BatchCode,
    Name,
    Description,
    Price,
    Stock,
    HarvestDate,
    ExpirationDate,
    ProductType,
    Organic,
    Certification,
    CultivationMethod,
    ImageUrl,
    QrCodeUrl,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProductEnvironmentalConditions {
    Table,
    Id,
    ProductId,
    Temperature,
    Humidity,
    LightExposure,
    SoilMoisture,
    SoilPh,
    AirQuality,
    Location,
    Notes,
    RecordedBy,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Batches {
    Table,
    Id,
    BatchCode,
    ProductId,
    Quantity,
    ProductionDate,
    ExpirationDate,
    Status,
    QrCodeUrl,
    Notes,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SupplyChainEvents {
    Table,
    Id,
    BatchId,
    EventType,
    InitiatedBy,
    ReceivedBy,
    Location,
    GeoCoordinates,
    Temperature,
    Humidity,
    Notes,
    BlockchainTxHash,
    AdditionalData,
    EventTime,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Title,
    Message,
    Read,
    NotificationType,
    RelatedEntityType,
    RelatedEntityId,
    CreatedAt,
}
