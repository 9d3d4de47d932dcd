//! Batch entity: a tracked production lot of one product

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a batch.
///
/// Moves through the happy path CREATED → HARVESTED → IN_STORAGE →
/// IN_TRANSIT → DELIVERED → AT_RETAILER → SOLD, driven by recorded events.
/// EXPIRED and RECALLED are out-of-band, settable at any time. Nothing
/// forbids backward moves via the direct status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "HARVESTED")]
    Harvested,
    #[sea_orm(string_value = "IN_STORAGE")]
    InStorage,
    #[sea_orm(string_value = "IN_TRANSIT")]
    InTransit,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "AT_RETAILER")]
    AtRetailer,
    #[sea_orm(string_value = "SOLD")]
    Sold,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "RECALLED")]
    Recalled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "CREATED",
            BatchStatus::Harvested => "HARVESTED",
            BatchStatus::InStorage => "IN_STORAGE",
            BatchStatus::InTransit => "IN_TRANSIT",
            BatchStatus::Delivered => "DELIVERED",
            BatchStatus::AtRetailer => "AT_RETAILER",
            BatchStatus::Sold => "SOLD",
            BatchStatus::Expired => "EXPIRED",
            BatchStatus::Recalled => "RECALLED",
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(BatchStatus::Created),
            "HARVESTED" => Ok(BatchStatus::Harvested),
            "IN_STORAGE" => Ok(BatchStatus::InStorage),
            "IN_TRANSIT" => Ok(BatchStatus::InTransit),
            "DELIVERED" => Ok(BatchStatus::Delivered),
            "AT_RETAILER" => Ok(BatchStatus::AtRetailer),
            "SOLD" => Ok(BatchStatus::Sold),
            "EXPIRED" => Ok(BatchStatus::Expired),
            "RECALLED" => Ok(BatchStatus::Recalled),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Human-readable batch code (unique), the public tracking key
    #[sea_orm(unique)]
    pub batch_code: String,

    pub product_id: i64,

    /// Units in this lot
    pub quantity: i32,

    pub production_date: ChronoDateTimeUtc,
    pub expiration_date: Option<ChronoDateTimeUtc>,

    pub status: BatchStatus,

    pub qr_code_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// User that created the batch
    pub created_by: i64,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Creator,

    /// Chain-of-custody log for this batch
    #[sea_orm(has_many = "super::supply_chain_event::Entity")]
    Events,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::supply_chain_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
