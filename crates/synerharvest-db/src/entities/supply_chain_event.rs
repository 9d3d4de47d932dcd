//! Supply-chain event entity: the chain-of-custody log
//!
//! One unified event model covers everything recorded against a batch, from
//! the initial CREATED marker through final sale or disposal. Status-bearing
//! event types drive the batch status via [`EventType::derived_status`].

use super::batch::BatchStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle stage an event records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "HARVESTED")]
    Harvested,
    #[sea_orm(string_value = "PROCESSED")]
    Processed,
    #[sea_orm(string_value = "PACKAGED")]
    Packaged,
    #[sea_orm(string_value = "QUALITY_CHECKED")]
    QualityChecked,
    #[sea_orm(string_value = "STORED")]
    Stored,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    #[sea_orm(string_value = "DELIVERED_TO_RETAILER")]
    DeliveredToRetailer,
    #[sea_orm(string_value = "SOLD")]
    Sold,
    #[sea_orm(string_value = "RECALLED")]
    Recalled,
    #[sea_orm(string_value = "DISPOSED")]
    Disposed,
}

impl EventType {
    /// Batch status this event type moves a batch to, if any.
    ///
    /// The mapping is one-way and fixed; event types without an entry leave
    /// the batch status untouched.
    pub fn derived_status(&self) -> Option<BatchStatus> {
        match self {
            EventType::Harvested => Some(BatchStatus::Harvested),
            EventType::Stored => Some(BatchStatus::InStorage),
            EventType::Shipped => Some(BatchStatus::InTransit),
            EventType::Received => Some(BatchStatus::Delivered),
            EventType::DeliveredToRetailer => Some(BatchStatus::AtRetailer),
            EventType::Sold => Some(BatchStatus::Sold),
            EventType::Recalled => Some(BatchStatus::Recalled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "CREATED",
            EventType::Harvested => "HARVESTED",
            EventType::Processed => "PROCESSED",
            EventType::Packaged => "PACKAGED",
            EventType::QualityChecked => "QUALITY_CHECKED",
            EventType::Stored => "STORED",
            EventType::Shipped => "SHIPPED",
            EventType::Received => "RECEIVED",
            EventType::DeliveredToRetailer => "DELIVERED_TO_RETAILER",
            EventType::Sold => "SOLD",
            EventType::Recalled => "RECALLED",
            EventType::Disposed => "DISPOSED",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(EventType::Created),
            "HARVESTED" => Ok(EventType::Harvested),
            "PROCESSED" => Ok(EventType::Processed),
            "PACKAGED" => Ok(EventType::Packaged),
            "QUALITY_CHECKED" => Ok(EventType::QualityChecked),
            "STORED" => Ok(EventType::Stored),
            "SHIPPED" => Ok(EventType::Shipped),
            "RECEIVED" => Ok(EventType::Received),
            "DELIVERED_TO_RETAILER" => Ok(EventType::DeliveredToRetailer),
            "SOLD" => Ok(EventType::Sold),
            "RECALLED" => Ok(EventType::Recalled),
            "DISPOSED" => Ok(EventType::Disposed),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supply_chain_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub batch_id: i64,

    pub event_type: EventType,

    /// User that recorded the event
    pub initiated_by: i64,

    /// User assigned as the receiver, when the event hands custody over
    pub received_by: Option<i64>,

    /// Free-text location, a place name or facility
    pub location: Option<String>,

    /// "lat,lng" pair as recorded by the reporting device
    pub geo_coordinates: Option<String>,

    pub temperature: Option<f64>,
    pub humidity: Option<f64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// Anchor hash when the event is mirrored to a ledger
    pub blockchain_tx_hash: Option<String>,

    /// Free-form key/value payload, serialized JSON object
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_data: Option<String>,

    /// When the recorded action happened. Defaults to insertion time when
    /// the caller does not supply one.
    pub event_time: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Batch,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InitiatedBy",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Initiator,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceivedBy",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Receiver,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
