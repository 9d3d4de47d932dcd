//! Per-user notification inbox entries

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of event produced a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[sea_orm(string_value = "EVENT_CREATED")]
    EventCreated,
    #[sea_orm(string_value = "STATUS_CHANGED")]
    StatusChanged,
    #[sea_orm(string_value = "QUALITY_ISSUE")]
    QualityIssue,
    #[sea_orm(string_value = "BATCH_RECEIVED")]
    BatchReceived,
    #[sea_orm(string_value = "BATCH_SHIPPED")]
    BatchShipped,
    #[sea_orm(string_value = "EXPIRATION_WARNING")]
    ExpirationWarning,
    #[sea_orm(string_value = "SYSTEM_NOTIFICATION")]
    SystemNotification,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Recipient
    pub user_id: i64,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub read: bool,

    pub notification_type: NotificationType,

    /// Entity kind the notification points at, e.g. "Batch" or "SupplyChainEvent"
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<i64>,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
