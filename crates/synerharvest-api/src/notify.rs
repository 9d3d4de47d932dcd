//! Notification persistence.
//!
//! Fan-out is synchronous and row-based. Recipients see new rows on their
//! next poll of the notification endpoints.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use synerharvest_db::entities::notification::{self, NotificationType};
use tracing::debug;

/// Insert one notification row for `user_id`.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    title: impl Into<String>,
    message: impl Into<String>,
    kind: NotificationType,
    related_entity_type: Option<&str>,
    related_entity_id: Option<i64>,
) -> Result<notification::Model, DbErr> {
    let title = title.into();
    debug!(user_id, kind = ?kind, title = %title, "creating notification");

    notification::ActiveModel {
        user_id: Set(user_id),
        title: Set(title),
        message: Set(message.into()),
        read: Set(false),
        notification_type: Set(kind),
        related_entity_type: Set(related_entity_type.map(str::to_string)),
        related_entity_id: Set(related_entity_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}
