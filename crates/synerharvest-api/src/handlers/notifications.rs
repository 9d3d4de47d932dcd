//! Notification inbox handlers
//!
//! Notifications are written by the event recording flow (see
//! [`crate::notify`]); this module only exposes the per-user inbox.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use synerharvest_db::entities::{notification, prelude::Notification};
use tracing::{debug, info};

use crate::error::{ApiError, ErrorBody};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Page through the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("page" = Option<u64>, Query, description = "Zero-based page index (default 0)"),
        ("size" = Option<u64>, Query, description = "Page size (default 10)")
    ),
    responses(
        (status = 200, description = "One page of notifications", body = NotificationPage)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<NotificationPage>, ApiError> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(10).max(1);
    debug!("Listing notifications for user {} page {page}", auth.id);

    let paginator = Notification::find()
        .filter(notification::Column::UserId.eq(auth.id))
        .order_by_desc(notification::Column::CreatedAt)
        .paginate(&state.db, size);
    let totals = paginator.num_items_and_pages().await?;
    let content: Vec<NotificationResponse> = paginator
        .fetch_page(page)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(NotificationPage {
        content,
        page,
        size,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
    }))
}

/// List the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread",
    responses(
        (status = 200, description = "Unread notifications, newest first", body = [NotificationResponse])
    ),
    tag = "notifications"
)]
pub async fn list_unread_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    debug!("Listing unread notifications for user {}", auth.id);

    let notifications = Notification::find()
        .filter(notification::Column::UserId.eq(auth.id))
        .filter(notification::Column::Read.eq(false))
        .order_by_desc(notification::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/count",
    responses(
        (status = 200, description = "Unread count", body = NotificationCount)
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<NotificationCount>, ApiError> {
    debug!("Counting unread notifications for user {}", auth.id);

    let count = Notification::find()
        .filter(notification::Column::UserId.eq(auth.id))
        .filter(notification::Column::Read.eq(false))
        .count(&state.db)
        .await?;

    Ok(Json(NotificationCount { count }))
}

/// Mark one notification as read
///
/// Safe to call repeatedly; an already-read notification stays read.
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = i64, Path, description = "Notification id")
    ),
    responses(
        (status = 200, description = "The notification after marking", body = NotificationResponse),
        (status = 403, description = "Notification belongs to another user", body = ErrorBody),
        (status = 404, description = "No such notification", body = ErrorBody)
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<NotificationResponse>, ApiError> {
    info!("Marking notification {id} read for user {}", auth.id);

    let notification = Notification::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    if notification.user_id != auth.id {
        return Err(ApiError::AccessDenied(
            "Cannot mark someone else's notification as read".to_string(),
        ));
    }

    let mut active = notification.into_active_model();
    active.read = Set(true);
    let notification = active.update(&state.db).await?;

    Ok(Json(NotificationResponse::from(notification)))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All unread notifications marked read")
    ),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    info!("Marking all notifications read for user {}", auth.id);

    Notification::update_many()
        .col_expr(notification::Column::Read, Expr::value(true))
        .filter(notification::Column::UserId.eq(auth.id))
        .filter(notification::Column::Read.eq(false))
        .exec(&state.db)
        .await?;

    Ok(StatusCode::OK)
}
