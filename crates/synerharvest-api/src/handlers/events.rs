//! Supply-chain event handlers
//!
//! One unified event model covers the whole chain of custody. Recording an
//! event through [`record_event`] also derives the batch status and fans
//! out notifications; [`store_event`] is the insert-only half used by the
//! direct status endpoint, which must log without fan-out.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use synerharvest_db::entities::{
    batch,
    notification::NotificationType,
    prelude::{Batch, SupplyChainEvent, User},
    supply_chain_event::{self, EventType},
    user::{self, Role},
};
use tracing::{debug, info};

use super::current_user;
use crate::error::{ApiError, ErrorBody};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::notify::notify;
use crate::AppState;

/// Assemble event DTOs, batch-loading batch codes and usernames.
pub(crate) async fn event_responses<C: ConnectionTrait>(
    conn: &C,
    events: Vec<supply_chain_event::Model>,
) -> Result<Vec<EventResponse>, ApiError> {
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let batch_ids: Vec<i64> = events.iter().map(|e| e.batch_id).collect();
    let batch_codes: HashMap<i64, String> = Batch::find()
        .filter(batch::Column::Id.is_in(batch_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|b| (b.id, b.batch_code))
        .collect();

    let mut user_ids: Vec<i64> = events.iter().map(|e| e.initiated_by).collect();
    user_ids.extend(events.iter().filter_map(|e| e.received_by));
    let usernames: HashMap<i64, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(events
        .into_iter()
        .map(|e| {
            let additional_data = e
                .additional_data
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok());
            EventResponse {
                id: e.id,
                event_type: e.event_type.into(),
                batch_id: e.batch_id,
                batch_code: batch_codes.get(&e.batch_id).cloned().unwrap_or_default(),
                initiated_by_username: usernames.get(&e.initiated_by).cloned().unwrap_or_default(),
                received_by_username: e.received_by.and_then(|id| usernames.get(&id).cloned()),
                timestamp: e.event_time,
                location: e.location,
                geo_coordinates: e.geo_coordinates,
                temperature: e.temperature,
                humidity: e.humidity,
                notes: e.notes,
                blockchain_tx_hash: e.blockchain_tx_hash,
                additional_data,
            }
        })
        .collect())
}

pub(crate) async fn event_response<C: ConnectionTrait>(
    conn: &C,
    event: supply_chain_event::Model,
) -> Result<EventResponse, ApiError> {
    let mut responses = event_responses(conn, vec![event]).await?;
    responses
        .pop()
        .ok_or_else(|| ApiError::Internal("event mapper produced no output".to_string()))
}

/// Insert an event row without touching batch status or notifications.
///
/// Resolves the receiver by username and serializes the free-form payload.
/// The event time defaults to now when the caller does not supply one.
pub(crate) async fn store_event<C: ConnectionTrait>(
    conn: &C,
    caller: &user::Model,
    batch: &batch::Model,
    request: &CreateEventRequest,
) -> Result<supply_chain_event::Model, ApiError> {
    let received_by = match &request.received_by_username {
        Some(username) => {
            let receiver = User::find()
                .filter(user::Column::Username.eq(username))
                .one(conn)
                .await?
                .ok_or_else(|| ApiError::NotFound("Receiving user not found".to_string()))?;
            Some(receiver.id)
        }
        None => None,
    };

    let additional_data = match &request.additional_data {
        Some(map) => {
            Some(serde_json::to_string(map).map_err(|e| ApiError::Internal(e.to_string()))?)
        }
        None => None,
    };

    let event = supply_chain_event::ActiveModel {
        batch_id: Set(batch.id),
        event_type: Set(request.event_type.into()),
        initiated_by: Set(caller.id),
        received_by: Set(received_by),
        location: Set(request.location.clone()),
        geo_coordinates: Set(request.geo_coordinates.clone()),
        temperature: Set(request.temperature),
        humidity: Set(request.humidity),
        notes: Set(request.notes.clone()),
        blockchain_tx_hash: Set(request.blockchain_tx_hash.clone()),
        additional_data: Set(additional_data),
        event_time: Set(request.timestamp.unwrap_or_else(Utc::now)),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(event)
}

/// Record an event with its side effects: derive the batch status from the
/// event type and fan out notifications.
///
/// The initiator is always notified, the assigned receiver too. A status
/// change additionally notifies the batch creator and the receiver, once
/// each. A QUALITY_CHECKED event whose notes mention an issue alerts the
/// batch creator.
pub(crate) async fn record_event<C: ConnectionTrait>(
    conn: &C,
    caller: &user::Model,
    batch: batch::Model,
    request: &CreateEventRequest,
) -> Result<(supply_chain_event::Model, batch::Model), ApiError> {
    let event = store_event(conn, caller, &batch, request).await?;

    let old_status = batch.status.clone();
    let batch = match event.event_type.derived_status() {
        Some(status) if status != batch.status => {
            info!(
                "Batch {} moves {} -> {} via {} event",
                batch.batch_code,
                old_status.as_str(),
                status.as_str(),
                event.event_type.as_str()
            );
            let mut active = batch.into_active_model();
            active.status = Set(status);
            active.update(conn).await?
        }
        _ => batch,
    };

    let type_name = event.event_type.as_str();
    notify(
        conn,
        caller.id,
        format!("Event Created: {type_name}"),
        format!(
            "A new {type_name} event has been created for batch {}",
            batch.batch_code
        ),
        NotificationType::EventCreated,
        Some("SupplyChainEvent"),
        Some(event.id),
    )
    .await?;

    if let Some(receiver_id) = event.received_by {
        notify(
            conn,
            receiver_id,
            format!("New Event: {type_name}"),
            format!("You have been assigned as the receiver for a {type_name} event."),
            NotificationType::EventCreated,
            Some("SupplyChainEvent"),
            Some(event.id),
        )
        .await?;
    }

    if batch.status != old_status {
        let title = format!("Batch Status Changed: {}", batch.batch_code);
        let message = format!(
            "Batch status changed from {} to {}",
            old_status.as_str(),
            batch.status.as_str()
        );
        let mut recipients = vec![batch.created_by];
        if let Some(receiver_id) = event.received_by {
            if !recipients.contains(&receiver_id) {
                recipients.push(receiver_id);
            }
        }
        for user_id in recipients {
            notify(
                conn,
                user_id,
                title.clone(),
                message.clone(),
                NotificationType::StatusChanged,
                Some("Batch"),
                Some(batch.id),
            )
            .await?;
        }
    }

    if event.event_type == EventType::QualityChecked {
        if let Some(notes) = &event.notes {
            if notes.to_lowercase().contains("issue") {
                notify(
                    conn,
                    batch.created_by,
                    format!("Quality Issue Detected: {}", batch.batch_code),
                    format!("Quality issue detected: {notes}"),
                    NotificationType::QualityIssue,
                    Some("Batch"),
                    Some(batch.id),
                )
                .await?;
            }
        }
    }

    Ok((event, batch))
}

/// Record a supply-chain event
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Recorded event", body = EventResponse),
        (status = 400, description = "Neither batchId nor batchCode given"),
        (status = 404, description = "Batch or receiving user not found", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    info!("Recording {:?} event for user {}", request.event_type, auth.id);

    let caller = current_user(&state.db, &auth).await?;

    let batch = if let Some(batch_id) = request.batch_id {
        Batch::find_by_id(batch_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?
    } else if let Some(code) = &request.batch_code {
        Batch::find()
            .filter(batch::Column::BatchCode.eq(code))
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Batch not found with code: {code}")))?
    } else {
        return Err(ApiError::BadRequest(
            "Either batchId or batchCode must be provided".to_string(),
        ));
    };

    let txn = state.db.begin().await?;
    let (event, _batch) = record_event(&txn, &caller, batch, &request).await?;
    txn.commit().await?;

    let response = event_response(&state.db, event).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch one event by id
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 404, description = "No such event", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    debug!("Fetching event {id}");

    let event = SupplyChainEvent::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(event_response(&state.db, event).await?))
}

/// Update an event's descriptive fields
///
/// Only the initiator may update an event. The event type, batch, and
/// receiver are immutable once recorded; a patched note on a
/// QUALITY_CHECKED event re-runs the quality-issue alert.
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = i64, Path, description = "Event id")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 403, description = "Caller did not initiate the event", body = ErrorBody),
        (status = 404, description = "No such event", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    info!("Updating event {id} for user {}", auth.id);

    let event = SupplyChainEvent::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if event.initiated_by != auth.id {
        return Err(ApiError::AccessDenied(
            "You can only update events you initiated".to_string(),
        ));
    }

    let txn = state.db.begin().await?;

    let notes_patched = request.notes.is_some();
    let mut active = event.clone().into_active_model();
    let mut changed = false;
    if let Some(location) = request.location {
        active.location = Set(Some(location));
        changed = true;
    }
    if let Some(geo_coordinates) = request.geo_coordinates {
        active.geo_coordinates = Set(Some(geo_coordinates));
        changed = true;
    }
    if let Some(temperature) = request.temperature {
        active.temperature = Set(Some(temperature));
        changed = true;
    }
    if let Some(humidity) = request.humidity {
        active.humidity = Set(Some(humidity));
        changed = true;
    }
    if let Some(notes) = request.notes {
        active.notes = Set(Some(notes));
        changed = true;
    }
    if let Some(blockchain_tx_hash) = request.blockchain_tx_hash {
        active.blockchain_tx_hash = Set(Some(blockchain_tx_hash));
        changed = true;
    }
    if let Some(additional_data) = request.additional_data {
        let raw =
            serde_json::to_string(&additional_data).map_err(|e| ApiError::Internal(e.to_string()))?;
        active.additional_data = Set(Some(raw));
        changed = true;
    }

    let event = if changed { active.update(&txn).await? } else { event };

    // Only a patched note can introduce a new quality issue.
    if notes_patched && event.event_type == EventType::QualityChecked {
        if let Some(notes) = &event.notes {
            if notes.to_lowercase().contains("issue") {
                let batch = Batch::find_by_id(event.batch_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ApiError::Internal(format!("batch {} missing for event", event.batch_id))
                    })?;
                notify(
                    &txn,
                    batch.created_by,
                    format!("Quality Issue Detected: {}", batch.batch_code),
                    format!("Quality issue detected: {notes}"),
                    NotificationType::QualityIssue,
                    Some("Batch"),
                    Some(batch.id),
                )
                .await?;
            }
        }
    }

    txn.commit().await?;

    Ok(Json(event_response(&state.db, event).await?))
}

/// List a batch's events by batch id, newest first
#[utoipa::path(
    get,
    path = "/api/events/batch/{batchId}",
    params(
        ("batchId" = i64, Path, description = "Batch id")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse])
    ),
    tag = "events"
)]
pub async fn list_events_by_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i64>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Listing events for batch {batch_id}");

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch_id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}

/// List a batch's events by batch code, newest first
#[utoipa::path(
    get,
    path = "/api/events/batch/code/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse]),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn list_events_by_batch_code(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Listing events for batch code {batch_code}");

    let batch = Batch::find()
        .filter(batch::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found with code: {batch_code}")))?;

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch.id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}

/// List every event recorded against a product's batches, newest first
#[utoipa::path(
    get,
    path = "/api/events/product/{productId}",
    params(
        ("productId" = i64, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse])
    ),
    tag = "events"
)]
pub async fn list_events_by_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Listing events for product {product_id}");

    let batch_ids: Vec<i64> = Batch::find()
        .filter(batch::Column::ProductId.eq(product_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    if batch_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.is_in(batch_ids))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}

/// List events in an inclusive time range, newest first
#[utoipa::path(
    get,
    path = "/api/events/dateRange",
    params(
        ("startDate" = String, Query, description = "Range start, RFC 3339 or naive ISO-8601"),
        ("endDate" = String, Query, description = "Range end, RFC 3339 or naive ISO-8601")
    ),
    responses(
        (status = 200, description = "Events in the range, newest first", body = [EventResponse]),
        (status = 400, description = "Unparseable date")
    ),
    tag = "events"
)]
pub async fn list_events_by_date_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!(
        "Listing events from {} to {}",
        query.start_date, query.end_date
    );

    let start = parse_event_time(&query.start_date)?;
    let end = parse_event_time(&query.end_date)?;

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::EventTime.between(start, end))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}

/// List events a user initiated or received, paged
#[utoipa::path(
    get,
    path = "/api/events/user/{userId}",
    params(
        ("userId" = i64, Path, description = "User id"),
        ("page" = Option<u64>, Query, description = "Zero-based page index (default 0)"),
        ("size" = Option<u64>, Query, description = "Page size (default 10)")
    ),
    responses(
        (status = 200, description = "One page of the user's events", body = EventPage),
        (status = 404, description = "No such user", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn list_events_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<EventPage>, ApiError> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(10).max(1);
    debug!("Listing events for user {user_id} (page {page}, size {size})");

    User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let paginator = SupplyChainEvent::find()
        .filter(
            Condition::any()
                .add(supply_chain_event::Column::InitiatedBy.eq(user_id))
                .add(supply_chain_event::Column::ReceivedBy.eq(user_id)),
        )
        .order_by_desc(supply_chain_event::Column::EventTime)
        .paginate(&state.db, size);
    let totals = paginator.num_items_and_pages().await?;
    let events = paginator.fetch_page(page).await?;

    Ok(Json(EventPage {
        content: event_responses(&state.db, events).await?,
        page,
        size,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
    }))
}

/// List the caller's events for a role
///
/// Farmers and admins see events they initiated; distributors and
/// retailers see events assigned to them as receiver. Consumers have no
/// event inbox.
#[utoipa::path(
    get,
    path = "/api/events/myEvents/{role}",
    params(
        ("role" = String, Path, description = "Caller role driving the view")
    ),
    responses(
        (status = 200, description = "The caller's events, newest first", body = [EventResponse]),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Role has no event inbox", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn my_events(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(role): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Listing {role} events for user {}", auth.id);

    let parsed =
        Role::from_str(&role).map_err(|_| ApiError::BadRequest(format!("Invalid role: {role}")))?;

    let filter = match parsed {
        Role::Farmer | Role::Admin => supply_chain_event::Column::InitiatedBy.eq(auth.id),
        Role::Distributor | Role::Retailer => supply_chain_event::Column::ReceivedBy.eq(auth.id),
        Role::Consumer => {
            return Err(ApiError::AccessDenied(
                "Unauthorized access to events".to_string(),
            ));
        }
    };

    let events = SupplyChainEvent::find()
        .filter(filter)
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}

/// Parse an RFC 3339 timestamp, falling back to naive ISO-8601 read as UTC.
fn parse_event_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {raw}")))
}
