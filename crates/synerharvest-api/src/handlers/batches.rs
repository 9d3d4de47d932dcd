//! Batch lifecycle handlers
//!
//! Batches are created by farmers against their own products and move
//! through their lifecycle via recorded events. The direct status endpoint
//! is the manual override: it sets the status from the query parameter and
//! logs the supplied event without derivation or notification fan-out.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use synerharvest_db::entities::{
    batch::{self, BatchStatus},
    prelude::{Batch, Product, SupplyChainEvent, User},
    product, supply_chain_event,
    user::{self, Role},
};
use tracing::{debug, info};
use validator::Validate;

use super::events::{event_responses, record_event, store_event};
use super::current_user;
use crate::codes;
use crate::error::{ApiError, ErrorBody, ValidationErrorBody};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Default expiry window in days
const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 7;

/// Assemble batch DTOs, batch-loading product names, creator usernames,
/// and each batch's event history (newest first).
pub(crate) async fn batch_responses<C: ConnectionTrait>(
    conn: &C,
    batches: Vec<batch::Model>,
) -> Result<Vec<BatchResponse>, ApiError> {
    if batches.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i64> = batches.iter().map(|b| b.product_id).collect();
    let product_names: HashMap<i64, String> = Product::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let user_ids: Vec<i64> = batches.iter().map(|b| b.created_by).collect();
    let usernames: HashMap<i64, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let batch_ids: Vec<i64> = batches.iter().map(|b| b.id).collect();
    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.is_in(batch_ids))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(conn)
        .await?;
    let mut histories: HashMap<i64, Vec<EventResponse>> = HashMap::new();
    for event in event_responses(conn, events).await? {
        histories.entry(event.batch_id).or_default().push(event);
    }

    Ok(batches
        .into_iter()
        .map(|b| {
            let events = histories.remove(&b.id);
            BatchResponse {
                id: b.id,
                batch_code: b.batch_code,
                product_id: b.product_id,
                product_name: product_names.get(&b.product_id).cloned().unwrap_or_default(),
                quantity: b.quantity,
                production_date: b.production_date,
                expiration_date: b.expiration_date,
                status: b.status.into(),
                qr_code_url: b.qr_code_url,
                created_at: b.created_at,
                created_by_username: usernames.get(&b.created_by).cloned().unwrap_or_default(),
                notes: b.notes,
                events,
            }
        })
        .collect())
}

pub(crate) async fn batch_response<C: ConnectionTrait>(
    conn: &C,
    batch: batch::Model,
) -> Result<BatchResponse, ApiError> {
    let mut responses = batch_responses(conn, vec![batch]).await?;
    responses
        .pop()
        .ok_or_else(|| ApiError::Internal("batch mapper produced no output".to_string()))
}

/// Create a production batch
///
/// The batch starts in CREATED with an initial CREATED event recorded at
/// the farmer's registered location.
#[utoipa::path(
    post,
    path = "/api/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = BatchResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorBody),
        (status = 403, description = "Caller may not create batches for this product", body = ErrorBody),
        (status = 404, description = "No such product", body = ErrorBody),
        (status = 409, description = "Batch code already taken", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    info!(
        "Creating batch for product {} by user {}",
        request.product_id, auth.id
    );

    let caller = current_user(&state.db, &auth).await?;
    if caller.role != Role::Farmer && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "Only farmers can create batches".to_string(),
        ));
    }

    request.validate()?;

    let product = Product::find_by_id(request.product_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    if product.user_id != auth.id && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "You can only create batches for your own products".to_string(),
        ));
    }

    let now = Utc::now();
    let batch_code = match request.batch_code.filter(|c| !c.is_empty()) {
        Some(code) => {
            let taken = Batch::find()
                .filter(batch::Column::BatchCode.eq(&code))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::Duplicate(format!(
                    "Batch with code {code} already exists"
                )));
            }
            code
        }
        None => codes::batch_code(&product.name, now),
    };
    let qr_code_url = codes::batch_qr_url(&batch_code);

    let txn = state.db.begin().await?;

    let batch = batch::ActiveModel {
        batch_code: Set(batch_code),
        product_id: Set(product.id),
        quantity: Set(request.quantity),
        production_date: Set(request.production_date.unwrap_or(now)),
        expiration_date: Set(request.expiration_date),
        status: Set(BatchStatus::Created),
        qr_code_url: Set(Some(qr_code_url)),
        notes: Set(request.notes),
        created_by: Set(auth.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let initial_event = CreateEventRequest {
        event_type: EventType::Created,
        batch_id: None,
        batch_code: None,
        received_by_username: None,
        timestamp: None,
        location: caller.location_coordinates.clone(),
        geo_coordinates: None,
        temperature: None,
        humidity: None,
        notes: Some(format!("Batch created by {}", caller.username)),
        blockchain_tx_hash: None,
        additional_data: None,
    };
    let (_, batch) = record_event(&txn, &caller, batch, &initial_event).await?;

    txn.commit().await?;

    info!("Created batch {} ({})", batch.id, batch.batch_code);

    let response = batch_response(&state.db, batch).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's batches
#[utoipa::path(
    get,
    path = "/api/batches",
    responses(
        (status = 200, description = "Batches created by the caller", body = [BatchResponse])
    ),
    tag = "batches"
)]
pub async fn list_batches(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<BatchResponse>>, ApiError> {
    debug!("Listing batches for user {}", auth.id);

    let batches = Batch::find()
        .filter(batch::Column::CreatedBy.eq(auth.id))
        .order_by_desc(batch::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(batch_responses(&state.db, batches).await?))
}

/// Fetch one batch by id
#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    params(
        ("id" = i64, Path, description = "Batch id")
    ),
    responses(
        (status = 200, description = "The batch", body = BatchResponse),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BatchResponse>, ApiError> {
    debug!("Fetching batch {id}");

    let batch = Batch::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;

    Ok(Json(batch_response(&state.db, batch).await?))
}

/// Fetch one batch by its code
#[utoipa::path(
    get,
    path = "/api/batches/code/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "The batch", body = BatchResponse),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn get_batch_by_code(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<BatchResponse>, ApiError> {
    debug!("Fetching batch by code {batch_code}");

    let batch = Batch::find()
        .filter(batch::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found with code: {batch_code}")))?;

    Ok(Json(batch_response(&state.db, batch).await?))
}

/// List a product's batches
#[utoipa::path(
    get,
    path = "/api/batches/product/{productId}",
    params(
        ("productId" = i64, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "The product's batches", body = [BatchResponse]),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn list_batches_by_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<BatchResponse>>, ApiError> {
    debug!("Listing batches for product {product_id}");

    let product = Product::find_by_id(product_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let batches = Batch::find()
        .filter(batch::Column::ProductId.eq(product.id))
        .order_by_desc(batch::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(batch_responses(&state.db, batches).await?))
}

/// List batches in one lifecycle status
#[utoipa::path(
    get,
    path = "/api/batches/status/{status}",
    params(
        ("status" = String, Path, description = "Status name, e.g. IN_TRANSIT")
    ),
    responses(
        (status = 200, description = "Batches in the status", body = [BatchResponse]),
        (status = 400, description = "Unknown status")
    ),
    tag = "batches"
)]
pub async fn list_batches_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<BatchResponse>>, ApiError> {
    debug!("Listing batches with status {status}");

    let parsed = BatchStatus::from_str(&status)
        .map_err(|_| ApiError::BadRequest(format!("Invalid batch status: {status}")))?;

    let batches = Batch::find()
        .filter(batch::Column::Status.eq(parsed))
        .order_by_desc(batch::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(batch_responses(&state.db, batches).await?))
}

/// List batches expiring on or before the end of a window
///
/// Unlike the product view this has no lower bound, so already-expired
/// batches stay visible until handled.
#[utoipa::path(
    get,
    path = "/api/batches/expiring",
    params(
        ("days" = Option<i64>, Query, description = "Window length in days (default 7)")
    ),
    responses(
        (status = 200, description = "Batches expiring by the cutoff", body = [BatchResponse])
    ),
    tag = "batches"
)]
pub async fn list_expiring_batches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<BatchResponse>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    debug!("Listing batches expiring within {days} days");

    let cutoff = Utc::now() + Duration::days(days);
    let batches = Batch::find()
        .filter(batch::Column::ExpirationDate.lte(cutoff))
        .order_by_asc(batch::Column::ExpirationDate)
        .all(&state.db)
        .await?;

    Ok(Json(batch_responses(&state.db, batches).await?))
}

/// Set a batch's status directly
///
/// The manual override for correcting a lifecycle: the status comes from
/// the query parameter and the supplied event is logged as-is, with no
/// status derivation and no notifications.
#[utoipa::path(
    put,
    path = "/api/batches/{id}/status",
    params(
        ("id" = i64, Path, description = "Batch id"),
        ("status" = String, Query, description = "Target status name")
    ),
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Updated batch", body = BatchResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller did not create the batch", body = ErrorBody),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn set_batch_status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    info!("Setting batch {id} status to {}", query.status);

    let batch = Batch::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;

    let caller = current_user(&state.db, &auth).await?;
    if batch.created_by != auth.id && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "You can only update batches you created".to_string(),
        ));
    }

    let status = BatchStatus::from_str(&query.status)
        .map_err(|_| ApiError::BadRequest(format!("Invalid batch status: {}", query.status)))?;

    let txn = state.db.begin().await?;

    let mut active = batch.into_active_model();
    active.status = Set(status);
    let batch = active.update(&txn).await?;

    store_event(&txn, &caller, &batch, &request).await?;

    txn.commit().await?;

    Ok(Json(batch_response(&state.db, batch).await?))
}

/// Record an event against a batch and return the updated batch
///
/// Unlike the direct status endpoint this is the full recording path:
/// the event drives status derivation and notification fan-out.
#[utoipa::path(
    post,
    path = "/api/batches/{id}/events",
    params(
        ("id" = i64, Path, description = "Batch id")
    ),
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Batch including the new event", body = BatchResponse),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn add_batch_event(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    info!("Recording event against batch {id} by user {}", auth.id);

    let batch = Batch::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;

    let caller = current_user(&state.db, &auth).await?;

    let txn = state.db.begin().await?;
    let (_, batch) = record_event(&txn, &caller, batch, &request).await?;
    txn.commit().await?;

    Ok(Json(batch_response(&state.db, batch).await?))
}

/// List a batch's events, newest first
#[utoipa::path(
    get,
    path = "/api/batches/{id}/events",
    params(
        ("id" = i64, Path, description = "Batch id")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse]),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "batches"
)]
pub async fn list_batch_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Listing events for batch {id}");

    let batch = Batch::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch.id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Json(event_responses(&state.db, events).await?))
}
