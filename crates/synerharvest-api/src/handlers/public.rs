//! Unauthenticated read-only endpoints
//!
//! These serve QR-code scans and public browsing, so they compose the
//! catalog and traceability views without any caller context.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use synerharvest_db::entities::{
    batch, prelude::{Batch, Product, SupplyChainEvent},
    product, supply_chain_event,
};
use tracing::debug;

use super::batches::batch_response;
use super::events::event_responses;
use super::products::{product_response, product_responses};
use crate::error::{ApiError, ErrorBody};
use crate::models::*;
use crate::tracking::compute_metrics;
use crate::AppState;

/// Service health probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Look up a product by its batch code, e.g. from a scanned QR code
#[utoipa::path(
    get,
    path = "/api/public/product/batch/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Product batch code")
    ),
    responses(
        (status = 200, description = "The product", body = ProductResponse),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "public"
)]
pub async fn get_public_product_by_code(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    debug!("Public product lookup for code {batch_code}");

    let product = Product::find()
        .filter(product::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Product not found with batch code: {batch_code}"))
        })?;

    Ok(Json(product_response(&state.db, product).await?))
}

/// Look up a batch by its code
#[utoipa::path(
    get,
    path = "/api/public/batch/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "The batch", body = BatchResponse),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "public"
)]
pub async fn get_public_batch_by_code(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<BatchResponse>, ApiError> {
    debug!("Public batch lookup for code {batch_code}");

    let batch = Batch::find()
        .filter(batch::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found with code: {batch_code}")))?;

    Ok(Json(batch_response(&state.db, batch).await?))
}

/// List a batch's events by batch code, newest first
#[utoipa::path(
    get,
    path = "/api/public/batch/{batchCode}/events",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse]),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "public"
)]
pub async fn list_public_batch_events(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Public event listing for batch code {batch_code}");

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

/// Assemble the full journey for a batch code
#[utoipa::path(
    get,
    path = "/api/public/journey/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "Batch, product, and event history", body = JourneyResponse),
        (status = 404, description = "Nothing recorded under the code", body = ErrorBody)
    ),
    tag = "public"
)]
pub async fn get_public_journey(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<JourneyResponse>, ApiError> {
    debug!("Public journey lookup for batch code {batch_code}");

    let journey = load_journey(&state, &batch_code)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No journey found for batch code: {batch_code}"))
        })?;

    Ok(Json(journey))
}

/// Load batch, product, and events for a code; `None` when either
/// anchor record is missing.
async fn load_journey(
    state: &AppState,
    batch_code: &str,
) -> Result<Option<JourneyResponse>, ApiError> {
    let Some(batch) = Batch::find()
        .filter(batch::Column::BatchCode.eq(batch_code))
        .one(&state.db)
        .await?
    else {
        return Ok(None);
    };
    let Some(product) = Product::find_by_id(batch.product_id).one(&state.db).await? else {
        return Ok(None);
    };

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch.id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;

    Ok(Some(JourneyResponse {
        batch: batch_response(&state.db, batch).await?,
        product: product_response(&state.db, product).await?,
        events: event_responses(&state.db, events).await?,
    }))
}

/// Public keyword search over names and descriptions
#[utoipa::path(
    get,
    path = "/api/public/products/search",
    params(
        ("keyword" = String, Query, description = "Search keyword")
    ),
    responses(
        (status = 200, description = "Matching products", body = [ProductResponse])
    ),
    tag = "public"
)]
pub async fn search_public_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Public product search for {:?}", query.keyword);

    let products = Product::find()
        .filter(
            Condition::any()
                .add(product::Column::Name.contains(&query.keyword))
                .add(product::Column::Description.contains(&query.keyword)),
        )
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// Public listing by product type
#[utoipa::path(
    get,
    path = "/api/public/products/type/{productType}",
    params(
        ("productType" = String, Path, description = "Product type")
    ),
    responses(
        (status = 200, description = "Products of the type", body = [ProductResponse])
    ),
    tag = "public"
)]
pub async fn list_public_products_by_type(
    State(state): State<Arc<AppState>>,
    Path(product_type): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Public product listing for type {product_type}");

    let products = Product::find()
        .filter(product::Column::ProductType.eq(&product_type))
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// Public listing of organic products
#[utoipa::path(
    get,
    path = "/api/public/products/organic",
    responses(
        (status = 200, description = "Organic products", body = [ProductResponse])
    ),
    tag = "public"
)]
pub async fn list_public_organic_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Public organic product listing");

    let products = Product::find()
        .filter(product::Column::Organic.eq(true))
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// Full tracking view for a batch code, with derived journey metrics
#[utoipa::path(
    get,
    path = "/api/public/tracking/batch/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "Tracking view with metrics", body = TrackingResponse),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "tracking"
)]
pub async fn get_public_tracking(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<TrackingResponse>, ApiError> {
    debug!("Public tracking lookup for batch code {batch_code}");

    let batch = Batch::find()
        .filter(batch::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found with code: {batch_code}")))?;

    let product = Product::find_by_id(batch.product_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let events = SupplyChainEvent::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch.id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&state.db)
        .await?;
    let metrics = compute_metrics(&events);

    Ok(Json(TrackingResponse {
        batch: batch_response(&state.db, batch).await?,
        product: product_response(&state.db, product).await?,
        events: event_responses(&state.db, events).await?,
        metrics,
    }))
}

/// Event timeline for a batch code, newest first
#[utoipa::path(
    get,
    path = "/api/public/tracking/timeline/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Batch code")
    ),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse]),
        (status = 404, description = "No such batch", body = ErrorBody)
    ),
    tag = "tracking"
)]
pub async fn get_public_timeline(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    debug!("Public timeline lookup for batch code {batch_code}");

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
