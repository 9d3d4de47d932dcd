//! Integration tests for batch lifecycle endpoints
//!
//! Covers creation with the initial CREATED event, status derivation from
//! recorded events, the manual status override, and the expiry window.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use synerharvest_api::error::{ErrorBody, ValidationErrorBody};
use synerharvest_api::{models::*, ApiServer, ApiServerConfig};
use tower::ServiceExt; // For `oneshot` method

async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    synerharvest_db::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

fn create_test_app(db: DatabaseConnection) -> Router {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: true,
        cors_origins: None,
        jwt_secret: "test-secret".to_string(),
    };

    ApiServer::new(config, db).build_router()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "failed to parse body: {e}: {}",
            String::from_utf8_lossy(&body)
        )
    })
}

async fn signup(app: &Router, username: &str, role: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "Password123!",
                "firstName": "Test",
                "lastName": "User",
                "role": role,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": "Password123!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login: LoginResponse = read_json(response).await;
    login.token
}

async fn create_product(app: &Router, token: &str, name: &str) -> ProductResponse {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/products",
            Some(token),
            Some(json!({ "name": name, "price": 2.0, "stock": 50 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn create_batch(app: &Router, token: &str, body: Value) -> BatchResponse {
    let response = app
        .clone()
        .oneshot(request("POST", "/api/batches", Some(token), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn unread_count(app: &Router, token: &str) -> u64 {
    let response = app
        .clone()
        .oneshot(request("GET", "/api/notifications/count", Some(token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let count: NotificationCount = read_json(response).await;
    count.count
}

#[tokio::test]
async fn test_create_batch_records_initial_event() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;

    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 40 }),
    )
    .await;

    assert_eq!(batch.product_id, product.id);
    assert_eq!(batch.product_name, "Tomatoes");
    assert_eq!(batch.quantity, 40);
    assert_eq!(batch.status, BatchStatus::Created);
    assert_eq!(batch.created_by_username, "alice");
    assert!(batch.batch_code.starts_with("TOM-"));
    assert_eq!(
        batch.qr_code_url.as_deref(),
        Some(format!("https://synerharvest.com/qr/batch/{}", batch.batch_code).as_str())
    );

    // Creation logs a CREATED event at the farmer's registered location
    let events = batch.events.expect("events missing");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Created);
    assert_eq!(events[0].initiated_by_username, "alice");
    assert_eq!(events[0].notes, Some("Batch created by alice".to_string()));
}

#[tokio::test]
async fn test_create_batch_requires_farmer() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let farmer = signup(&app, "alice", "FARMER").await;
    let carol = signup(&app, "carol", "CONSUMER").await;
    let product = create_product(&app, &farmer, "Tomatoes").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/batches",
            Some(&carol),
            Some(json!({ "productId": product.id, "quantity": 5 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "ACCESS_DENIED");
}

#[tokio::test]
async fn test_create_batch_for_foreign_product_denied() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let alice = signup(&app, "alice", "FARMER").await;
    let bob = signup(&app, "bob", "FARMER").await;
    let product = create_product(&app, &alice, "Tomatoes").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/batches",
            Some(&bob),
            Some(json!({ "productId": product.id, "quantity": 5 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_batch_unknown_product() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/batches",
            Some(&token),
            Some(json!({ "productId": 999, "quantity": 5 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Product not found");
}

#[tokio::test]
async fn test_create_batch_quantity_validation() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/batches",
            Some(&token),
            Some(json!({ "productId": product.id, "quantity": 0 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ValidationErrorBody = read_json(response).await;
    assert_eq!(
        error.errors.get("quantity").map(String::as_str),
        Some("Quantity must be positive")
    );
}

#[tokio::test]
async fn test_create_batch_duplicate_provided_code() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;

    create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 5, "batchCode": "B-1" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/batches",
            Some(&token),
            Some(json!({ "productId": product.id, "quantity": 5, "batchCode": "B-1" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Batch with code B-1 already exists");
}

#[tokio::test]
async fn test_shipped_event_moves_batch_to_in_transit() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Organic Apples").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/events",
            Some(&token),
            Some(json!({ "eventType": "SHIPPED", "batchCode": batch.batch_code })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let event: EventResponse = read_json(response).await;
    assert_eq!(event.event_type, EventType::Shipped);
    assert_eq!(event.batch_code, batch.batch_code);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/batches/{}", batch.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let refreshed: BatchResponse = read_json(response).await;
    assert_eq!(refreshed.status, BatchStatus::InTransit);

    // Creation event, shipped event, and the status change all landed
    // in alice's inbox
    assert_eq!(unread_count(&app, &token).await, 3);
}

#[tokio::test]
async fn test_packaged_event_keeps_status() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/events",
            Some(&token),
            Some(json!({ "eventType": "PACKAGED", "batchId": batch.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/batches/{}", batch.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let refreshed: BatchResponse = read_json(response).await;
    // PACKAGED has no derived status
    assert_eq!(refreshed.status, BatchStatus::Created);
}

#[tokio::test]
async fn test_direct_status_set_records_event_without_fanout() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let before = unread_count(&app, &token).await;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/batches/{}/status?status=RECALLED", batch.id),
            Some(&token),
            Some(json!({ "eventType": "RECALLED", "notes": "contamination suspected" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: BatchResponse = read_json(response).await;
    assert_eq!(updated.status, BatchStatus::Recalled);

    // The override logged the supplied event
    let events = updated.events.expect("events missing");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::Recalled);

    // but notified nobody
    assert_eq!(unread_count(&app, &token).await, before);
}

#[tokio::test]
async fn test_direct_status_set_rejects_unknown_status() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/batches/{}/status?status=LOST", batch.id),
            Some(&token),
            Some(json!({ "eventType": "RECALLED" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&body), "Invalid batch status: LOST");
}

#[tokio::test]
async fn test_direct_status_set_creator_or_admin_only() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let alice = signup(&app, "alice", "FARMER").await;
    let bob = signup(&app, "bob", "FARMER").await;
    let product = create_product(&app, &alice, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &alice,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/batches/{}/status?status=RECALLED", batch.id),
            Some(&bob),
            Some(json!({ "eventType": "RECALLED" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An admin may override someone else's batch
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/auth/me",
            Some(&bob),
            Some(json!({ "role": "ADMIN" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/batches/{}/status?status=RECALLED", batch.id),
            Some(&bob),
            Some(json!({ "eventType": "RECALLED" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_batch_event_runs_full_fanout() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let before = unread_count(&app, &token).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/batches/{}/events", batch.id),
            Some(&token),
            Some(json!({
                "eventType": "QUALITY_CHECKED",
                "notes": "Mold issue on several crates",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: BatchResponse = read_json(response).await;
    assert_eq!(refreshed.events.expect("events missing").len(), 2);

    // Event-created plus the quality alert for the batch creator
    assert_eq!(unread_count(&app, &token).await, before + 2);
}

#[tokio::test]
async fn test_list_batch_events_newest_first() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    // Recorded timestamps drive the ordering, not insertion order
    let early = Utc::now() - Duration::hours(5);
    for (kind, timestamp) in [("HARVESTED", Some(early)), ("STORED", None)] {
        let mut body = json!({ "eventType": kind, "batchId": batch.id });
        if let Some(ts) = timestamp {
            body["timestamp"] = json!(ts);
        }
        let response = app
            .clone()
            .oneshot(request("POST", "/api/events", Some(&token), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/batches/{}/events", batch.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let events: Vec<EventResponse> = read_json(response).await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event_type, EventType::Stored);
    assert_eq!(events[2].event_type, EventType::Harvested);
}

#[tokio::test]
async fn test_get_batch_by_code() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let batch = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10, "batchCode": "B-42" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/code/B-42", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let by_code: BatchResponse = read_json(response).await;
    assert_eq!(by_code.id, batch.id);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/code/NOPE", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Batch not found with code: NOPE");
}

#[tokio::test]
async fn test_list_batches_by_status() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    let first = create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10, "batchCode": "B-1" }),
    )
    .await;
    create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 20, "batchCode": "B-2" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/events",
            Some(&token),
            Some(json!({ "eventType": "SHIPPED", "batchId": first.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/status/IN_TRANSIT", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let batches: Vec<BatchResponse> = read_json(response).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].id, first.id);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/status/LOST", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expiring_batches_keeps_already_expired() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;

    let yesterday = Utc::now() - Duration::days(1);
    let next_month = Utc::now() + Duration::days(30);
    create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 1, "batchCode": "B-1", "expirationDate": yesterday }),
    )
    .await;
    create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 2, "batchCode": "B-2", "expirationDate": next_month }),
    )
    .await;

    // Expired batches stay listed until handled, unlike the product view
    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/expiring", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let batches: Vec<BatchResponse> = read_json(response).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].quantity, 1);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/batches/expiring?days=60",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let batches: Vec<BatchResponse> = read_json(response).await;
    assert_eq!(batches.len(), 2);
}

#[tokio::test]
async fn test_list_batches_by_product_checks_product() {
    let db = create_test_db().await;
    let app = create_test_app(db);
    let token = signup(&app, "alice", "FARMER").await;
    let product = create_product(&app, &token, "Tomatoes").await;
    create_batch(
        &app,
        &token,
        json!({ "productId": product.id, "quantity": 10 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/batches/product/{}", product.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let batches: Vec<BatchResponse> = read_json(response).await;
    assert_eq!(batches.len(), 1);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/batches/product/999", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Product not found");
}
