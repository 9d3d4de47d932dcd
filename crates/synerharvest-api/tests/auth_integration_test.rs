//! Integration tests for registration, login, and profile endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use synerharvest_api::error::{ErrorBody, ValidationErrorBody};
use synerharvest_api::{models::*, ApiServer, ApiServerConfig};
use tower::ServiceExt; // For `oneshot` method

/// Helper to create an in-memory database with migrations applied
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    synerharvest_db::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Helper to build the full router against a test database
fn create_test_app(db: DatabaseConnection) -> Router {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
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

fn register_body(username: &str, role: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "Password123!",
        "firstName": "Test",
        "lastName": "User",
        "role": role,
    })
}

async fn register(app: &Router, username: &str, role: &str) {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(register_body(username, role)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn login(app: &Router, username: &str) -> LoginResponse {
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
    read_json(response).await
}

#[tokio::test]
async fn test_register_success() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(register_body("alice", "FARMER")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Credentials must never leak into responses
    assert!(!String::from_utf8_lossy(&body).contains("password"));

    let user: UserResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, Role::Farmer);
    assert!(user.enabled);
    assert!(!user.verified);
    assert!(user.permissions.contains(&"product:create".to_string()));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;

    let mut body = register_body("alice", "FARMER");
    body["email"] = json!("other@example.com");
    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/register", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "DUPLICATE_RESOURCE");
    assert_eq!(error.message, "Username already exists");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;

    let mut body = register_body("bob", "FARMER");
    body["email"] = json!("alice@example.com");
    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/register", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Email already exists");
}

#[tokio::test]
async fn test_register_weak_password() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let mut body = register_body("alice", "FARMER");
    body["password"] = json!("weakpassword");
    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/register", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ValidationErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "VALIDATION_FAILED");
    assert_eq!(
        error.errors.get("password").map(String::as_str),
        Some(
            "Password must contain at least one digit, one lowercase letter, \
             one uppercase letter, and one special character"
        )
    );
}

#[tokio::test]
async fn test_register_rejects_admin_role() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(register_body("eve", "ADMIN")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ValidationErrorBody = read_json(response).await;
    assert_eq!(
        error.errors.get("role").map(String::as_str),
        Some("Role must be one of: FARMER, DISTRIBUTOR, RETAILER, CONSUMER")
    );
}

#[tokio::test]
async fn test_register_collects_all_field_errors() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "ab",
                "email": "not-an-email",
                "password": "Password123!",
                "firstName": "Test",
                "lastName": "User",
                "role": "FARMER",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ValidationErrorBody = read_json(response).await;
    assert_eq!(
        error.errors.get("username").map(String::as_str),
        Some("Username must be between 3 and 50 characters")
    );
    assert_eq!(
        error.errors.get("email").map(String::as_str),
        Some("Invalid email format")
    );
}

#[tokio::test]
async fn test_login_success() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;
    let login = login(&app, "alice").await;

    assert!(login.token.starts_with("eyJ"));
    assert_eq!(login.token_type, "Bearer");
    assert_eq!(login.username, "alice");
    assert_eq!(login.role, Role::Farmer);
    assert!(login.permissions.contains(&"product:create".to_string()));
    assert_eq!(login.message, "Login successful");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "Password123!" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "INVALID_CREDENTIALS");
    assert_eq!(error.message, "Invalid username or password");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "WrongPassword123!" })),
        ))
        .await
        .unwrap();

    // Same body as for an unknown user, so nothing leaks about which part failed
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "INVALID_CREDENTIALS");
    assert_eq!(error.message, "Invalid username or password");
}

#[tokio::test]
async fn test_me_requires_token() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/auth/me", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.error_code, "AUTHENTICATION_FAILED");
    assert_eq!(error.message, "Missing authentication token");
    assert_eq!(error.path, "/api/auth/me");
}

#[tokio::test]
async fn test_me_rejects_garbage_token() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/auth/me", Some("not-a-jwt"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorBody = read_json(response).await;
    assert_eq!(error.message, "Invalid authentication token");
}

#[tokio::test]
async fn test_me_returns_profile() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;
    let token = login(&app, "alice").await.token;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = read_json(response).await;
    assert_eq!(user.username, "alice");
    assert_eq!(user.first_name, Some("Test".to_string()));
    assert_eq!(user.role, Role::Farmer);
}

#[tokio::test]
async fn test_update_profile_fields() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;
    let token = login(&app, "alice").await.token;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/auth/me",
            Some(&token),
            Some(json!({
                "firstName": "Alice",
                "companyName": "Green Farm",
                "locationCoordinates": "52.52,13.405",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = read_json(response).await;
    assert_eq!(user.first_name, Some("Alice".to_string()));
    assert_eq!(user.company_name, Some("Green Farm".to_string()));
    assert_eq!(user.location_coordinates, Some("52.52,13.405".to_string()));
    // Untouched fields survive a partial update
    assert_eq!(user.last_name, Some("User".to_string()));
}

#[tokio::test]
async fn test_update_profile_password_change() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;
    let token = login(&app, "alice").await.token;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/auth/me",
            Some(&token),
            Some(json!({ "password": "NewPassword456!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "Password123!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // New one does
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "NewPassword456!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_role_change_refreshes_permissions() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "CONSUMER").await;
    let token = login(&app, "alice").await.token;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/auth/me",
            Some(&token),
            Some(json!({ "role": "FARMER" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = read_json(response).await;
    assert_eq!(user.role, Role::Farmer);
    assert!(user.permissions.contains(&"product:create".to_string()));
}

#[tokio::test]
async fn test_update_profile_invalid_role() {
    let db = create_test_db().await;
    let app = create_test_app(db);

    register(&app, "alice", "FARMER").await;
    let token = login(&app, "alice").await.token;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/auth/me",
            Some(&token),
            Some(json!({ "role": "SUPERVISOR" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&body), "Invalid role: SUPERVISOR");
}
