pub mod codes;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod tracking;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sea_orm::DatabaseConnection;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SynerHarvest API",
        version = "0.1.0",
        description = "REST API for tracking food products from farm to consumer",
        contact(
            name = "SynerHarvest Team",
            email = "team@synerharvest.com"
        )
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_current_user,
        handlers::auth::update_current_user,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::list_products_paged,
        handlers::products::get_product,
        handlers::products::get_product_by_code,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::add_environmental_condition,
        handlers::products::list_environmental_conditions,
        handlers::products::search_products,
        handlers::products::list_products_by_type,
        handlers::products::list_organic_products,
        handlers::products::list_expiring_products,
        handlers::batches::create_batch,
        handlers::batches::list_batches,
        handlers::batches::get_batch,
        handlers::batches::get_batch_by_code,
        handlers::batches::list_batches_by_product,
        handlers::batches::list_batches_by_status,
        handlers::batches::list_expiring_batches,
        handlers::batches::set_batch_status,
        handlers::batches::add_batch_event,
        handlers::batches::list_batch_events,
        handlers::events::create_event,
        handlers::events::get_event,
        handlers::events::update_event,
        handlers::events::list_events_by_batch,
        handlers::events::list_events_by_batch_code,
        handlers::events::list_events_by_product,
        handlers::events::list_events_by_date_range,
        handlers::events::list_events_by_user,
        handlers::events::my_events,
        handlers::notifications::list_notifications,
        handlers::notifications::list_unread_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_notification_read,
        handlers::notifications::mark_all_notifications_read,
        handlers::public::health,
        handlers::public::get_public_product_by_code,
        handlers::public::get_public_batch_by_code,
        handlers::public::list_public_batch_events,
        handlers::public::get_public_journey,
        handlers::public::search_public_products,
        handlers::public::list_public_products_by_type,
        handlers::public::list_public_organic_products,
        handlers::public::get_public_tracking,
        handlers::public::get_public_timeline,
    ),
    components(
        schemas(
            models::Role,
            models::BatchStatus,
            models::EventType,
            models::NotificationType,
            models::RegisterRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::UserResponse,
            models::UpdateProfileRequest,
            models::CreateProductRequest,
            models::UpdateProductRequest,
            models::ProductResponse,
            models::ProductPage,
            models::ConditionRequest,
            models::ConditionResponse,
            models::CreateBatchRequest,
            models::BatchResponse,
            models::CreateEventRequest,
            models::UpdateEventRequest,
            models::EventResponse,
            models::EventPage,
            models::NotificationResponse,
            models::NotificationPage,
            models::NotificationCount,
            models::JourneyResponse,
            models::TrackingMetrics,
            models::TrackingResponse,
            models::HealthResponse,
            error::ErrorBody,
            error::ValidationErrorBody,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, and profile endpoints"),
        (name = "products", description = "Product catalog endpoints"),
        (name = "batches", description = "Batch lifecycle endpoints"),
        (name = "events", description = "Supply chain event endpoints"),
        (name = "notifications", description = "Per-user notification inbox endpoints"),
        (name = "public", description = "Unauthenticated product and batch lookups"),
        (name = "tracking", description = "Unauthenticated journey tracking endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, allows all)
    pub cors_origins: Option<Vec<String>>,
    /// JWT secret for signing and validating bearer tokens
    pub jwt_secret: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            enable_cors: true,
            cors_origins: None,
            jwt_secret: "change-me-in-production".to_string(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState {
            db,
            jwt_secret: config.jwt_secret.clone(),
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // Get the OpenAPI spec
        let api_doc = ApiDoc::openapi();

        // Create JWT state for authentication middleware
        let jwt_state = Arc::new(middleware::JwtState::new(self.config.jwt_secret.as_bytes()));

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/health", get(handlers::public::health))
            .route("/api/auth/register", post(handlers::auth::register))
            .route("/api/auth/login", post(handlers::auth::login))
            .route(
                "/api/public/product/batch/{batchCode}",
                get(handlers::public::get_public_product_by_code),
            )
            .route(
                "/api/public/batch/{batchCode}",
                get(handlers::public::get_public_batch_by_code),
            )
            .route(
                "/api/public/batch/{batchCode}/events",
                get(handlers::public::list_public_batch_events),
            )
            .route(
                "/api/public/journey/{batchCode}",
                get(handlers::public::get_public_journey),
            )
            .route(
                "/api/public/products/search",
                get(handlers::public::search_public_products),
            )
            .route(
                "/api/public/products/type/{productType}",
                get(handlers::public::list_public_products_by_type),
            )
            .route(
                "/api/public/products/organic",
                get(handlers::public::list_public_organic_products),
            )
            .route(
                "/api/public/tracking/batch/{batchCode}",
                get(handlers::public::get_public_tracking),
            )
            .route(
                "/api/public/tracking/timeline/{batchCode}",
                get(handlers::public::get_public_timeline),
            )
            .with_state(self.state.clone());

        // Build PROTECTED routes (require bearer token authentication)
        let protected_router = Router::new()
            .route(
                "/api/auth/me",
                get(handlers::auth::get_current_user).put(handlers::auth::update_current_user),
            )
            .route(
                "/api/products",
                get(handlers::products::list_products).post(handlers::products::create_product),
            )
            .route(
                "/api/products/paged",
                get(handlers::products::list_products_paged),
            )
            .route(
                "/api/products/search",
                get(handlers::products::search_products),
            )
            .route(
                "/api/products/type/{productType}",
                get(handlers::products::list_products_by_type),
            )
            .route(
                "/api/products/organic",
                get(handlers::products::list_organic_products),
            )
            .route(
                "/api/products/expiring",
                get(handlers::products::list_expiring_products),
            )
            .route(
                "/api/products/batch/{batchCode}",
                get(handlers::products::get_product_by_code),
            )
            .route(
                "/api/products/{id}",
                get(handlers::products::get_product)
                    .put(handlers::products::update_product)
                    .delete(handlers::products::delete_product),
            )
            .route(
                "/api/products/{id}/environmental-conditions",
                get(handlers::products::list_environmental_conditions)
                    .post(handlers::products::add_environmental_condition),
            )
            .route(
                "/api/batches",
                get(handlers::batches::list_batches).post(handlers::batches::create_batch),
            )
            .route(
                "/api/batches/expiring",
                get(handlers::batches::list_expiring_batches),
            )
            .route(
                "/api/batches/code/{batchCode}",
                get(handlers::batches::get_batch_by_code),
            )
            .route(
                "/api/batches/product/{productId}",
                get(handlers::batches::list_batches_by_product),
            )
            .route(
                "/api/batches/status/{status}",
                get(handlers::batches::list_batches_by_status),
            )
            .route("/api/batches/{id}", get(handlers::batches::get_batch))
            .route(
                "/api/batches/{id}/status",
                put(handlers::batches::set_batch_status),
            )
            .route(
                "/api/batches/{id}/events",
                get(handlers::batches::list_batch_events).post(handlers::batches::add_batch_event),
            )
            .route("/api/events", post(handlers::events::create_event))
            .route(
                "/api/events/dateRange",
                get(handlers::events::list_events_by_date_range),
            )
            .route(
                "/api/events/batch/code/{batchCode}",
                get(handlers::events::list_events_by_batch_code),
            )
            .route(
                "/api/events/batch/{batchId}",
                get(handlers::events::list_events_by_batch),
            )
            .route(
                "/api/events/product/{productId}",
                get(handlers::events::list_events_by_product),
            )
            .route(
                "/api/events/user/{userId}",
                get(handlers::events::list_events_by_user),
            )
            .route(
                "/api/events/myEvents/{role}",
                get(handlers::events::my_events),
            )
            .route(
                "/api/events/{id}",
                get(handlers::events::get_event).put(handlers::events::update_event),
            )
            .route(
                "/api/notifications",
                get(handlers::notifications::list_notifications),
            )
            .route(
                "/api/notifications/unread",
                get(handlers::notifications::list_unread_notifications),
            )
            .route(
                "/api/notifications/count",
                get(handlers::notifications::unread_count),
            )
            .route(
                "/api/notifications/read-all",
                put(handlers::notifications::mark_all_notifications_read),
            )
            .route(
                "/api/notifications/{id}/read",
                put(handlers::notifications::mark_notification_read),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        // Merge public and protected routers
        let api_router = public_router.merge(protected_router);

        // Merge with Swagger UI
        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        // Configure CORS
        let cors = if self.config.enable_cors {
            let cors_layer = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

            // Bearer tokens ride in headers, not cookies, so wildcard
            // origins are usable when no explicit list is configured
            let cors_layer = match &self.config.cors_origins {
                Some(origins) => {
                    let origins: Vec<HeaderValue> = origins
                        .iter()
                        .filter_map(|origin| origin.parse().ok())
                        .collect();
                    cors_layer.allow_origin(AllowOrigin::list(origins))
                }
                None => cors_layer.allow_origin(Any),
            };

            Some(cors_layer)
        } else {
            None
        };

        // Build middleware stack
        let mut router = router
            .layer(axum_middleware::from_fn(error::error_envelope))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
