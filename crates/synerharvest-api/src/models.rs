//! API request/response models
//!
//! All wire names are camelCase. Mutating requests carry `validator` rules;
//! violations are flattened into the VALIDATION_FAILED field map by the
//! error layer.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synerharvest_db::entities::{batch, notification, product_condition, supply_chain_event, user};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Grows produce, registers products and batches
    Farmer,
    /// Moves batches between parties
    Distributor,
    /// Stocks and sells batches
    Retailer,
    /// Read-only tracing
    Consumer,
    /// Full access
    Admin,
}

impl From<user::Role> for Role {
    fn from(role: user::Role) -> Self {
        match role {
            user::Role::Farmer => Role::Farmer,
            user::Role::Distributor => Role::Distributor,
            user::Role::Retailer => Role::Retailer,
            user::Role::Consumer => Role::Consumer,
            user::Role::Admin => Role::Admin,
        }
    }
}

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Created,
    Harvested,
    InStorage,
    InTransit,
    Delivered,
    AtRetailer,
    Sold,
    Expired,
    Recalled,
}

impl From<batch::BatchStatus> for BatchStatus {
    fn from(status: batch::BatchStatus) -> Self {
        match status {
            batch::BatchStatus::Created => BatchStatus::Created,
            batch::BatchStatus::Harvested => BatchStatus::Harvested,
            batch::BatchStatus::InStorage => BatchStatus::InStorage,
            batch::BatchStatus::InTransit => BatchStatus::InTransit,
            batch::BatchStatus::Delivered => BatchStatus::Delivered,
            batch::BatchStatus::AtRetailer => BatchStatus::AtRetailer,
            batch::BatchStatus::Sold => BatchStatus::Sold,
            batch::BatchStatus::Expired => BatchStatus::Expired,
            batch::BatchStatus::Recalled => BatchStatus::Recalled,
        }
    }
}

/// Supply-chain event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Created,
    Harvested,
    Processed,
    Packaged,
    QualityChecked,
    Stored,
    Shipped,
    Received,
    DeliveredToRetailer,
    Sold,
    Recalled,
    Disposed,
}

impl From<supply_chain_event::EventType> for EventType {
    fn from(kind: supply_chain_event::EventType) -> Self {
        use supply_chain_event::EventType as Db;
        match kind {
            Db::Created => EventType::Created,
            Db::Harvested => EventType::Harvested,
            Db::Processed => EventType::Processed,
            Db::Packaged => EventType::Packaged,
            Db::QualityChecked => EventType::QualityChecked,
            Db::Stored => EventType::Stored,
            Db::Shipped => EventType::Shipped,
            Db::Received => EventType::Received,
            Db::DeliveredToRetailer => EventType::DeliveredToRetailer,
            Db::Sold => EventType::Sold,
            Db::Recalled => EventType::Recalled,
            Db::Disposed => EventType::Disposed,
        }
    }
}

impl From<EventType> for supply_chain_event::EventType {
    fn from(kind: EventType) -> Self {
        use supply_chain_event::EventType as Db;
        match kind {
            EventType::Created => Db::Created,
            EventType::Harvested => Db::Harvested,
            EventType::Processed => Db::Processed,
            EventType::Packaged => Db::Packaged,
            EventType::QualityChecked => Db::QualityChecked,
            EventType::Stored => Db::Stored,
            EventType::Shipped => Db::Shipped,
            EventType::Received => Db::Received,
            EventType::DeliveredToRetailer => Db::DeliveredToRetailer,
            EventType::Sold => Db::Sold,
            EventType::Recalled => Db::Recalled,
            EventType::Disposed => Db::Disposed,
        }
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    EventCreated,
    StatusChanged,
    QualityIssue,
    BatchReceived,
    BatchShipped,
    ExpirationWarning,
    SystemNotification,
}

impl From<notification::NotificationType> for NotificationType {
    fn from(kind: notification::NotificationType) -> Self {
        use notification::NotificationType as Db;
        match kind {
            Db::EventCreated => NotificationType::EventCreated,
            Db::StatusChanged => NotificationType::StatusChanged,
            Db::QualityIssue => NotificationType::QualityIssue,
            Db::BatchReceived => NotificationType::BatchReceived,
            Db::BatchShipped => NotificationType::BatchShipped,
            Db::ExpirationWarning => NotificationType::ExpirationWarning,
            Db::SystemNotification => NotificationType::SystemNotification,
        }
    }
}

// ============================================================
// Auth
// ============================================================

/// Request to register a new account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login name (unique)
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        custom(function = validate_username_charset)
    )]
    pub username: String,
    /// Contact email (unique)
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Plaintext password, hashed before storage
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = validate_password_strength)
    )]
    pub password: String,
    /// Given name
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,
    /// Family name
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,
    /// Contact phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_phone_number))]
    pub phone_number: Option<String>,
    /// Requested role; ADMIN is not self-assignable
    #[validate(custom(function = validate_registration_role))]
    pub role: String,
    /// Company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Company address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    /// Default "lat,lng" location for recorded events
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_location_coordinates))]
    pub location_coordinates: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed JWT bearer token
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// User id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Assigned role
    pub role: Role,
    /// Permission strings
    pub permissions: Vec<String>,
    /// Always "Login successful"
    pub message: String,
}

/// User profile as returned by the API (never includes password material)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    /// Assigned role
    pub role: Role,
    /// Company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Company address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    /// Default "lat,lng" location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<String>,
    /// Permission strings
    pub permissions: Vec<String>,
    /// Whether the account may log in
    pub enabled: bool,
    /// Whether the account passed verification
    pub verified: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last profile update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            profile_image_url: user.profile_image_url,
            role: user.role.into(),
            company_name: user.company_name,
            company_address: user.company_address,
            location_coordinates: user.location_coordinates,
            permissions: user.permissions.0,
            enabled: user.enabled,
            verified: user.verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Profile update; every present field overwrites the stored value
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New login name (checked for duplicates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New email (checked for duplicates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New plaintext password, re-hashed before storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    /// New role; resets permissions to the role's defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Company address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    /// Default "lat,lng" location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<String>,
    /// Explicit permission override, applied after any role reset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

// ============================================================
// Products
// ============================================================

/// Request to register a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Product name
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    /// Units on hand
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    /// Label code; synthesized from the name when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<String>,
    /// Harvest timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<DateTime<Utc>>,
    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Category, e.g. VEGETABLE, FRUIT, DAIRY
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Organically grown
    #[serde(default)]
    pub organic: bool,
    /// Certification label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    /// Cultivation method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultivation_method: Option<String>,
    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Product update; every present field overwrites the stored value
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    /// Product name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Units on hand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    /// Harvest timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<DateTime<Utc>>,
    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Organically grown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organic: Option<bool>,
    /// Certification label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    /// Cultivation method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultivation_method: Option<String>,
    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Product as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    /// Product id
    pub id: i64,
    /// Label code (unique)
    pub batch_code: String,
    /// Product name
    pub name: String,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units on hand
    pub stock: i32,
    /// Username of the creating user
    pub created_by_username: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Harvest timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<DateTime<Utc>>,
    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Organically grown
    pub organic: bool,
    /// Certification label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    /// Cultivation method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultivation_method: Option<String>,
    /// QR code URL (server-assigned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Environmental readings, newest first; omitted when none exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environmental_conditions: Option<Vec<ConditionResponse>>,
}

/// One page of products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Products on this page
    pub content: Vec<ProductResponse>,
    /// Zero-based page index
    pub page: u64,
    /// Page size
    pub size: u64,
    /// Total matching products
    pub total_elements: u64,
    /// Total pages
    pub total_pages: u64,
}

/// Query parameters for the paged product listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageQuery {
    /// Zero-based page index (default 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size (default 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Property to sort by (default id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default desc)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<String>,
    /// Case-insensitive name/description filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Environmental reading to record against a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRequest {
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Lux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_exposure: Option<f64>,
    /// Soil moisture percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    /// Soil pH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_ph: Option<f64>,
    /// Air quality index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<f64>,
    /// Where the reading was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Sensor or person that took the reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    /// When the reading was taken; defaults to now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Environmental reading as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResponse {
    /// Reading id
    pub id: i64,
    /// Owning product id
    pub product_id: i64,
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Lux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_exposure: Option<f64>,
    /// Soil moisture percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    /// Soil pH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_ph: Option<f64>,
    /// Air quality index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<f64>,
    /// Sensor or person that took the reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    /// Where the reading was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<product_condition::Model> for ConditionResponse {
    fn from(condition: product_condition::Model) -> Self {
        Self {
            id: condition.id,
            product_id: condition.product_id,
            timestamp: condition.recorded_at,
            temperature: condition.temperature,
            humidity: condition.humidity,
            light_exposure: condition.light_exposure,
            soil_moisture: condition.soil_moisture,
            soil_ph: condition.soil_ph,
            air_quality: condition.air_quality,
            recorded_by: condition.recorded_by,
            location: condition.location,
            notes: condition.notes,
        }
    }
}

// ============================================================
// Batches
// ============================================================

/// Request to create a production batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Product this batch belongs to
    pub product_id: i64,
    /// Units in the batch
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// Batch code; synthesized from the product name when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<String>,
    /// Production timestamp; defaults to now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_date: Option<DateTime<Utc>>,
    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Batch as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// Batch id
    pub id: i64,
    /// Batch code (unique), the public tracking key
    pub batch_code: String,
    /// Product id
    pub product_id: i64,
    /// Product name
    pub product_name: String,
    /// Units in the batch
    pub quantity: i32,
    /// Production timestamp
    pub production_date: DateTime<Utc>,
    /// Expiration timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Current lifecycle status
    pub status: BatchStatus,
    /// QR code URL (server-assigned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Username of the creating user
    pub created_by_username: String,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Chain-of-custody events, newest first; omitted when none exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventResponse>>,
}

// ============================================================
// Supply-chain events
// ============================================================

/// Request to record a supply-chain event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// What happened
    pub event_type: EventType,
    /// Target batch id; alternative to batchCode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<i64>,
    /// Target batch code; alternative to batchId
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<String>,
    /// Username of the receiving party, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_by_username: Option<String>,
    /// When it happened; defaults to now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-text location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "lat,lng" pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<String>,
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ledger anchor hash, if mirrored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_tx_hash: Option<String>,
    /// Free-form key/value payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<BTreeMap<String, String>>,
}

/// Event update; every present field overwrites the stored value
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    /// Free-text location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "lat,lng" pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<String>,
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ledger anchor hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_tx_hash: Option<String>,
    /// Free-form key/value payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<BTreeMap<String, String>>,
}

/// Supply-chain event as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Event id
    pub id: i64,
    /// What happened
    pub event_type: EventType,
    /// Batch id
    pub batch_id: i64,
    /// Batch code
    pub batch_code: String,
    /// Username of the recording user
    pub initiated_by_username: String,
    /// Username of the receiving party, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_by_username: Option<String>,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Free-text location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "lat,lng" pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<String>,
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ledger anchor hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_tx_hash: Option<String>,
    /// Free-form key/value payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<BTreeMap<String, String>>,
}

/// One page of events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// Events on this page, newest first
    pub content: Vec<EventResponse>,
    /// Zero-based page index
    pub page: u64,
    /// Page size
    pub size: u64,
    /// Total matching events
    pub total_elements: u64,
    /// Total pages
    pub total_pages: u64,
}

/// Plain page/size query parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Zero-based page index (default 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size (default 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Inclusive event-time range query parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// Range start, RFC 3339 or naive ISO-8601
    pub start_date: String,
    /// Range end, RFC 3339 or naive ISO-8601
    pub end_date: String,
}

/// Keyword search query parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeywordQuery {
    /// Case-insensitive name/description filter
    pub keyword: String,
}

/// Expiry window query parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaysQuery {
    /// Window length in days (default 7)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
}

/// Direct status assignment query parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusQuery {
    /// Target status name, e.g. "IN_TRANSIT"
    pub status: String,
}

// ============================================================
// Notifications
// ============================================================

/// Notification as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Notification id
    pub id: i64,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Whether the recipient has read it
    pub read: bool,
    /// Category
    pub notification_type: NotificationType,
    /// Entity kind this notification refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    /// Entity id this notification refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(notification: notification::Model) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            message: notification.message,
            read: notification.read,
            notification_type: notification.notification_type.into(),
            related_entity_type: notification.related_entity_type,
            related_entity_id: notification.related_entity_id,
            created_at: notification.created_at,
        }
    }
}

/// One page of notifications
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    /// Notifications on this page, newest first
    pub content: Vec<NotificationResponse>,
    /// Zero-based page index
    pub page: u64,
    /// Page size
    pub size: u64,
    /// Total notifications for the caller
    pub total_elements: u64,
    /// Total pages
    pub total_pages: u64,
}

/// Unread notification count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationCount {
    /// Number of unread notifications
    pub count: u64,
}

// ============================================================
// Public projections
// ============================================================

/// Batch, product, and event history bundle for one batch code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    /// The batch
    pub batch: BatchResponse,
    /// The batch's product
    pub product: ProductResponse,
    /// Chain-of-custody events, newest first
    pub events: Vec<EventResponse>,
}

/// Derived tracking metrics; empty object when the batch has no events
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingMetrics {
    /// Whole days since the most recent HARVESTED event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_harvest: Option<i64>,
    /// Whole hours between the most recent SHIPPED and RECEIVED events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_in_transit: Option<i64>,
    /// Number of QUALITY_CHECKED events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_checks: Option<u64>,
    /// Placeholder estimate in kg CO2e
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_carbon_footprint: Option<f64>,
}

/// Journey plus derived metrics
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    /// The batch
    pub batch: BatchResponse,
    /// The batch's product
    pub product: ProductResponse,
    /// Chain-of-custody events, newest first
    pub events: Vec<EventResponse>,
    /// Derived metrics
    pub metrics: TrackingMetrics,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

// ============================================================
// Validation helpers
// ============================================================

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_username_charset(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(validation_error(
            "username_charset",
            "Username can only contain letters, numbers, dots, underscores, and hyphens",
        ))
    }
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| "@#$%^&+=!".contains(c));
    let has_whitespace = password.chars().any(char::is_whitespace);
    if has_digit && has_lower && has_upper && has_special && !has_whitespace {
        Ok(())
    } else {
        Err(validation_error(
            "password_strength",
            "Password must contain at least one digit, one lowercase letter, one uppercase letter, and one special character",
        ))
    }
}

fn validate_registration_role(role: &str) -> Result<(), ValidationError> {
    match role.to_ascii_uppercase().as_str() {
        "FARMER" | "DISTRIBUTOR" | "RETAILER" | "CONSUMER" => Ok(()),
        _ => Err(validation_error(
            "role",
            "Role must be one of: FARMER, DISTRIBUTOR, RETAILER, CONSUMER",
        )),
    }
}

fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    let digits = rest.chars().filter(char::is_ascii_digit).count();
    let charset_ok = rest
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '.' | '-' | '(' | ')'));
    if charset_ok && (7..=15).contains(&digits) {
        Ok(())
    } else {
        Err(validation_error("phone_number", "Invalid phone number format"))
    }
}

fn validate_location_coordinates(value: &str) -> Result<(), ValidationError> {
    fn is_decimal(s: &str) -> bool {
        let s = s.strip_prefix('-').unwrap_or(s);
        !s.is_empty()
            && !s.starts_with('.')
            && !s.ends_with('.')
            && s.chars().filter(|c| *c == '.').count() <= 1
            && s.chars().all(|c| c.is_ascii_digit() || c == '.')
    }

    let valid = value
        .split_once(',')
        .map(|(lat, lng)| is_decimal(lat) && is_decimal(lng))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(validation_error(
            "location_coordinates",
            "Location coordinates must be in format: latitude,longitude",
        ))
    }
}
