//! User entity with roles and derived permissions

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// User role driving default permissions and authorization checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Grows produce, registers products, creates batches
    #[sea_orm(string_value = "FARMER")]
    Farmer,

    /// Moves batches between parties
    #[sea_orm(string_value = "DISTRIBUTOR")]
    Distributor,

    /// Stocks and sells batches
    #[sea_orm(string_value = "RETAILER")]
    Retailer,

    /// End consumer, read-only tracing
    #[sea_orm(string_value = "CONSUMER")]
    Consumer,

    /// System administrator with full access
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Role {
    /// Default permission set granted when a user is created with this role.
    pub fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Farmer => &[
                "product:create",
                "product:read",
                "product:update",
                "product:delete",
                "batch:create",
                "batch:read",
                "batch:update",
                "event:create",
                "event:read",
            ],
            Role::Distributor => &[
                "batch:read",
                "event:create",
                "event:read",
                "shipment:create",
                "shipment:read",
                "shipment:update",
            ],
            Role::Retailer => &[
                "batch:read",
                "event:create",
                "event:read",
                "inventory:create",
                "inventory:read",
                "inventory:update",
            ],
            Role::Consumer => &["product:read", "trace:read"],
            Role::Admin => &["admin:all"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "FARMER",
            Role::Distributor => "DISTRIBUTOR",
            Role::Retailer => "RETAILER",
            Role::Consumer => "CONSUMER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FARMER" => Ok(Role::Farmer),
            "DISTRIBUTOR" => Ok(Role::Distributor),
            "RETAILER" => Ok(Role::Retailer),
            "CONSUMER" => Ok(Role::Consumer),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Permission strings held by a user, stored as a JSON array
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    /// Permission set a role grants by default.
    pub fn for_role(role: &Role) -> Self {
        Permissions(
            role.default_permissions()
                .iter()
                .map(|p| ToString::to_string(p))
                .collect(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Login name (unique)
    #[sea_orm(unique)]
    pub username: String,

    /// Contact email (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: Role,

    /// Permission strings, derived from role at creation
    #[sea_orm(column_type = "Json")]
    pub permissions: Permissions,

    /// Whether the account may log in
    pub enabled: bool,

    /// Whether the account passed identity verification
    pub verified: bool,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,

    /// "lat,lng" pair used as the default event location
    pub location_coordinates: Option<String>,

    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Products registered by this user
    #[sea_orm(has_many = "super::product::Entity")]
    Products,

    /// Batches created by this user
    #[sea_orm(has_many = "super::batch::Entity")]
    Batches,

    /// Notifications delivered to this user
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
