//! Product catalog entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Human-readable product code (unique), printed on labels and QR codes
    #[sea_orm(unique)]
    pub batch_code: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub price: f64,

    /// Units currently on hand
    pub stock: i32,

    pub harvest_date: Option<ChronoDateTimeUtc>,
    pub expiration_date: Option<ChronoDateTimeUtc>,

    /// Category string, e.g. VEGETABLE, FRUIT, DAIRY
    pub product_type: Option<String>,

    pub organic: bool,

    pub certification: Option<String>,
    pub cultivation_method: Option<String>,

    pub image_url: Option<String>,
    pub qr_code_url: Option<String>,

    /// Creator and owner of the product
    pub user_id: i64,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Product belongs to its creating user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,

    /// Production lots of this product
    #[sea_orm(has_many = "super::batch::Entity")]
    Batches,

    /// Environmental readings recorded against this product
    #[sea_orm(has_many = "super::product_condition::Entity")]
    Conditions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::product_condition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conditions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
