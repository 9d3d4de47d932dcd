//! Environmental condition readings attached to a product
//!
//! Append-only sensor/observation log: created alongside or after the
//! product, never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_environmental_conditions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub product_id: i64,

    /// Degrees Celsius
    pub temperature: Option<f64>,

    /// Relative humidity percentage
    pub humidity: Option<f64>,

    /// Lux
    pub light_exposure: Option<f64>,

    pub soil_moisture: Option<f64>,
    pub soil_ph: Option<f64>,
    pub air_quality: Option<f64>,

    pub location: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// Identifier of the sensor or person that took the reading
    pub recorded_by: Option<String>,

    pub recorded_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
