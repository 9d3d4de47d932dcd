//! Database entities

pub mod batch;
pub mod notification;
pub mod product;
pub mod product_condition;
pub mod supply_chain_event;
pub mod user;

pub use batch::Entity as Batch;
pub use notification::Entity as Notification;
pub use product::Entity as Product;
pub use product_condition::Entity as ProductCondition;
pub use supply_chain_event::Entity as SupplyChainEvent;
pub use user::Entity as User;

pub mod prelude {
    pub use super::batch::Entity as Batch;
    pub use super::notification::Entity as Notification;
    pub use super::product::Entity as Product;
    pub use super::product_condition::Entity as ProductCondition;
    pub use super::supply_chain_event::Entity as SupplyChainEvent;
    pub use super::user::Entity as User;
}
