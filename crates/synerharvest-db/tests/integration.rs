//! Integration tests for synerharvest-db
//!
//! Tests entity operations against a real SQLite in-memory database.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use synerharvest_db::entities::{batch, notification, product, supply_chain_event, user};
use synerharvest_db::{connect, migrate};

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

fn test_user(username: &str, email: &str, role: user::Role) -> user::ActiveModel {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$fake".to_string()),
        permissions: Set(user::Permissions::for_role(&role)),
        role: Set(role),
        enabled: Set(true),
        verified: Set(false),
        first_name: Set(None),
        last_name: Set(None),
        phone_number: Set(None),
        profile_image_url: Set(None),
        company_name: Set(None),
        company_address: Set(None),
        location_coordinates: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
}

fn test_product(user_id: i64, code: &str, name: &str) -> product::ActiveModel {
    product::ActiveModel {
        batch_code: Set(code.to_string()),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(2.5),
        stock: Set(100),
        harvest_date: Set(None),
        expiration_date: Set(None),
        product_type: Set(Some("VEGETABLE".to_string())),
        organic: Set(true),
        certification: Set(None),
        cultivation_method: Set(None),
        image_url: Set(None),
        qr_code_url: Set(None),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

fn test_batch(product_id: i64, created_by: i64, code: &str) -> batch::ActiveModel {
    batch::ActiveModel {
        batch_code: Set(code.to_string()),
        product_id: Set(product_id),
        quantity: Set(50),
        production_date: Set(Utc::now()),
        expiration_date: Set(None),
        status: Set(batch::BatchStatus::Created),
        qr_code_url: Set(None),
        notes: Set(None),
        created_by: Set(created_by),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_and_fetch_user() {
    let db = setup_test_db().await;

    let inserted = test_user("alice", "alice@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    assert!(inserted.id > 0);

    let found = user::Entity::find()
        .filter(user::Column::Username.eq("alice"))
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("User not found");

    assert_eq!(found.email, "alice@farm.test");
    assert_eq!(found.role, user::Role::Farmer);
    assert!(found
        .permissions
        .0
        .contains(&"product:create".to_string()));
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let db = setup_test_db().await;

    test_user("bob", "bob@one.test", user::Role::Retailer)
        .insert(&db)
        .await
        .expect("Failed to insert first user");

    let result = test_user("bob", "bob@two.test", user::Role::Retailer)
        .insert(&db)
        .await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_product_batch_relation() {
    let db = setup_test_db().await;

    let farmer = test_user("carol", "carol@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let apples = test_product(farmer.id, "APP-1", "Apples")
        .insert(&db)
        .await
        .expect("Failed to insert product");

    test_batch(apples.id, farmer.id, "APP-1-B1")
        .insert(&db)
        .await
        .expect("Failed to insert batch");

    test_batch(apples.id, farmer.id, "APP-1-B2")
        .insert(&db)
        .await
        .expect("Failed to insert batch");

    let batches = apples
        .find_related(batch::Entity)
        .all(&db)
        .await
        .expect("Failed to query related batches");

    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.product_id == apples.id));
}

#[tokio::test]
async fn test_batch_status_update_persists() {
    let db = setup_test_db().await;

    let farmer = test_user("dave", "dave@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");
    let product = test_product(farmer.id, "TOM-1", "Tomatoes")
        .insert(&db)
        .await
        .expect("Failed to insert product");
    let batch_row = test_batch(product.id, farmer.id, "TOM-1-B1")
        .insert(&db)
        .await
        .expect("Failed to insert batch");

    let mut active: batch::ActiveModel = batch_row.into();
    active.status = Set(batch::BatchStatus::InTransit);
    let updated = active.update(&db).await.expect("Failed to update");

    assert_eq!(updated.status, batch::BatchStatus::InTransit);

    let by_status = batch::Entity::find()
        .filter(batch::Column::Status.eq(batch::BatchStatus::InTransit))
        .all(&db)
        .await
        .expect("Failed to query by status");

    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].batch_code, "TOM-1-B1");
}

#[tokio::test]
async fn test_events_order_newest_first() {
    let db = setup_test_db().await;

    let farmer = test_user("erin", "erin@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");
    let product = test_product(farmer.id, "CAR-1", "Carrots")
        .insert(&db)
        .await
        .expect("Failed to insert product");
    let batch_row = test_batch(product.id, farmer.id, "CAR-1-B1")
        .insert(&db)
        .await
        .expect("Failed to insert batch");

    let base = Utc::now();
    for (offset, ty) in [
        (0, supply_chain_event::EventType::Harvested),
        (2, supply_chain_event::EventType::Shipped),
        (4, supply_chain_event::EventType::Received),
    ] {
        supply_chain_event::ActiveModel {
            batch_id: Set(batch_row.id),
            event_type: Set(ty),
            initiated_by: Set(farmer.id),
            received_by: Set(None),
            location: Set(None),
            geo_coordinates: Set(None),
            temperature: Set(None),
            humidity: Set(None),
            notes: Set(None),
            blockchain_tx_hash: Set(None),
            additional_data: Set(None),
            event_time: Set(base + Duration::hours(offset)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to insert event");
    }

    let events = supply_chain_event::Entity::find()
        .filter(supply_chain_event::Column::BatchId.eq(batch_row.id))
        .order_by_desc(supply_chain_event::Column::EventTime)
        .all(&db)
        .await
        .expect("Failed to query events");

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0].event_type,
        supply_chain_event::EventType::Received
    );
    assert_eq!(
        events[2].event_type,
        supply_chain_event::EventType::Harvested
    );
}

#[tokio::test]
async fn test_notification_unread_filter_and_mark_read() {
    let db = setup_test_db().await;

    let retailer = test_user("frank", "frank@shop.test", user::Role::Retailer)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    for i in 0..3 {
        notification::ActiveModel {
            user_id: Set(retailer.id),
            title: Set(format!("Title {i}")),
            message: Set("message".to_string()),
            read: Set(false),
            notification_type: Set(notification::NotificationType::EventCreated),
            related_entity_type: Set(None),
            related_entity_id: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to insert notification");
    }

    let unread = notification::Entity::find()
        .filter(notification::Column::UserId.eq(retailer.id))
        .filter(notification::Column::Read.eq(false))
        .count(&db)
        .await
        .expect("Failed to count unread");
    assert_eq!(unread, 3);

    let first = notification::Entity::find()
        .filter(notification::Column::UserId.eq(retailer.id))
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Notification not found");

    let mut active: notification::ActiveModel = first.into();
    active.read = Set(true);
    active.update(&db).await.expect("Failed to mark read");

    let unread_after = notification::Entity::find()
        .filter(notification::Column::UserId.eq(retailer.id))
        .filter(notification::Column::Read.eq(false))
        .count(&db)
        .await
        .expect("Failed to count unread");
    assert_eq!(unread_after, 2);
}

#[tokio::test]
async fn test_cascade_delete_product_removes_batches() {
    let db = setup_test_db().await;

    let farmer = test_user("gina", "gina@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");
    let product = test_product(farmer.id, "KAL-1", "Kale")
        .insert(&db)
        .await
        .expect("Failed to insert product");
    test_batch(product.id, farmer.id, "KAL-1-B1")
        .insert(&db)
        .await
        .expect("Failed to insert batch");

    product
        .delete(&db)
        .await
        .expect("Failed to delete product");

    let remaining = batch::Entity::find()
        .filter(batch::Column::BatchCode.eq("KAL-1-B1"))
        .one(&db)
        .await
        .expect("Failed to query");

    assert!(remaining.is_none());
}

#[tokio::test]
async fn test_concurrent_inserts() {
    let db = setup_test_db().await;

    let farmer = test_user("hugo", "hugo@farm.test", user::Role::Farmer)
        .insert(&db)
        .await
        .expect("Failed to insert user");

    let mut handles = vec![];

    for i in 0..10 {
        let db_clone = db.clone();
        let user_id = farmer.id;
        let handle = tokio::spawn(async move {
            test_product(user_id, &format!("CON-{i}"), &format!("Concurrent {i}"))
                .insert(&db_clone)
                .await
        });

        handles.push(handle);
    }

    for handle in handles {
        let result = handle.await.expect("Task panicked");
        assert!(result.is_ok());
    }

    let total = product::Entity::find()
        .filter(product::Column::UserId.eq(farmer.id))
        .count(&db)
        .await
        .expect("Failed to count products");
    assert_eq!(total, 10);
}
