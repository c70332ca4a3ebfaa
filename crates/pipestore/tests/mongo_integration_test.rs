//! Integration tests for MongoStoreClient
//!
//! Run with: cargo test -p pipestore --test mongo_integration_test -- --ignored --test-threads=1
//!
//! Requirements:
//! - MongoDB reachable at PIPESTORE_TEST_MONGO_HOST:PIPESTORE_TEST_MONGO_PORT
//!   (default localhost:27017), without authentication

use std::time::{Duration, Instant};

use uuid::Uuid;

use pipestore::{
    DatabaseConfig, MongoStoreClient, ObjectKey, StoreClient, StoreError, StoredObject,
};

/// Get test database config from environment or use defaults
fn test_config() -> DatabaseConfig {
    let host = std::env::var("PIPESTORE_TEST_MONGO_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("PIPESTORE_TEST_MONGO_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(27017);

    DatabaseConfig::new(host, port)
        .with_database_name("pipestore_test")
        .with_timeout(Duration::from_secs(5))
}

/// Connect and use a unique app service key so runs do not collide
async fn create_test_client() -> (MongoStoreClient, String) {
    let client = MongoStoreClient::connect(&test_config())
        .await
        .expect("Failed to connect to MongoDB. Set PIPESTORE_TEST_MONGO_HOST or start mongod.");
    (client, format!("svc-{}", Uuid::new_v4()))
}

/// Remove everything stored under `app_service_key`
async fn cleanup(client: &MongoStoreClient, app_service_key: &str) {
    for object in client
        .retrieve_from_store(app_service_key)
        .await
        .unwrap_or_default()
    {
        client.remove_from_store(&object.id).await.ok();
    }
}

// ============================================
// Store Client Tests
// ============================================

#[tokio::test]
#[ignore]
async fn test_store_and_update_retry_count() {
    let (client, key) = create_test_client().await;

    let id = client
        .store(StoredObject::new(&key, vec![0x01, 0x02]).with_retry_count(0))
        .await
        .expect("Failed to store object");
    assert!(!id.is_empty());

    let matched = client
        .update_retry_count(&id, 3)
        .await
        .expect("Failed to update retry count");
    assert_eq!(matched, 1);

    let stored = client.retrieve_from_store(&key).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].retry_count, 3);
    assert_eq!(stored[0].payload, vec![0x01, 0x02]);

    cleanup(&client, &key).await;
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_duplicate_uuid_rejected() {
    let (client, key) = create_test_client().await;
    let uuid = Uuid::new_v4();
    let object = StoredObject::new(&key, vec![1]).with_id(uuid.to_string());

    client.store(object.clone()).await.unwrap();
    let second = client.store(object).await;
    assert!(matches!(second, Err(StoreError::DuplicateObject(u)) if u == uuid));

    assert_eq!(client.retrieve_from_store(&key).await.unwrap().len(), 1);

    cleanup(&client, &key).await;
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_update_and_remove() {
    let (client, key) = create_test_client().await;

    let id = client.store(StoredObject::new(&key, vec![1])).await.unwrap();
    let replacement = StoredObject::new(&key, vec![2, 3])
        .with_id(id.clone())
        .with_pipeline_position(5);
    client.update(replacement.clone()).await.unwrap();

    let stored = client.retrieve_from_store(&key).await.unwrap();
    assert_eq!(stored, vec![replacement]);

    assert_eq!(client.remove_from_store(&id).await.unwrap(), 1);
    assert!(client.retrieve_from_store(&key).await.unwrap().is_empty());

    // Replacing a removed document is reported as not found
    let missing = client
        .update(StoredObject::new(&key, vec![4]).with_id(id))
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_restore_with_assigned_id() {
    let (client, key) = create_test_client().await;
    let restored_key = ObjectKey::Assigned {
        object_id: bson::oid::ObjectId::new(),
        uuid: Uuid::new_v4(),
    };

    let id = client
        .store(StoredObject::new(&key, vec![7]).with_id(restored_key.encode()))
        .await
        .unwrap();
    assert_eq!(id, restored_key.encode());

    // A second restore of the same id is a permanent conflict
    let again = client
        .store(StoredObject::new(&key, vec![8]).with_id(restored_key.encode()))
        .await;
    let err = again.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
    assert!(!err.is_transient());

    cleanup(&client, &key).await;
    client.disconnect().await.unwrap();
}

// ============================================
// Bootstrap Tests
// ============================================

#[tokio::test]
#[ignore]
async fn test_unreachable_server_fails_within_bound() {
    // TEST-NET-1 address, never routable
    let timeout = Duration::from_millis(300);
    let config = DatabaseConfig::new("192.0.2.1", 27017).with_timeout(timeout);
    let started = Instant::now();

    let result = MongoStoreClient::connect(&config).await;

    assert!(matches!(
        result,
        Err(StoreError::Timeout(_)) | Err(StoreError::Unavailable(_))
    ));
    assert!(started.elapsed() < timeout * 2);
}
