//! # Pipestore
//!
//! A MongoDB-backed persistence client for pipeline items that are waiting for
//! a delivery retry.
//!
//! ## Features
//!
//! - **Composite identifiers**: store-assigned object ids and caller-supplied
//!   correlation UUIDs travel together as one opaque string
//! - **Duplicate rejection**: a second submission of the same correlation UUID is refused
//! - **Bounded calls**: every store operation runs under its own deadline
//! - **Deadline-bounded bootstrap**: connect + ping race a timer, and a losing
//!   connect attempt is cancelled
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MongoStoreClient::connect                  │
//! │  (builds the URI, races connect + ping against a deadline)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 DocumentStoreClient<C>                       │
//! │  (store / retrieve / update / retry count / remove)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │       ObjectKey codec  +  document mapper  +  collection     │
//! │  (MongoDB "store" collection, or in-memory for tests)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pipestore::prelude::*;
//!
//! let config = DatabaseConfig::from_env();
//! let client = MongoStoreClient::connect(&config).await?;
//!
//! let id = client
//!     .store(StoredObject::new("my-app-service", payload))
//!     .await?;
//!
//! for item in client.retrieve_from_store("my-app-service").await? {
//!     // re-submit item.payload, then:
//!     client.update_retry_count(&item.id, item.retry_count + 1).await?;
//! }
//!
//! client.disconnect().await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod model;
pub mod persistence;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::DatabaseConfig;
    pub use crate::model::StoredObject;
    pub use crate::persistence::{
        DocumentStoreClient, InMemoryStoreClient, MongoStoreClient, ObjectKey, StoreClient,
        StoreError,
    };
}

// Re-export key types at crate root
pub use config::DatabaseConfig;
pub use model::StoredObject;
pub use persistence::{
    DocumentCollection, DocumentStoreClient, InMemoryCollection, InMemoryStoreClient,
    MongoCollection, MongoStoreClient, ObjectKey, StoreClient, StoreError, STORE_COLLECTION,
};
