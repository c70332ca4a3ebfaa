//! StoreClient trait definition

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::StoredObject;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Identifier string could not be decoded
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Operation requires an identifier that was not supplied
    #[error("missing identifier: {0}")]
    MissingIdentifier(&'static str),

    /// A document with this correlation UUID already exists
    #[error("object exists in database: {0}")]
    DuplicateObject(Uuid),

    /// The store already holds a document with this `_id`
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// No document matched the identifier
    #[error("object not found: {0}")]
    NotFound(String),

    /// Connection or driver failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Operation did not finish before its deadline
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Document could not be mapped to or from a StoredObject
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid connection configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The client was already disconnected
    #[error("store client is disconnected")]
    Disconnected,
}

impl StoreError {
    /// Whether a caller could reasonably re-submit the same request later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Persistence client for pipeline items awaiting retry
///
/// Every operation runs independently under the client's per-call timeout.
/// Nothing is retried internally; retry policy belongs to the caller.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Persist a new object and return its composite identifier
    ///
    /// Fails with [`StoreError::DuplicateObject`] when the object carries a
    /// correlation UUID that is already stored and no store id.
    async fn store(&self, object: StoredObject) -> Result<String, StoreError>;

    /// Load every object belonging to `app_service_key`
    ///
    /// No ordering is guaranteed. Any failure discards all results.
    async fn retrieve_from_store(
        &self,
        app_service_key: &str,
    ) -> Result<Vec<StoredObject>, StoreError>;

    /// Replace the stored document for `object.id` with `object`
    async fn update(&self, object: StoredObject) -> Result<(), StoreError>;

    /// Set only the retry count of the object with `id`
    ///
    /// Returns the number of documents matched. Zero is not an error.
    async fn update_retry_count(&self, id: &str, count: u32) -> Result<u64, StoreError>;

    /// Delete the object with `id`
    ///
    /// Returns the number of documents deleted. Zero is not an error.
    async fn remove_from_store(&self, id: &str) -> Result<u64, StoreError>;

    /// Close the underlying connection
    ///
    /// All later calls, including a second disconnect, fail with
    /// [`StoreError::Disconnected`].
    async fn disconnect(&self) -> Result<(), StoreError>;
}
