//! DocumentCollection trait definition

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;

use super::store::StoreError;

/// Name of the single collection holding stored objects
pub const STORE_COLLECTION: &str = "store";

/// The subset of a document collection the store client relies on
///
/// Filters are equality matches on top-level fields. Implementations only
/// need single-document atomicity.
#[async_trait]
pub trait DocumentCollection: Send + Sync + 'static {
    /// First document matching `filter`
    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError>;

    /// Every document matching `filter`, in store-native order
    async fn find(&self, filter: Document) -> Result<Vec<Document>, StoreError>;

    /// Insert a document, returning its `_id`
    ///
    /// A missing `_id` is generated by the store.
    async fn insert_one(&self, document: Document) -> Result<ObjectId, StoreError>;

    /// Replace the first document matching `filter`, returning the matched count
    async fn replace_one(&self, filter: Document, replacement: Document)
        -> Result<u64, StoreError>;

    /// Apply a `$set` update to the first match, returning the matched count
    async fn update_one(&self, filter: Document, update: Document) -> Result<u64, StoreError>;

    /// Delete the first document matching `filter`, returning the deleted count
    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError>;

    /// Close the underlying connection
    async fn shutdown(&self) -> Result<(), StoreError>;
}
