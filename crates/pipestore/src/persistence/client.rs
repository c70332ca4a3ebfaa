//! Store client over any DocumentCollection
//!
//! Holds the identity and duplicate rules. Backends only move documents.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use tracing::{debug, instrument, warn};

use super::collection::DocumentCollection;
use super::document::{self, APP_SERVICE_KEY_FIELD, ID_FIELD, RETRY_COUNT_FIELD, UUID_FIELD};
use super::key::ObjectKey;
use super::store::{StoreClient, StoreError};
use crate::model::StoredObject;

/// StoreClient implementation over a [`DocumentCollection`]
///
/// Each call is bounded by `timeout` on its own; there is no shared
/// transaction or cache between calls.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use pipestore::{InMemoryStoreClient, StoreClient, StoredObject};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = InMemoryStoreClient::in_memory(Duration::from_secs(1));
/// let id = client.store(StoredObject::new("svcA", vec![1, 2])).await.unwrap();
/// assert!(!id.is_empty());
/// # }
/// ```
pub struct DocumentStoreClient<C> {
    collection: C,
    timeout: Duration,
    disconnected: AtomicBool,
}

impl<C: DocumentCollection> DocumentStoreClient<C> {
    /// Create a client over `collection` with a per-call `timeout`
    pub fn new(collection: C, timeout: Duration) -> Self {
        Self {
            collection,
            timeout,
            disconnected: AtomicBool::new(false),
        }
    }

    /// Get a reference to the underlying collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Run `operation` under the per-call deadline
    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.is_disconnected() {
            return Err(StoreError::Disconnected);
        }

        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

/// Decode an identifier that must refer to a persisted object
fn required_object_id(id: &str) -> Result<ObjectId, StoreError> {
    if id.is_empty() {
        return Err(StoreError::MissingIdentifier("no id provided"));
    }

    ObjectKey::decode(id)?
        .object_id()
        .ok_or(StoreError::MissingIdentifier("id has no store-assigned part"))
}

#[async_trait]
impl<C: DocumentCollection> StoreClient for DocumentStoreClient<C> {
    #[instrument(skip(self, object), fields(app_service_key = %object.app_service_key))]
    async fn store(&self, object: StoredObject) -> Result<String, StoreError> {
        let key = ObjectKey::decode(&object.id)?;
        let document = document::to_document(&key, &object)?;

        self.bounded(async {
            // Only unassigned objects are checked; restores carry their own _id.
            // Lookup then insert is not atomic across concurrent stores.
            if let ObjectKey::Unassigned { uuid } = key {
                let existing = self
                    .collection
                    .find_one(doc! { UUID_FIELD: uuid.to_string() })
                    .await?;
                if existing.is_some() {
                    warn!(%uuid, "object exists in database");
                    return Err(StoreError::DuplicateObject(uuid));
                }
            }

            let object_id = self.collection.insert_one(document).await?;
            let stored = key.assign(object_id);
            debug!(id = %stored, "stored object");
            Ok(stored.encode())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn retrieve_from_store(
        &self,
        app_service_key: &str,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let documents = self
            .bounded(
                self.collection
                    .find(doc! { APP_SERVICE_KEY_FIELD: app_service_key }),
            )
            .await?;

        let objects = documents
            .into_iter()
            .map(document::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = objects.len(), "retrieved objects");
        Ok(objects)
    }

    #[instrument(skip(self, object), fields(id = %object.id))]
    async fn update(&self, object: StoredObject) -> Result<(), StoreError> {
        if object.id.is_empty() {
            return Err(StoreError::MissingIdentifier(
                "update argument object does not have an id",
            ));
        }

        let key = ObjectKey::decode(&object.id)?;
        let object_id = key.object_id().ok_or(StoreError::MissingIdentifier(
            "update argument object has no store-assigned id",
        ))?;
        let replacement = document::to_document(&key, &object)?;

        let matched = self
            .bounded(
                self.collection
                    .replace_one(doc! { ID_FIELD: object_id }, replacement),
            )
            .await?;

        if matched == 0 {
            return Err(StoreError::NotFound(object.id));
        }

        debug!("replaced object");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_retry_count(&self, id: &str, count: u32) -> Result<u64, StoreError> {
        let object_id = required_object_id(id)?;

        let matched = self
            .bounded(self.collection.update_one(
                doc! { ID_FIELD: object_id },
                doc! { "$set": { RETRY_COUNT_FIELD: i64::from(count) } },
            ))
            .await?;

        debug!(matched, "updated retry count");
        Ok(matched)
    }

    #[instrument(skip(self))]
    async fn remove_from_store(&self, id: &str) -> Result<u64, StoreError> {
        let object_id = required_object_id(id)?;

        let deleted = self
            .bounded(self.collection.delete_one(doc! { ID_FIELD: object_id }))
            .await?;

        debug!(deleted, "removed object");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) -> Result<(), StoreError> {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Disconnected);
        }

        tokio::time::timeout(self.timeout, self.collection.shutdown())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        debug!("disconnected from store");
        Ok(())
    }
}
