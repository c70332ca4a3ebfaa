//! In-memory implementation of DocumentCollection for testing

use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;

use super::client::DocumentStoreClient;
use super::collection::DocumentCollection;
use super::document::ID_FIELD;
use super::store::StoreError;

/// In-memory implementation of DocumentCollection
///
/// This is primarily for testing. It keeps documents in insertion order and
/// mirrors MongoDB's behavior for the operations the store client uses:
/// generated `_id`s, duplicate-key rejection and `$set` updates.
///
/// # Example
///
/// ```
/// use pipestore::InMemoryCollection;
///
/// let collection = InMemoryCollection::new();
/// assert!(collection.is_empty());
/// ```
pub struct InMemoryCollection {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Get the number of documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Snapshot of every stored document
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read();
        Ok(documents.iter().find(|d| matches(d, &filter)).cloned())
    }

    async fn find(&self, filter: Document) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read();
        Ok(documents
            .iter()
            .filter(|d| matches(d, &filter))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, mut document: Document) -> Result<ObjectId, StoreError> {
        let object_id = match document.get(ID_FIELD) {
            Some(Bson::ObjectId(object_id)) => *object_id,
            Some(other) => {
                return Err(StoreError::Serialization(format!(
                    "_id must be an ObjectId, got {}",
                    other
                )))
            }
            None => {
                let object_id = ObjectId::new();
                document.insert(ID_FIELD, object_id);
                object_id
            }
        };

        let mut documents = self.documents.write();
        if documents
            .iter()
            .any(|d| d.get_object_id(ID_FIELD).ok() == Some(object_id))
        {
            return Err(StoreError::DuplicateKey(format!(
                "E11000 duplicate key error collection: store index: _id_ dup key: {}",
                object_id
            )));
        }

        documents.push(document);
        Ok(object_id)
    }

    async fn replace_one(
        &self,
        filter: Document,
        mut replacement: Document,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write();
        let Some(existing) = documents.iter_mut().find(|d| matches(d, &filter)) else {
            return Ok(0);
        };

        // The replacement never changes the stored _id
        if let Some(id) = existing.get(ID_FIELD).cloned() {
            replacement.insert(ID_FIELD, id);
        }
        *existing = replacement;
        Ok(1)
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<u64, StoreError> {
        let fields = update
            .get_document("$set")
            .map_err(|_| StoreError::Unavailable("only $set updates are supported".to_string()))?
            .clone();

        let mut documents = self.documents.write();
        let Some(existing) = documents.iter_mut().find(|d| matches(d, &filter)) else {
            return Ok(0);
        };

        for (field, value) in fields {
            existing.insert(field, value);
        }
        Ok(1)
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let mut documents = self.documents.write();
        match documents.iter().position(|d| matches(d, &filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store client backed by an [`InMemoryCollection`]
pub type InMemoryStoreClient = DocumentStoreClient<InMemoryCollection>;

impl DocumentStoreClient<InMemoryCollection> {
    /// Create a client over a fresh in-memory collection
    pub fn in_memory(timeout: Duration) -> Self {
        Self::new(InMemoryCollection::new(), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_insert_generates_id() {
        let collection = InMemoryCollection::new();

        let id = collection.insert_one(doc! { "k": "v" }).await.unwrap();

        let found = collection.find_one(doc! { "_id": id }).await.unwrap();
        assert_eq!(found.unwrap().get_str("k").unwrap(), "v");
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let collection = InMemoryCollection::new();
        let id = ObjectId::new();

        collection.insert_one(doc! { "_id": id }).await.unwrap();
        let result = collection.insert_one(doc! { "_id": id }).await;

        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let collection = InMemoryCollection::new();
        for n in 0..3 {
            collection
                .insert_one(doc! { "group": "a", "n": n })
                .await
                .unwrap();
        }
        collection.insert_one(doc! { "group": "b" }).await.unwrap();

        let found = collection.find(doc! { "group": "a" }).await.unwrap();
        let order: Vec<i32> = found.iter().map(|d| d.get_i32("n").unwrap()).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_replace_keeps_id() {
        let collection = InMemoryCollection::new();
        let id = collection.insert_one(doc! { "v": 1 }).await.unwrap();

        let matched = collection
            .replace_one(doc! { "_id": id }, doc! { "v": 2 })
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let found = collection.find_one(doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(found.get_i32("v").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_zero_matches() {
        let collection = InMemoryCollection::new();
        let missing = ObjectId::new();

        let updated = collection
            .update_one(doc! { "_id": missing }, doc! { "$set": { "v": 1 } })
            .await
            .unwrap();
        let deleted = collection.delete_one(doc! { "_id": missing }).await.unwrap();

        assert_eq!(updated, 0);
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_update_requires_set() {
        let collection = InMemoryCollection::new();
        let id = collection.insert_one(doc! { "v": 1 }).await.unwrap();

        let result = collection
            .update_one(doc! { "_id": id }, doc! { "$inc": { "v": 1 } })
            .await;
        assert!(result.is_err());
    }
}
