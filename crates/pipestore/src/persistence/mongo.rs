//! MongoDB implementation of DocumentCollection
//!
//! Production persistence against the `store` collection with:
//! - Deadline-bounded connect + ping bootstrap
//! - Driver errors mapped to [`StoreError::Unavailable`], except duplicate
//!   `_id` inserts which become [`StoreError::DuplicateKey`]

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{debug, error, info, instrument, warn};

use super::client::DocumentStoreClient;
use super::collection::{DocumentCollection, STORE_COLLECTION};
use super::store::StoreError;
use crate::bootstrap;
use crate::config::DatabaseConfig;

/// Application name reported to the server
const APP_NAME: &str = "pipestore";

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB implementation of DocumentCollection
///
/// Cloning is cheap; clones share the driver's connection pool.
///
/// # Example
///
/// ```ignore
/// use pipestore::MongoCollection;
/// use mongodb::Client;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let collection = MongoCollection::new(client, "application-service");
/// ```
#[derive(Clone)]
pub struct MongoCollection {
    client: Client,
    collection: Collection<Document>,
}

impl MongoCollection {
    /// Bind to the `store` collection of `database_name`
    pub fn new(client: Client, database_name: &str) -> Self {
        let collection = client.database(database_name).collection(STORE_COLLECTION);
        Self { client, collection }
    }

    /// Get a reference to the driver client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a reference to the raw driver collection
    pub fn inner(&self) -> &Collection<Document> {
        &self.collection
    }
}

fn unavailable(action: &'static str) -> impl FnOnce(mongodb::error::Error) -> StoreError {
    move |e| {
        error!("Failed to {}: {}", action, e);
        StoreError::Unavailable(e.to_string())
    }
}

fn insert_failed(e: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(failure)) = e.kind.as_ref() {
        if failure.code == DUPLICATE_KEY_CODE {
            warn!("Duplicate key on insert: {}", failure.message);
            return StoreError::DuplicateKey(failure.message.clone());
        }
    }
    unavailable("insert document")(e)
}

/// Build driver options for `config`
///
/// Credentials are attached as a driver credential, not embedded in the URI,
/// so they need no escaping.
async fn client_options(config: &DatabaseConfig) -> Result<ClientOptions, StoreError> {
    let uri = config.connection_uri()?;
    let timeout = config.timeout();

    let mut options = ClientOptions::parse(&uri)
        .await
        .map_err(|e| StoreError::Configuration(e.to_string()))?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    options.credential = config.credential()?;

    Ok(options)
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    #[instrument(skip(self))]
    async fn find_one(&self, filter: Document) -> Result<Option<Document>, StoreError> {
        self.collection
            .find_one(filter)
            .await
            .map_err(unavailable("find document"))
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: Document) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection
            .find(filter)
            .await
            .map_err(unavailable("open cursor"))?;

        cursor
            .try_collect::<Vec<Document>>()
            .await
            .map_err(unavailable("iterate cursor"))
    }

    #[instrument(skip(self, document))]
    async fn insert_one(&self, document: Document) -> Result<ObjectId, StoreError> {
        let result = self
            .collection
            .insert_one(document)
            .await
            .map_err(insert_failed)?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Serialization(format!(
                "inserted _id is not an ObjectId: {}",
                result.inserted_id
            ))
        })
    }

    #[instrument(skip(self, replacement))]
    async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
    ) -> Result<u64, StoreError> {
        let result = self
            .collection
            .replace_one(filter, replacement)
            .await
            .map_err(unavailable("replace document"))?;

        Ok(result.matched_count)
    }

    #[instrument(skip(self))]
    async fn update_one(&self, filter: Document, update: Document) -> Result<u64, StoreError> {
        let result = self
            .collection
            .update_one(filter, update)
            .await
            .map_err(unavailable("update document"))?;

        Ok(result.matched_count)
    }

    #[instrument(skip(self))]
    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_one(filter)
            .await
            .map_err(unavailable("delete document"))?;

        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn shutdown(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

/// Store client backed by MongoDB
pub type MongoStoreClient = DocumentStoreClient<MongoCollection>;

impl DocumentStoreClient<MongoCollection> {
    /// Connect to MongoDB and verify the connection with a ping
    ///
    /// The whole handshake must finish within `config.timeout_ms`. If it
    /// does not, the handshake is cancelled and [`StoreError::Timeout`] is
    /// returned; a failure observed before the deadline is returned as is.
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let timeout = config.timeout();
        let connect_config = config.clone();
        let database_name = config.database_name.clone();

        let collection = bootstrap::connect_with_deadline(timeout, async move {
            let options = client_options(&connect_config).await?;
            let client = Client::with_options(options).map_err(unavailable("create client"))?;

            client
                .database(&database_name)
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(unavailable("ping database"))?;
            debug!("ping succeeded");

            Ok(MongoCollection::new(client, &database_name))
        })
        .await?;

        info!(database = %config.database_name, "connected to store");
        Ok(Self::new(collection, timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_options_keep_special_character_password() {
        let config = DatabaseConfig::new("db.local", 27017).with_credentials("app", "p@ss:w/rd");

        let options = client_options(&config).await.unwrap();

        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("app"));
        assert_eq!(credential.password.as_deref(), Some("p@ss:w/rd"));
        assert_eq!(options.app_name.as_deref(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn test_options_without_credentials() {
        let config = DatabaseConfig::new("db.local", 27017);

        let options = client_options(&config).await.unwrap();

        assert!(options.credential.is_none());
        assert_eq!(options.connect_timeout, Some(config.timeout()));
    }

    #[tokio::test]
    async fn test_options_reject_partial_credentials() {
        let config = DatabaseConfig::new("db.local", 27017).with_credentials("app", "");

        let result = client_options(&config).await;

        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }
}
