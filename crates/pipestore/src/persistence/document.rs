//! Mapping between StoredObject and the native BSON document

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::ObjectKey;
use super::store::StoreError;
use crate::model::StoredObject;

/// Document field holding the store-assigned id
pub const ID_FIELD: &str = "_id";
/// Document field holding the correlation UUID
pub const UUID_FIELD: &str = "uuid";
/// Document field holding the owning application service key
pub const APP_SERVICE_KEY_FIELD: &str = "appServiceKey";
/// Document field holding the retry count
pub const RETRY_COUNT_FIELD: &str = "retryCount";

/// On-disk shape of a StoredObject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    object_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
    app_service_key: String,
    #[serde(default = "empty_payload")]
    payload: Binary,
    #[serde(default)]
    retry_count: u32,
    #[serde(default)]
    pipeline_position: i32,
    #[serde(default)]
    version: String,
    #[serde(default, rename = "correlationID")]
    correlation_id: String,
    #[serde(default, rename = "eventID")]
    event_id: String,
    #[serde(default)]
    event_checksum: String,
}

fn empty_payload() -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes: Vec::new(),
    }
}

/// Build the document for `object` identified by `key`
///
/// `_id` is omitted for unassigned keys so the store generates one, and
/// written verbatim otherwise. `object.id` is ignored in favor of `key`.
pub fn to_document(key: &ObjectKey, object: &StoredObject) -> Result<Document, StoreError> {
    let model = StoredDocument {
        object_id: key.object_id(),
        uuid: key.uuid().map(|uuid| uuid.to_string()),
        app_service_key: object.app_service_key.clone(),
        payload: Binary {
            subtype: BinarySubtype::Generic,
            bytes: object.payload.clone(),
        },
        retry_count: object.retry_count,
        pipeline_position: object.pipeline_position,
        version: object.version.clone(),
        correlation_id: object.correlation_id.clone(),
        event_id: object.event_id.clone(),
        event_checksum: object.event_checksum.clone(),
    };

    bson::to_document(&model).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Rebuild a StoredObject from a stored document
///
/// The composite `id` is re-encoded from the document's `_id` and `uuid`.
pub fn from_document(document: Document) -> Result<StoredObject, StoreError> {
    let model: StoredDocument =
        bson::from_document(document).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let object_id = model
        .object_id
        .ok_or_else(|| StoreError::Serialization("document has no _id".to_string()))?;
    let uuid = model
        .uuid
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| StoreError::Serialization(format!("document uuid: {}", e)))?;

    Ok(StoredObject {
        id: ObjectKey::from_parts(object_id, uuid).encode(),
        app_service_key: model.app_service_key,
        payload: model.payload.bytes,
        retry_count: model.retry_count,
        pipeline_position: model.pipeline_position,
        version: model.version,
        correlation_id: model.correlation_id,
        event_id: model.event_id,
        event_checksum: model.event_checksum,
    })
}
