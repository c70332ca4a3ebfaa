//! StoredObject, the unit of work persisted between delivery attempts

use serde::{Deserialize, Serialize};

/// A pipeline item awaiting a delivery retry
///
/// `id` is the composite identifier produced by
/// [`ObjectKey`](crate::persistence::ObjectKey). It is empty until the item
/// has been stored for the first time, or holds a bare correlation UUID when
/// the caller wants duplicate submissions rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Composite identifier (empty before first insert)
    #[serde(default)]
    pub id: String,

    /// Namespace tag of the owning application service
    pub app_service_key: String,

    /// Work item body, never interpreted by the store
    #[serde(default)]
    pub payload: Vec<u8>,

    /// Number of delivery attempts made so far
    #[serde(default)]
    pub retry_count: u32,

    /// Resume point within a multi-stage pipeline
    #[serde(default)]
    pub pipeline_position: i32,

    /// Format version of `payload`
    #[serde(default)]
    pub version: String,

    #[serde(default, rename = "correlationID")]
    pub correlation_id: String,

    #[serde(default, rename = "eventID")]
    pub event_id: String,

    #[serde(default)]
    pub event_checksum: String,
}

impl StoredObject {
    /// Create a new, not yet persisted object
    pub fn new(app_service_key: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            app_service_key: app_service_key.into(),
            payload: payload.into(),
            ..Default::default()
        }
    }

    /// Set the composite identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the retry count
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the pipeline position to resume from
    pub fn with_pipeline_position(mut self, position: i32) -> Self {
        self.pipeline_position = position;
        self
    }

    /// Set the payload format version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the correlation id used for tracing
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Set the originating event id
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Set the originating event checksum
    pub fn with_event_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.event_checksum = checksum.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_leaves_id_empty() {
        let obj = StoredObject::new("svcA", vec![1, 2])
            .with_retry_count(2)
            .with_pipeline_position(4)
            .with_version("v2");

        assert!(obj.id.is_empty());
        assert_eq!(obj.app_service_key, "svcA");
        assert_eq!(obj.payload, vec![1, 2]);
        assert_eq!(obj.retry_count, 2);
        assert_eq!(obj.pipeline_position, 4);
        assert_eq!(obj.version, "v2");
    }

    #[test]
    fn test_json_field_names() {
        let obj = StoredObject::new("svcA", vec![7]).with_correlation_id("corr-1");
        let json = serde_json::to_value(&obj).unwrap();

        assert_eq!(json["appServiceKey"], "svcA");
        assert_eq!(json["correlationID"], "corr-1");
        assert_eq!(json["retryCount"], 0);
    }

    #[test]
    fn test_json_missing_optional_fields() {
        let obj: StoredObject =
            serde_json::from_str(r#"{"appServiceKey":"svcA","payload":[1,2,3]}"#).unwrap();

        assert_eq!(obj.payload, vec![1, 2, 3]);
        assert!(obj.event_id.is_empty());
        assert_eq!(obj.retry_count, 0);
    }
}
