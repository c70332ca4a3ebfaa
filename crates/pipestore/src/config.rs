// Database configuration
//
// Loaded from environment variables or deserialized from a config file.
// Consumed by the bootstrapper; the store never reloads it.

use std::env;
use std::time::Duration;

use mongodb::options::Credential;
use serde::{Deserialize, Serialize};

use crate::persistence::StoreError;

/// Connection settings for the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    pub host: String,

    pub port: u16,

    /// Empty together with `password` for an unauthenticated connection
    pub username: String,

    pub password: String,

    pub database_name: String,

    /// Bootstrap deadline and per-call timeout, in milliseconds
    pub timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            username: String::new(),
            password: String::new(),
            database_name: "application-service".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for an unauthenticated server
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `PIPESTORE_DB_HOST`: server host (default: localhost)
    /// - `PIPESTORE_DB_PORT`: server port (default: 27017)
    /// - `PIPESTORE_DB_USERNAME` / `PIPESTORE_DB_PASSWORD`: credentials (default: none)
    /// - `PIPESTORE_DB_NAME`: database name (default: application-service)
    /// - `PIPESTORE_DB_TIMEOUT_MS`: timeout in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("PIPESTORE_DB_HOST").unwrap_or(defaults.host);

        let port = env::var("PIPESTORE_DB_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let username = env::var("PIPESTORE_DB_USERNAME").unwrap_or_default();
        let password = env::var("PIPESTORE_DB_PASSWORD").unwrap_or_default();

        let database_name = env::var("PIPESTORE_DB_NAME").unwrap_or(defaults.database_name);

        let timeout_ms = env::var("PIPESTORE_DB_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_ms);

        Self {
            host,
            port,
            username,
            password,
            database_name,
            timeout_ms,
        }
    }

    /// Set credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set database name
    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// Build the connection URI
    ///
    /// The URI carries host and port only. Credentials travel separately
    /// through [`credential`](Self::credential) and must be supplied
    /// together or not at all.
    pub fn connection_uri(&self) -> Result<String, StoreError> {
        self.credential()?;
        Ok(format!("mongodb://{}:{}", self.host, self.port))
    }

    /// Driver credential, `None` for an unauthenticated connection
    pub fn credential(&self) -> Result<Option<Credential>, StoreError> {
        match (self.username.is_empty(), self.password.is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some(
                Credential::builder()
                    .username(self.username.clone())
                    .password(self.password.clone())
                    .build(),
            )),
            _ => Err(StoreError::Configuration(
                "username and password must be set together".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_uri() {
        let config = DatabaseConfig::new("db.local", 27018);
        assert!(!config.is_authenticated());
        assert_eq!(config.connection_uri().unwrap(), "mongodb://db.local:27018");
    }

    #[test]
    fn test_credentials_stay_out_of_uri() {
        let config = DatabaseConfig::new("db.local", 27017).with_credentials("app", "p@ss:w/rd");
        assert!(config.is_authenticated());
        assert_eq!(config.connection_uri().unwrap(), "mongodb://db.local:27017");

        let credential = config.credential().unwrap().unwrap();
        assert_eq!(credential.username.as_deref(), Some("app"));
        assert_eq!(credential.password.as_deref(), Some("p@ss:w/rd"));
    }

    #[test]
    fn test_unauthenticated_has_no_credential() {
        let config = DatabaseConfig::new("db.local", 27017);
        assert!(config.credential().unwrap().is_none());
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let config = DatabaseConfig::new("db.local", 27017).with_credentials("app", "");
        assert!(matches!(
            config.connection_uri(),
            Err(StoreError::Configuration(_))
        ));

        let config = DatabaseConfig::new("db.local", 27017).with_credentials("", "secret");
        assert!(config.connection_uri().is_err());
        assert!(config.credential().is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = DatabaseConfig::default().with_timeout(Duration::from_millis(1500));
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"host":"mongo","databaseName":"svc","timeoutMs":250}"#)
                .unwrap();

        assert_eq!(config.host, "mongo");
        assert_eq!(config.port, 27017);
        assert_eq!(config.database_name, "svc");
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_env() {
        env::set_var("PIPESTORE_DB_HOST", "mongo.internal");
        env::set_var("PIPESTORE_DB_PORT", "27999");
        env::set_var("PIPESTORE_DB_TIMEOUT_MS", "not-a-number");

        let config = DatabaseConfig::from_env();
        assert_eq!(config.host, "mongo.internal");
        assert_eq!(config.port, 27999);
        assert_eq!(config.timeout_ms, 5000);

        env::remove_var("PIPESTORE_DB_HOST");
        env::remove_var("PIPESTORE_DB_PORT");
        env::remove_var("PIPESTORE_DB_TIMEOUT_MS");
    }
}
