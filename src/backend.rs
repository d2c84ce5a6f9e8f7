//! Backend client for uploading exported rows.
//!
//! The configuration is always available so it can live in the config file;
//! the HTTP client itself is behind the `backend` feature.

use serde::{Deserialize, Serialize};

/// Backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.example.com`
    pub base_url: String,
    /// Bearer authentication token
    pub token: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the upload endpoint URL.
    pub fn upload_url(&self) -> String {
        format!("{}/v1/health-sync", self.base())
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base())
    }
}

/// Identifier for this client installation: hostname plus a random suffix.
pub fn generate_device_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!(
        "health-sync-{}-{}",
        hostname,
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    )
}

/// Backend client error types.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend config error: {0}")]
    Config(String),

    #[error("Backend network error: {0}")]
    Network(String),

    #[error("Backend server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Backend serialization error: {0}")]
    Serialization(String),
}

/// Upload body sent to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPayload<'a> {
    pub device_id: &'a str,
    pub source: &'static str,
    pub version: &'static str,
    #[serde(flatten)]
    pub batch: &'a crate::export::ExportBatch,
}

/// Backend acknowledgement of an upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub health_data_inserted: usize,
    #[serde(default)]
    pub activities_inserted: usize,
}

/// HTTP client posting exported rows to the backend.
#[cfg(feature = "backend")]
pub struct BackendClient {
    config: BackendConfig,
    client: reqwest::Client,
    device_id: String,
}

#[cfg(feature = "backend")]
impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if config.base_url.trim().is_empty() {
            return Err(BackendError::Config("base_url is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            device_id: generate_device_id(),
        })
    }

    /// Test connection to the backend.
    pub async fn test_connection(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Upload one batch of rows.
    pub async fn upload(
        &self,
        batch: &crate::export::ExportBatch,
    ) -> Result<UploadResponse, BackendError> {
        if batch.is_empty() {
            return Ok(UploadResponse::default());
        }

        let payload = UploadPayload {
            device_id: &self.device_id,
            source: "health-sync",
            version: env!("CARGO_PKG_VERSION"),
            batch,
        };

        let response = self
            .client
            .post(self.config.upload_url())
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportBatch;

    #[test]
    fn test_backend_urls() {
        let config = BackendConfig::new("https://api.example.com/", "test-token");
        assert_eq!(config.upload_url(), "https://api.example.com/v1/health-sync");
        assert_eq!(config.health_url(), "https://api.example.com/health");
    }

    #[test]
    fn test_timeout_defaults_when_missing() {
        let config: BackendConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8080", "token": "t"}"#).unwrap();
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_device_id_shape() {
        let id = generate_device_id();
        assert!(id.starts_with("health-sync-"));
        assert_ne!(id, generate_device_id());
    }

    #[test]
    fn test_payload_flattens_batch() {
        let batch = ExportBatch::default();
        let payload = UploadPayload {
            device_id: "dev",
            source: "health-sync",
            version: "0.1.0",
            batch: &batch,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["health_data"].is_array());
        assert!(json["activities"].is_array());
        assert_eq!(json["device_id"], "dev");
    }

    #[cfg(feature = "backend")]
    #[test]
    fn test_client_rejects_empty_url() {
        assert!(BackendClient::new(BackendConfig::new(" ", "t")).is_err());
    }

    #[cfg(feature = "backend")]
    #[test]
    fn test_client_device_id() {
        let client = BackendClient::new(BackendConfig::new("http://localhost:8080", "t")).unwrap();
        assert!(client.device_id().starts_with("health-sync-"));
    }

    #[cfg(feature = "backend")]
    #[tokio::test]
    async fn test_connection_unreachable_is_network_error() {
        // Nothing listens on the discard port.
        let mut config = BackendConfig::new("http://127.0.0.1:9", "t");
        config.timeout_secs = 2;
        let client = BackendClient::new(config).unwrap();

        assert!(matches!(
            client.test_connection().await,
            Err(BackendError::Network(_))
        ));
    }
}
