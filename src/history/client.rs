use crate::history::query::HistoryQuery;
use crate::history::records::{AlertHistoryRecord, TelemetryRecord};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// History backend configuration
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Failure of a history request. The query is never consumed, so the caller
/// can run it again.
#[derive(Debug)]
pub enum HistoryError {
    /// Server answered with a non-2xx status
    Status { endpoint: &'static str, status: u16 },
    /// Request never completed (connect, timeout, body read)
    Transport(reqwest::Error),
    /// Body was not the expected JSON
    Decode(serde_json::Error),
}

impl HistoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, HistoryError::Status { .. } | HistoryError::Transport(_))
    }
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Status { endpoint, status } => {
                write!(f, "HTTP {} from {}", status, endpoint)
            }
            HistoryError::Transport(e) => write!(f, "History request failed: {}", e),
            HistoryError::Decode(e) => write!(f, "Invalid history response: {}", e),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::Status { .. } => None,
            HistoryError::Transport(e) => Some(e),
            HistoryError::Decode(e) => Some(e),
        }
    }
}

const TELEMETRY_ENDPOINT: &str = "/telemetry/";
const ALERTS_ENDPOINT: &str = "/alerts/";

/// Read-only client for recorded telemetry and alerts
#[derive(Clone, Debug)]
pub struct HistoryClient {
    http_client: Client,
    base_url: String,
}

impl HistoryClient {
    pub fn new(config: &HistoryConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("firewatch/0.1")
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for a custom base URL with default settings (mock servers in tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&HistoryConfig {
            base_url: base_url.into(),
            ..HistoryConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_telemetry(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<TelemetryRecord>, HistoryError> {
        self.fetch(TELEMETRY_ENDPOINT, query).await
    }

    pub async fn fetch_alerts(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<AlertHistoryRecord>, HistoryError> {
        self.fetch(ALERTS_ENDPOINT, query).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &HistoryQuery,
    ) -> Result<Vec<T>, HistoryError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, query = ?query, "Fetching history");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(HistoryError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "History request rejected");
            return Err(HistoryError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(HistoryError::Transport)?;
        let rows: Vec<T> = serde_json::from_slice(&body).map_err(HistoryError::Decode)?;
        debug!(endpoint, rows = rows.len(), "History fetched");
        Ok(rows)
    }
}
