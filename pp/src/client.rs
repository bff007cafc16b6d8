//! HTTP client for the operator commands
//!
//! Talks to a running `pp serve` under the configured base URL.

use std::time::Duration;

use eyre::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::progress::{ColorValidation, ExportedImage, ProgressStatus};
use crate::relay::RoundSummary;
use crate::server::ConfigureResponse;

/// Default timeout for operator requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the operator endpoints
#[derive(Debug, Clone)]
pub struct PingPongClient {
    base_url: String,
    http: Client,
}

impl PingPongClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn configure(&self, m: u64, n: u64) -> Result<ConfigureResponse> {
        debug!(m, n, "PingPongClient::configure: called");
        self.post("configure/", &serde_json::json!({"m": m, "n": n})).await
    }

    pub async fn generate(&self) -> Result<RoundSummary> {
        debug!("PingPongClient::generate: called");
        self.post("generate/", &serde_json::json!({})).await
    }

    pub async fn status(&self) -> Result<ProgressStatus> {
        debug!("PingPongClient::status: called");
        self.get("status/").await
    }

    pub async fn image(&self) -> Result<ExportedImage> {
        debug!("PingPongClient::image: called");
        self.get("ui/").await
    }

    pub async fn validate(&self) -> Result<ColorValidation> {
        debug!("PingPongClient::validate: called");
        self.get("validate/").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context(format!("Failed to reach {}", url))?;
        Self::parse(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .context(format!("Failed to reach {}", url))?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("no error message")
                .to_string();
            return Err(eyre::eyre!("Server returned {}: {}", status, message));
        }
        response.json::<T>().await.context("Failed to parse response")
    }
}
