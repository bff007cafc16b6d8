//! ProgressAuthority - where peers read the cursor and report deltas
//!
//! The authority may live in the same process (the ProgressStore actor) or
//! behind HTTP, as in a split deployment. Peers only see this trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::progress::{ExportedImage, ProgressError, ProgressStatus, ProgressStore, ReportOutcome};
use crate::strategy::{ProgressReport, ReportedPixel};

use super::error::RelayError;

/// Read and update access to the authoritative progress
#[async_trait]
pub trait ProgressAuthority: Send + Sync {
    /// Snapshot of the current run
    async fn status(&self) -> Result<ProgressStatus, RelayError>;

    /// Apply a delta produced by a strategy
    async fn report(&self, report: ProgressReport) -> Result<ReportOutcome, RelayError>;

    /// Every pixel recorded so far
    async fn export_image(&self) -> Result<ExportedImage, RelayError>;
}

fn status_error(e: ProgressError) -> RelayError {
    match e {
        ProgressError::NotConfigured => RelayError::Configuration(e.to_string()),
        other => RelayError::Authority(other.to_string()),
    }
}

#[async_trait]
impl ProgressAuthority for ProgressStore {
    async fn status(&self) -> Result<ProgressStatus, RelayError> {
        ProgressStore::status(self).await.map_err(status_error)
    }

    async fn report(&self, report: ProgressReport) -> Result<ReportOutcome, RelayError> {
        let result = match report {
            ProgressReport::Pixel {
                pixel: ReportedPixel { x, y, color },
            } => self.report_pixel(x, y, color).await,
            ProgressReport::Range { start_index, end_index } => self.report_range(start_index, end_index).await,
        };
        result.map_err(|e| RelayError::ProgressReport(e.to_string()))
    }

    async fn export_image(&self) -> Result<ExportedImage, RelayError> {
        ProgressStore::export_image(self).await.map_err(status_error)
    }
}

/// Authority reached over HTTP at `{base_url}/status/...`
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    base_url: String,
    http: Client,
}

impl HttpAuthority {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, ?timeout, "HttpAuthority::new: called");
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Authority(e.to_string()))?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl ProgressAuthority for HttpAuthority {
    async fn status(&self) -> Result<ProgressStatus, RelayError> {
        let url = format!("{}/status/", self.base_url);
        debug!(%url, "HttpAuthority::status: called");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::Authority(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<ProgressStatus>()
                .await
                .map_err(|e| RelayError::Authority(format!("Invalid status body: {}", e))),
            StatusCode::CONFLICT => Err(RelayError::Configuration(ProgressError::NotConfigured.to_string())),
            s => Err(RelayError::Authority(format!("HTTP {}", s))),
        }
    }

    async fn report(&self, report: ProgressReport) -> Result<ReportOutcome, RelayError> {
        let url = format!("{}/status/update_pixel/", self.base_url);
        debug!(%url, ?report, "HttpAuthority::report: called");
        let response = self
            .http
            .post(&url)
            .json(&report)
            .send()
            .await
            .map_err(|e| RelayError::ProgressReport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::ProgressReport(format!("HTTP {}", response.status())));
        }
        response
            .json::<ReportOutcome>()
            .await
            .map_err(|e| RelayError::ProgressReport(format!("Invalid report body: {}", e)))
    }

    async fn export_image(&self) -> Result<ExportedImage, RelayError> {
        let url = format!("{}/ui/", self.base_url);
        debug!(%url, "HttpAuthority::export_image: called");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::Authority(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<ExportedImage>()
                .await
                .map_err(|e| RelayError::Authority(format!("Invalid image body: {}", e))),
            StatusCode::CONFLICT => Err(RelayError::Configuration(ProgressError::NotConfigured.to_string())),
            s => Err(RelayError::Authority(format!("HTTP {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Pixel, Rgb};

    #[tokio::test]
    async fn test_local_authority_requires_configure() {
        let store = ProgressStore::spawn();
        let err = ProgressAuthority::status(&store).await.unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_local_authority_routes_reports() {
        let store = ProgressStore::spawn();
        store.configure(200, 100).await.unwrap();

        let outcome = ProgressAuthority::report(
            &store,
            ProgressReport::Range {
                start_index: 0,
                end_index: 150,
            },
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ReportOutcome::RangeUpdated { pixels_updated: 150, .. }));

        let status = ProgressAuthority::status(&store).await.unwrap();
        assert_eq!(status.cursor_index(), Some(150));
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_local_authority_report_errors_are_report_errors() {
        let store = ProgressStore::spawn();
        store.configure(2, 2).await.unwrap();
        let err = ProgressAuthority::report(
            &store,
            ProgressReport::Range {
                start_index: 0,
                end_index: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RelayError::ProgressReport(_)));
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_local_authority_exports_image() {
        let store = ProgressStore::spawn();
        store.configure(2, 2).await.unwrap();
        store.report_pixel(1, 0, Some(Rgb::new(5, 6, 7))).await.unwrap();

        let exported = ProgressAuthority::export_image(&store).await.unwrap();
        let expected = Pixel {
            x: 1,
            y: 0,
            color: Rgb::new(5, 6, 7),
        };
        assert_eq!(exported.image, vec![expected]);
        store.shutdown().await.unwrap();
    }

    #[test]
    fn test_http_authority_trims_trailing_slash() {
        let authority = HttpAuthority::new("http://localhost:8000/api/", Duration::from_secs(2)).unwrap();
        assert_eq!(authority.base_url, "http://localhost:8000/api");
    }

    #[tokio::test]
    async fn test_http_authority_unreachable() {
        let authority = HttpAuthority::new("http://127.0.0.1:9/api", Duration::from_millis(200)).unwrap();
        let err = authority.status().await.unwrap_err();
        assert!(matches!(err, RelayError::Authority(_)));
    }
}
