//! PeerLink - delivery of a fill request to the opposite peer

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::RelayError;
use super::messages::{FillRequest, Peer};

/// Hands a request to a peer endpoint
///
/// Completes once the peer has accepted the request, not when the peer's
/// own round finishes.
#[async_trait]
pub trait PeerLink: Send + Sync {
    async fn forward(&self, to: Peer, request: &FillRequest) -> Result<(), RelayError>;
}

/// Peers reached over HTTP at `{base_url}/ping/` and `{base_url}/pong/`
#[derive(Debug, Clone)]
pub struct HttpPeer {
    base_url: String,
    http: Client,
}

impl HttpPeer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, ?timeout, "HttpPeer::new: called");
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Configuration(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    fn url_for(&self, peer: Peer) -> String {
        format!("{}/{}/", self.base_url, peer.path())
    }
}

#[async_trait]
impl PeerLink for HttpPeer {
    async fn forward(&self, to: Peer, request: &FillRequest) -> Result<(), RelayError> {
        let url = self.url_for(to);
        debug!(%url, m = request.m, n = request.n, "HttpPeer::forward: called");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::RelayTimeout {
                peer: to,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::RelayTimeout {
                peer: to,
                message: format!("HTTP {}: {}", status, body),
            });
        }
        debug!(%url, "HttpPeer::forward: accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_urls() {
        let link = HttpPeer::new("http://localhost:8000/api/", Duration::from_secs(30)).unwrap();
        assert_eq!(link.url_for(Peer::Ping), "http://localhost:8000/api/ping/");
        assert_eq!(link.url_for(Peer::Pong), "http://localhost:8000/api/pong/");
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_relay_failure() {
        let link = HttpPeer::new("http://127.0.0.1:9/api", Duration::from_millis(200)).unwrap();
        let request = FillRequest {
            m: 2,
            n: 2,
            run_id: None,
            fill: None,
        };
        let err = link.forward(Peer::Pong, &request).await.unwrap_err();
        assert!(matches!(err, RelayError::RelayTimeout { peer: Peer::Pong, .. }));
    }
}
