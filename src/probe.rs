//! Outbound health-check request.
//!
//! `HealthProbe` is the seam between the page controller and the network so the
//! controller can be driven by a scripted probe in tests. `HttpProbe` is the real
//! implementation: one plain `GET` with no custom headers, no timeout and no retry.

use std::fmt;

use async_trait::async_trait;
use tracing::instrument;

/// Why a check produced no usable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request could not be sent, or the body could not be read
    Network,
    /// Body arrived but is not JSON
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network"),
            FailureKind::Decode => write!(f, "decode"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("health request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("health response is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CheckError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::Network(_) => FailureKind::Network,
            CheckError::Decode(_) => FailureKind::Decode,
        }
    }
}

/// Performs one health request against `url` and returns the parsed JSON body.
///
/// The body is not checked against the expected `{"healthz": ...}` shape, and the
/// HTTP status is not inspected: any response whose body parses as JSON is `Ok`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<serde_json::Value, CheckError>;
}

/// `HealthProbe` backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    #[instrument(name = "probe::fetch", skip(self))]
    async fn fetch(&self, url: &str) -> Result<serde_json::Value, CheckError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CheckError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Backend answered with non-success status");
        }

        let bytes = response.bytes().await.map_err(CheckError::Network)?;
        let body = serde_json::from_slice(&bytes).map_err(CheckError::Decode)?;

        tracing::debug!(status = status.as_u16(), "Backend health body received");
        Ok(body)
    }
}
