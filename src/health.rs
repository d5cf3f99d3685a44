//! Wire model of the backend's `/api/healthz` answer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two values a backend is expected to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Success,
    Fail,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Success => write!(f, "success"),
            HealthStatus::Fail => write!(f, "fail"),
        }
    }
}

/// `{"healthz": "success" | "fail"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthz: HealthStatus,
}

impl HealthResponse {
    /// The value shown for every failed check, whatever the cause.
    pub fn fail() -> Self {
        Self {
            healthz: HealthStatus::Fail,
        }
    }

    /// Compact JSON text, as displayed on the page.
    pub fn to_json(&self) -> String {
        // Two-variant enum inside a plain struct; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Read the reported status out of an arbitrary JSON body.
    ///
    /// Returns `None` when the body does not have the expected shape.
    pub fn status_of(body: &serde_json::Value) -> Option<HealthStatus> {
        serde_json::from_value::<HealthResponse>(body.clone())
            .ok()
            .map(|response| response.healthz)
    }
}
