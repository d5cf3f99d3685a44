//! Liveness endpoint for this process.
//!
//! Reports only that the page server can answer HTTP. It does not call the
//! backend; that is what the page's button is for.

/// Health check handler.
pub async fn health() -> &'static str {
    "ok"
}
