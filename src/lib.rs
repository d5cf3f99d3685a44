//! healthz-console: a one-button page that checks a backend's health endpoint.
//!
//! The page controller derives `http://{BACK_BASE_URL}:{BACK_BASE_PORT}/api/healthz`
//! once at startup and, on each button press, issues one `GET` and shows the raw
//! JSON answer (or a synthetic `{"healthz":"fail"}` when the request fails).

pub mod config;
pub mod controller;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod probe;
pub mod routes;
pub mod state;
pub mod templates;

pub use controller::{CheckOutcome, PageController, PageState, PageView};
pub use error::AppError;
