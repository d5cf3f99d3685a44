//! HTTP server module.
//!
//! Serves the page over plain HTTP; TLS is left to a reverse proxy. The server
//! drains connections gracefully on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
