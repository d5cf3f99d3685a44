//! Shared application state for request handlers.

use std::sync::Arc;
use tera::Tera;

use crate::config::AppConfig;
use crate::controller::PageController;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// There is one page controller per process, so every browser looking at the
/// page sees the same check.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tera: Arc<Tera>,
    pub page: Arc<PageController>,
}

impl AppState {
    pub fn new(config: AppConfig, tera: Tera, page: PageController) -> Self {
        Self {
            config: Arc::new(config),
            tera: Arc::new(tera),
            page: Arc::new(page),
        }
    }
}
