use std::sync::Arc;

use crate::llm_client::CompletionService;
use crate::profile::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    /// `None` when no API key is configured; every stage then uses its fallback.
    pub llm: Option<Arc<dyn CompletionService>>,
}
