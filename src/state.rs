use crate::registry::Registry;
use crate::services::LinkService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction.
#[derive(Clone)]
pub struct AppState {
    /// Orchestration of create/redirect/statistics use cases
    pub links: LinkService,

    /// Registry handle, used directly only by the health endpoint
    pub registry: Arc<dyn Registry>,

    /// Maximum number of entries accepted in one batch creation request
    pub max_batch_size: usize,

    /// Process start time, reported by the health endpoint
    pub started_at: DateTime<Utc>,
}
