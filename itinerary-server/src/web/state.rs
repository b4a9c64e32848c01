//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedProvider;
use crate::provider::Source;
use crate::replan::ReplanConfig;

/// Shared application state.
///
/// Holds the timetable provider and replanning settings. Itineraries are
/// not kept here; they travel in request and response bodies.
#[derive(Clone)]
pub struct AppState {
    /// Cached timetable provider
    pub provider: Arc<CachedProvider<Source>>,

    /// Replanning configuration
    pub replan: Arc<ReplanConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(provider: CachedProvider<Source>, replan: ReplanConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            replan: Arc::new(replan),
        }
    }
}
