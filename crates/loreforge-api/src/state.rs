//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use loreforge_core::repository::WorldStateRepository;
use loreforge_narrative::application::pipeline::TurnPipeline;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The turn pipeline.
    pub pipeline: Arc<TurnPipeline>,
    /// World states, read by the world view.
    pub worlds: Arc<dyn WorldStateRepository>,
    /// A turn running longer than this is cancelled.
    pub turn_timeout: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        pipeline: Arc<TurnPipeline>,
        worlds: Arc<dyn WorldStateRepository>,
        turn_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            worlds,
            turn_timeout,
        }
    }
}
