use std::sync::Arc;
use tokio_util::task::TaskTracker;

use mailrecap_persist::EmailLogStore;
use mailrecap_pipeline::Orchestrator;

use crate::config::Config;

/// Shared application state passed to all handlers.
///
/// The orchestrator is built once at startup; `events` tracks the per-event
/// tasks spawned by the notification route so shutdown can drain them.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<Orchestrator>,
    pub logs: Arc<dyn EmailLogStore>,
    pub events: TaskTracker,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Orchestrator,
        logs: Arc<dyn EmailLogStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            logs,
            events: TaskTracker::new(),
        }
    }
}
