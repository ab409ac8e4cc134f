pub mod context;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod gates;
pub mod orchestrator;
pub mod prompt;

pub use context::{ContextAssembler, NO_HISTORY};
pub use dedup::{DedupTracker, DEFAULT_TRACKER_CAPACITY};
pub use dispatch::SummarizeDispatcher;
pub use error::{PipelineError, Result};
pub use gates::{GateDecision, Gates, SkipReason, UserGate};
pub use orchestrator::{Orchestrator, Outcome};
pub use prompt::{PromptCompositor, DEFAULT_TEMPLATE};
