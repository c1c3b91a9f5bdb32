pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod summary;

pub use config::{PipelineConfig, RunConfig};
pub use orchestrator::{Orchestrator, RunOptions};
pub use summary::{DocumentFailure, DocumentOutcome, DocumentState, RunSummary};
