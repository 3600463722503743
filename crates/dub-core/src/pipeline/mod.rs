pub mod orchestrator;
pub mod registry;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use registry::EngineRegistry;
