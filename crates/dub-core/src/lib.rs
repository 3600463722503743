pub mod audio;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod job;
pub mod json_repair;
pub mod pipeline;
pub mod resource_gate;
pub mod subprocess;
pub mod translate;

pub use config::Config;
pub use dub_common::{DubError, FailureKind, Result};
pub use engine::{Dispatcher, EngineCatalog, Evaluator as EvaluatorTrait, SynthesizeEngine, TranslateEngine, Transcriber};
pub use job::{Job, JobManager};
pub use pipeline::{EngineRegistry, Orchestrator, OrchestratorConfig};
pub use resource_gate::{CleanupHook, ResourceGate, ResourceGateGuard};
