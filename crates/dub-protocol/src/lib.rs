//! Wire/domain data model shared between `dub-core` and `dub-server`:
//! plain data, no behavior. The code that acts on it lives in the other
//! two crates.

mod chunk;
mod engine_spec;
mod ids;
mod job_view;
mod quality;
mod settings;
mod stage;
mod synth;
mod transcript;

pub use chunk::TranslationChunk;
pub use engine_spec::{Capability, EngineKind, EngineSpec, Locality};
pub use ids::JobId;
pub use job_view::{JobView, LogEntry};
pub use quality::{QualityReport, Recommendation, TermPreservation};
pub use settings::{EngineChoice, JobSettings, SyncMode};
pub use stage::{JobStatus, PipelineStage};
pub use synth::SynthesizedSegment;
pub use transcript::{Segment, Transcript};
