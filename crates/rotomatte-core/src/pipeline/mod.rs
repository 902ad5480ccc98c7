pub mod config;
mod orchestrator;
pub mod registry;
pub mod report;
mod transform;
mod types;

pub use config::{ExistingPolicy, PipelineConfig, StageDefinition, StageKind};
pub use orchestrator::{run_pipeline, Pipeline, PipelineBuilder};
pub use registry::StageRegistry;
pub use report::{
    ArtifactOutcome, ProducedFrame, RunReport, SkipReason, SkippedFrame, StageReport, StageStatus,
};
pub use types::{CancelToken, NoOpReporter, ProgressReporter};
