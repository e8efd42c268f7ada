//! Video clip generation: job polling, media extraction and run orchestration.

pub mod clip;
pub mod extract;
pub mod generator;
pub mod poller;

pub use clip::{ClipLibrary, ClipWriter, GeneratedClip};
pub use extract::extract_media;
pub use generator::{
    GenerationMode, OrchestrationRun, Orchestrator, ProgressEvent, RunStatus, UNIFIED_CLIP_ID,
};
pub use poller::{run_job, PollPolicy};
