//! Orchestration layer: the per-keyword research pipeline and the batch
//! processor that drains task groups through a bounded worker pool.

mod batch;
mod pipeline;

pub use batch::{BatchProcessor, BatchProgress, SilentBatchProgress};
pub use pipeline::{
    PipelineOptions, ProgressReporter, SilentProgress, research_keyword,
};
