//! Pipeline orchestration: stage traits, the run loop, results and stats.

pub mod config;
pub mod memory;
pub mod observer;
pub mod pipeline;
pub mod processor;
pub mod types;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use memory::{MemoryExtractor, MemoryLoader};
pub use observer::{NoopObserver, PipelineEvent, PipelineObserver, TracingObserver};
pub use pipeline::ETLPipeline;
pub use processor::{Extractor, Loader, Transformer};
pub use types::{BoxError, ETLError, ErrorEntry, PipelineStats, RunResult, Stage};
