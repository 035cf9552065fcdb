//! # etl-pipeline
//!
//! Sequential Extract-Transform-Validate-Load orchestration built on Tokio.
//!
//! ## Features
//!
//! - **Pluggable stages** through async traits, or plain async closures
//! - **Rule-based validation** splitting each batch into valid and invalid records
//! - **Per-run results** with stage counts, timings and captured errors
//! - **Lifetime statistics** accumulated across runs of one pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use etl_pipeline::etl::{ETLPipeline, MemoryExtractor, MemoryLoader};
//! use etl_pipeline::record::{batch_from_json, ValueType};
//! use etl_pipeline::validate::DataValidator;
//! use serde_json::json;
//!
//! let extractor = MemoryExtractor::new(batch_from_json(json!([
//!     {"id": 1, "name": "a"},
//!     {"name": "b"},
//! ])));
//! let loader = MemoryLoader::new();
//!
//! let pipeline = ETLPipeline::new(extractor)
//!     .with_validator(DataValidator::new().require("id").expect_type("id", [ValueType::Int]))
//!     .with_loader(loader.clone());
//!
//! let result = pipeline.run().await;
//! assert!(result.success);
//! assert_eq!(result.records_loaded, 1);
//! ```
//!
//! ## Modules
//!
//! - [`etl`] - Stage traits, the pipeline run loop, results and stats
//! - [`record`] - Dynamically typed records and batches
//! - [`transform`] - Standard column clean-up transformer
//! - [`validate`] - Record validation rules
//! - [`logging`] - Subscriber setup for the crate's `tracing` output

pub mod etl;
pub mod logging;
pub mod record;
pub mod transform;
pub mod validate;

pub use etl::{ETLError, ETLPipeline, PipelineStats, RunResult};
pub use record::{Batch, Record, Value, ValueType};
