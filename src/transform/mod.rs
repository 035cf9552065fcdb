//! Column-level cleaning of record batches.

mod config;
mod standard;

pub use config::{TransformerConfig, TransformerConfigBuilder, TransformerConfigBuilderError};
pub use standard::{StandardTransformer, TRANSFORMED_AT_FIELD};
