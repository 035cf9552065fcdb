use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Boxed error returned by stage implementations.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transform,
    Validate,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Validate => "validate",
            Stage::Load => "load",
        })
    }
}

/// Errors that can occur while running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ETLError {
    #[error("extraction failed: {0}")]
    Extraction(#[source] BoxError),

    #[error("transformation failed: {0}")]
    Transformation(#[source] BoxError),

    #[error("failed to load data: loader rejected {records} record(s)")]
    LoadRejected { records: usize },

    #[error("load failed: {0}")]
    Load(#[source] BoxError),

    /// A constraint predicate errored. Never fatal: the validator turns it
    /// into a reason string on the offending record.
    #[error("error validating {field}: {source}")]
    ValidationRule {
        field: String,
        #[source]
        source: BoxError,
    },

    /// A stage implementation panicked. The panic is caught at the stage
    /// boundary and fails only the current run.
    #[error("{stage} stage panicked: {message}")]
    Panicked { stage: Stage, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ETLError {
    /// The stage this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ETLError::Extraction(_) => Some(Stage::Extract),
            ETLError::Transformation(_) => Some(Stage::Transform),
            ETLError::ValidationRule { .. } => Some(Stage::Validate),
            ETLError::Load(_) | ETLError::LoadRejected { .. } => Some(Stage::Load),
            ETLError::Panicked { stage, .. } => Some(*stage),
            ETLError::Configuration(_) => None,
        }
    }

    pub(crate) fn panicked(stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        ETLError::Panicked {
            stage,
            message: panic_message(payload.as_ref()),
        }
    }

    /// Renders the error and its whole source chain, one cause per line.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = self.source();
        let mut depth = 1;
        while let Some(cause) = source {
            rendered.push_str(&format!("\n  {depth}: {cause}"));
            source = cause.source();
            depth += 1;
        }
        rendered
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// One fatal error recorded against a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub stage: Option<Stage>,
    pub message: String,
    /// The full cause chain of the error.
    pub detail: Option<String>,
}

impl From<&ETLError> for ErrorEntry {
    fn from(err: &ETLError) -> Self {
        ErrorEntry {
            stage: err.stage(),
            message: err.to_string(),
            detail: Some(err.chain()),
        }
    }
}

/// Outcome of a single pipeline run.
///
/// Stage counts stay at zero for stages that did not run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub pipeline: String,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub records_extracted: usize,
    pub records_transformed: usize,
    pub records_validated: usize,
    pub records_invalid: usize,
    pub records_loaded: usize,
    pub errors: Vec<ErrorEntry>,
}

/// Lifetime counters of one pipeline instance. Never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub records_processed: u64,
    pub records_failed: u64,
}
