//! Structured run events and the observer port that receives them.

use tracing::{error, info, warn};

use super::types::{ETLError, Stage};

/// Something that happened during a run.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    RunStarted {
        pipeline: &'a str,
    },
    StageStarted {
        pipeline: &'a str,
        stage: Stage,
    },
    StageFinished {
        pipeline: &'a str,
        stage: Stage,
        records: usize,
    },
    /// The extractor returned an empty batch; the remaining stages are skipped.
    NothingExtracted {
        pipeline: &'a str,
    },
    InvalidRecords {
        pipeline: &'a str,
        count: usize,
    },
    RunCompleted {
        pipeline: &'a str,
        duration_secs: f64,
    },
    RunFailed {
        pipeline: &'a str,
        error: &'a ETLError,
    },
}

/// Receives every event of every run of the pipeline it is attached to.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::RunStarted { pipeline } => {
                info!(pipeline = %pipeline, "Starting pipeline run");
            }
            PipelineEvent::StageStarted { pipeline, stage } => {
                info!(pipeline = %pipeline, stage = %stage, "Stage started");
            }
            PipelineEvent::StageFinished {
                pipeline,
                stage,
                records,
            } => {
                info!(pipeline = %pipeline, stage = %stage, records = records, "Stage finished");
            }
            PipelineEvent::NothingExtracted { pipeline } => {
                warn!(pipeline = %pipeline, "No data extracted, skipping remaining stages");
            }
            PipelineEvent::InvalidRecords { pipeline, count } => {
                warn!(pipeline = %pipeline, invalid = count, "Found invalid records");
            }
            PipelineEvent::RunCompleted {
                pipeline,
                duration_secs,
            } => {
                info!(
                    pipeline = %pipeline,
                    duration_secs = duration_secs,
                    "Pipeline completed successfully"
                );
            }
            PipelineEvent::RunFailed { pipeline, error } => {
                error!(
                    pipeline = %pipeline,
                    stage = ?error.stage(),
                    error = %error,
                    chain = %error.chain(),
                    "Pipeline failed"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent<'_>) {}
}
