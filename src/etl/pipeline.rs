use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::Mutex as RunLock;

use super::config::PipelineConfig;
use super::observer::{PipelineEvent, PipelineObserver, TracingObserver};
use super::processor::{Extractor, Loader, Transformer};
use super::types::{ETLError, ErrorEntry, PipelineStats, RunResult, Stage};
use crate::record::Batch;
use crate::validate::Validator;

/// Sequential Extract → Transform → Validate → Load orchestrator.
///
/// Only the extractor is mandatory. A missing transformer passes the
/// extracted batch through, a missing validator treats every record as
/// valid, and a missing loader skips loading without failing the run.
///
/// # Lifecycle of [`run`](ETLPipeline::run)
///
/// 1. `extract()` - an empty batch ends the run successfully right away
/// 2. `transform()` - optional
/// 3. `validate()` - optional; invalid records count as failed
/// 4. `load()` - optional, only with a non-empty valid batch
///
/// Any stage error ends the run; it is recorded in the returned
/// [`RunResult`] and never propagated. A panicking stage is caught and
/// recorded the same way. Runs on one instance are serialized.
pub struct ETLPipeline {
    extractor: Arc<dyn Extractor>,
    transformer: Option<Arc<dyn Transformer>>,
    validator: Option<Arc<dyn Validator>>,
    loader: Option<Arc<dyn Loader>>,
    observer: Arc<dyn PipelineObserver>,
    config: PipelineConfig,
    stats: Mutex<PipelineStats>,
    run_lock: RunLock<()>,
}

/// Per-run counters filled in as stages complete.
#[derive(Default)]
struct RunCounts {
    extracted: usize,
    transformed: usize,
    validated: usize,
    invalid: usize,
    loaded: usize,
}

impl ETLPipeline {
    /// Creates a pipeline around the mandatory extractor.
    pub fn new(extractor: impl Extractor + 'static) -> Self {
        Self::from_arc(Arc::new(extractor))
    }

    /// Creates a pipeline from a shared extractor.
    pub fn from_arc(extractor: Arc<dyn Extractor>) -> Self {
        ETLPipeline {
            extractor,
            transformer: None,
            validator: None,
            loader: None,
            observer: Arc::new(TracingObserver),
            config: PipelineConfig::default(),
            stats: Mutex::new(PipelineStats::default()),
            run_lock: RunLock::new(()),
        }
    }

    pub fn with_transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Replaces the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> PipelineStats {
        *self.lock_stats()
    }

    /// Runs one full cycle and reports what happened. Never fails, and stage
    /// panics are returned as [`ETLError::Panicked`] entries.
    ///
    /// An empty extraction is deliberately counted as a successful run with
    /// `finished_at` set, so `runs == successful_runs + failed_runs` holds.
    pub async fn run(&self) -> RunResult {
        let _guard = self.run_lock.lock().await;

        let started_at = Utc::now();
        let clock = Instant::now();
        self.lock_stats().runs += 1;
        self.emit(PipelineEvent::RunStarted { pipeline: self.name() });

        let mut counts = RunCounts::default();
        let outcome = self.execute(&mut counts).await;

        let finished_at = Utc::now();
        let duration_secs = clock.elapsed().as_secs_f64();
        let mut errors = Vec::new();

        match &outcome {
            Ok(()) => {
                self.lock_stats().successful_runs += 1;
                self.emit(PipelineEvent::RunCompleted {
                    pipeline: self.name(),
                    duration_secs,
                });
            }
            Err(err) => {
                self.lock_stats().failed_runs += 1;
                errors.push(ErrorEntry::from(err));
                self.emit(PipelineEvent::RunFailed {
                    pipeline: self.name(),
                    error: err,
                });
            }
        }

        RunResult {
            pipeline: self.name().to_string(),
            success: outcome.is_ok(),
            started_at,
            finished_at,
            duration_secs,
            records_extracted: counts.extracted,
            records_transformed: counts.transformed,
            records_validated: counts.validated,
            records_invalid: counts.invalid,
            records_loaded: counts.loaded,
            errors,
        }
    }

    async fn execute(&self, counts: &mut RunCounts) -> Result<(), ETLError> {
        self.stage_started(Stage::Extract);
        let extracted = AssertUnwindSafe(self.extractor.extract())
            .catch_unwind()
            .await
            .map_err(|payload| ETLError::panicked(Stage::Extract, payload))?
            .map_err(ETLError::Extraction)?;
        counts.extracted = extracted.len();
        self.lock_stats().records_processed += extracted.len() as u64;
        self.stage_finished(Stage::Extract, extracted.len());

        if extracted.is_empty() {
            self.emit(PipelineEvent::NothingExtracted { pipeline: self.name() });
            return Ok(());
        }

        let transformed = match &self.transformer {
            Some(transformer) => {
                self.stage_started(Stage::Transform);
                let batch = AssertUnwindSafe(transformer.transform(extracted))
                    .catch_unwind()
                    .await
                    .map_err(|payload| ETLError::panicked(Stage::Transform, payload))?
                    .map_err(ETLError::Transformation)?;
                counts.transformed = batch.len();
                self.stage_finished(Stage::Transform, batch.len());
                batch
            }
            None => extracted,
        };

        let valid = match &self.validator {
            Some(validator) => {
                self.stage_started(Stage::Validate);
                let (valid, invalid) =
                    panic::catch_unwind(AssertUnwindSafe(|| validator.validate(transformed)))
                        .map_err(|payload| ETLError::panicked(Stage::Validate, payload))?;
                counts.validated = valid.len();
                counts.invalid = invalid.len();
                self.stage_finished(Stage::Validate, valid.len());
                if !invalid.is_empty() {
                    self.lock_stats().records_failed += invalid.len() as u64;
                    self.emit(PipelineEvent::InvalidRecords {
                        pipeline: self.name(),
                        count: invalid.len(),
                    });
                }
                valid
            }
            None => transformed,
        };

        if let Some(loader) = &self.loader {
            if !valid.is_empty() {
                counts.loaded = self.load(&**loader, valid).await?;
            }
        }

        Ok(())
    }

    async fn load(&self, loader: &dyn Loader, batch: Batch) -> Result<usize, ETLError> {
        self.stage_started(Stage::Load);
        let records = batch.len();
        let accepted = AssertUnwindSafe(loader.load(batch))
            .catch_unwind()
            .await
            .map_err(|payload| ETLError::panicked(Stage::Load, payload))?
            .map_err(ETLError::Load)?;
        if !accepted {
            return Err(ETLError::LoadRejected { records });
        }
        self.stage_finished(Stage::Load, records);
        Ok(records)
    }

    fn stage_started(&self, stage: Stage) {
        self.emit(PipelineEvent::StageStarted {
            pipeline: self.name(),
            stage,
        });
    }

    fn stage_finished(&self, stage: Stage, records: usize) {
        self.emit(PipelineEvent::StageFinished {
            pipeline: self.name(),
            stage,
            records,
        });
    }

    fn emit(&self, event: PipelineEvent<'_>) {
        self.observer.on_event(&event);
    }

    fn lock_stats(&self) -> MutexGuard<'_, PipelineStats> {
        // Plain counters, so a poisoned lock still holds usable data.
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
