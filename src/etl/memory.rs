//! In-memory stages, for demos, tests and wiring pipelines to data that is
//! already in hand.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use super::processor::{Extractor, Loader};
use super::types::BoxError;
use crate::record::{Batch, Record};

/// Yields a copy of the same batch on every extraction.
#[derive(Debug, Clone, Default)]
pub struct MemoryExtractor {
    records: Batch,
}

impl MemoryExtractor {
    pub fn new(records: Batch) -> Self {
        MemoryExtractor { records }
    }
}

#[async_trait]
impl Extractor for MemoryExtractor {
    async fn extract(&self) -> Result<Batch, BoxError> {
        info!(records = self.records.len(), "Extracting in-memory records");
        Ok(self.records.clone())
    }
}

/// Appends every loaded batch to a shared buffer.
///
/// Clones share the buffer, so a handle kept outside the pipeline can read
/// what was loaded.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    loaded: Arc<Mutex<Batch>>,
    reject: bool,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader whose destination refuses every batch.
    pub fn rejecting() -> Self {
        MemoryLoader {
            loaded: Arc::default(),
            reject: true,
        }
    }

    /// Everything loaded so far, in load order.
    pub fn records(&self) -> Vec<Record> {
        self.loaded
            .lock()
            .map(|loaded| loaded.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&self, batch: Batch) -> Result<bool, BoxError> {
        if self.reject {
            warn!(records = batch.len(), "Destination rejected batch");
            return Ok(false);
        }

        let count = batch.len();
        let mut loaded = self
            .loaded
            .lock()
            .map_err(|e| BoxError::from(e.to_string()))?;
        loaded.extend(batch);
        info!(records = count, total = loaded.len(), "Loaded records into memory");
        Ok(true)
    }
}
