use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use super::config::TransformerConfig;
use crate::etl::{BoxError, ETLError, Transformer};
use crate::record::{Batch, Record, Value};

/// Field stamped on every record a [`StandardTransformer`] emits.
pub const TRANSFORMED_AT_FIELD: &str = "_transformed_at";

/// Output format of parsed date columns and of the `_transformed_at` stamp.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

type BatchFn = dyn Fn(Batch) -> Result<Batch, BoxError> + Send + Sync;

/// Common column clean-up applied in a fixed order:
///
/// 1. rename columns
/// 2. parse date columns (unparseable values become null)
/// 3. drop columns with too many nulls
/// 4. drop duplicate records, keeping the first
/// 5. run custom batch functions in the order they were added
/// 6. stamp `_transformed_at` (UTC, `YYYY-MM-DDTHH:MM:SS`)
#[derive(Clone)]
pub struct StandardTransformer {
    config: TransformerConfig,
    custom: Vec<(String, Arc<BatchFn>)>,
}

impl StandardTransformer {
    pub fn new(config: TransformerConfig) -> Result<Self, ETLError> {
        config.validate()?;
        Ok(StandardTransformer {
            config,
            custom: Vec::new(),
        })
    }

    /// Appends a named batch function, run after the built-in operations.
    pub fn with_custom<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Batch) -> Result<Batch, BoxError> + Send + Sync + 'static,
    {
        self.custom.push((name.into(), Arc::new(f)));
        self
    }

    #[inline]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Applies every configured operation to `batch`.
    pub fn apply(&self, batch: Batch) -> Result<Batch, BoxError> {
        if batch.is_empty() {
            warn!("No data to transform");
            return Ok(batch);
        }

        info!(records = batch.len(), "Transforming records");
        let mut batch = batch;

        if !self.config.rename_columns.is_empty() {
            rename_columns(&mut batch, &self.config.rename_columns);
            debug!(renames = ?self.config.rename_columns, "Renamed columns");
        }

        for column in &self.config.date_columns {
            convert_dates(&mut batch, column);
        }

        if self.config.drop_null_threshold > 0.0 {
            let dropped = drop_sparse_columns(&mut batch, self.config.drop_null_threshold);
            if !dropped.is_empty() {
                info!(
                    threshold = self.config.drop_null_threshold,
                    columns = ?dropped,
                    "Dropped columns over null threshold"
                );
            }
        }

        if self.config.drop_duplicates {
            let before = batch.len();
            batch = drop_duplicates(batch);
            let removed = before - batch.len();
            if removed > 0 {
                info!(removed = removed, "Removed duplicate records");
            }
        }

        for (name, f) in &self.custom {
            batch = f(batch)?;
            debug!(transform = %name, records = batch.len(), "Applied custom transformation");
        }

        let stamp = Value::String(Utc::now().format(TIMESTAMP_FORMAT).to_string());
        for record in &mut batch {
            record.insert(TRANSFORMED_AT_FIELD.to_string(), stamp.clone());
        }

        info!(records = batch.len(), "Transformation complete");
        Ok(batch)
    }
}

#[async_trait]
impl Transformer for StandardTransformer {
    async fn transform(&self, batch: Batch) -> Result<Batch, BoxError> {
        self.apply(batch)
    }
}

impl fmt::Debug for StandardTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardTransformer")
            .field("config", &self.config)
            .field(
                "custom",
                &self.custom.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Renames all mapped columns of a record at once: chains and swaps only
/// ever see the original names. A renamed column overwrites an unmapped
/// column of the same name. Field positions are kept.
fn rename_columns(batch: &mut Batch, renames: &BTreeMap<String, String>) {
    for record in batch.iter_mut() {
        if !record.keys().any(|key| renames.contains_key(key)) {
            continue;
        }
        let mut renamed = Record::with_capacity(record.len());
        for (key, value) in std::mem::take(record) {
            match renames.get(&key) {
                Some(to) => {
                    renamed.insert(to.clone(), value);
                }
                None => {
                    renamed.entry(key).or_insert(value);
                }
            }
        }
        *record = renamed;
    }
}

fn convert_dates(batch: &mut Batch, column: &str) {
    let mut converted = 0usize;
    for record in batch.iter_mut() {
        if let Some(value) = record.get_mut(column) {
            *value = normalize_date(value);
            converted += 1;
        }
    }
    if converted > 0 {
        debug!(column = %column, "Converted column to datetime");
    }
}

/// Parses a date-like string; anything unparseable becomes `Null`.
fn normalize_date(value: &Value) -> Value {
    value
        .as_str()
        .and_then(parse_datetime)
        .map_or(Value::Null, |parsed| {
            Value::String(parsed.format(TIMESTAMP_FORMAT).to_string())
        })
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Removes columns whose missing-or-null ratio exceeds `threshold`.
/// Returns the dropped column names.
fn drop_sparse_columns(batch: &mut Batch, threshold: f64) -> Vec<String> {
    let total = batch.len() as f64;
    let columns: BTreeSet<String> = batch
        .iter()
        .flat_map(|record| record.keys().cloned())
        .collect();

    let dropped: Vec<String> = columns
        .into_iter()
        .filter(|column| {
            let nulls = batch
                .iter()
                .filter(|record| record.get(column).map_or(true, Value::is_null))
                .count();
            nulls as f64 / total > threshold
        })
        .collect();

    if !dropped.is_empty() {
        for record in batch.iter_mut() {
            for column in &dropped {
                record.shift_remove(column);
            }
        }
    }
    dropped
}

/// Keeps the first of every group of records whose non-null fields match.
fn drop_duplicates(batch: Batch) -> Batch {
    let mut seen = HashSet::with_capacity(batch.len());
    batch
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect()
}

fn dedup_key(record: &Record) -> String {
    let mut fields: Vec<(&String, &Value)> = record
        .iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    fields.sort_unstable_by(|a, b| a.0.cmp(b.0));
    format!("{fields:?}")
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
