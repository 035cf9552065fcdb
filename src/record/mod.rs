//! Records and batches flowing between pipeline stages.

mod value;

pub use value::{Value, ValueType};

use indexmap::IndexMap;

/// A single item with named, dynamically typed fields.
///
/// Fields keep their insertion order, so columns reach the loader in the
/// order the source produced them. Records in one batch need not share the
/// same field set.
pub type Record = IndexMap<String, Value>;

/// An ordered run of records handed from one stage to the next.
pub type Batch = Vec<Record>;

/// Converts a JSON object into a [`Record`].
///
/// Returns `None` when `value` is not an object.
pub fn record_from_json(value: serde_json::Value) -> Option<Record> {
    match Value::from(value) {
        Value::Map(fields) => Some(fields),
        _ => None,
    }
}

/// Converts a JSON array of objects into a [`Batch`], skipping non-object
/// elements. A single object becomes a one-record batch.
pub fn batch_from_json(value: serde_json::Value) -> Batch {
    match value {
        serde_json::Value::Array(items) => items.into_iter().filter_map(record_from_json).collect(),
        other => record_from_json(other).into_iter().collect(),
    }
}

/// Renders a batch back into a JSON array.
pub fn batch_to_json(batch: &[Record]) -> serde_json::Value {
    serde_json::Value::Array(
        batch
            .iter()
            .map(|record| serde_json::Value::from(Value::Map(record.clone())))
            .collect(),
    )
}
