use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::etl::types::panic_message;
use crate::etl::BoxError;
use crate::record::Value;

type Predicate = dyn Fn(&Value) -> Result<bool, BoxError> + Send + Sync;

/// A predicate over a single field value.
///
/// Only ever called with present, non-null values.
#[derive(Clone)]
pub struct Constraint {
    predicate: Arc<Predicate>,
}

impl Constraint {
    /// Wraps an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Constraint {
            predicate: Arc::new(move |value| Ok(predicate(value))),
        }
    }

    /// Wraps a predicate that can itself fail. A failure marks the field as
    /// invalid instead of aborting validation.
    pub fn try_new<F, E>(predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Constraint {
            predicate: Arc::new(move |value| predicate(value).map_err(Into::into)),
        }
    }

    /// Numeric range check, inclusive on both ends. Non-numeric values fail.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Constraint::new(move |value| match value.as_f64() {
            Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
            None => false,
        })
    }

    /// Membership check against a fixed set of allowed values.
    pub fn one_of<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        Constraint::new(move |value| allowed.contains(value))
    }

    /// Runs the predicate. A panicking predicate is reported as an error.
    pub(crate) fn check(&self, value: &Value) -> Result<bool, BoxError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(value))).unwrap_or_else(
            |payload| {
                Err(format!("constraint panicked: {}", panic_message(payload.as_ref())).into())
            },
        )
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint").finish_non_exhaustive()
    }
}
