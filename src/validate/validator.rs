use tracing::{debug, info};

use super::constraint::Constraint;
use crate::etl::ETLError;
use crate::record::{Batch, Record, Value, ValueType};

/// Field added to invalid records, holding the list of reasons.
pub const VALIDATION_ERRORS_FIELD: &str = "_validation_errors";

/// Splits a batch into valid and invalid records.
///
/// Implementations must keep `valid.len() + invalid.len() == batch.len()`,
/// preserve input order within each side and attach at least one reason to
/// every invalid record.
pub trait Validator: Send + Sync {
    fn validate(&self, batch: Batch) -> (Batch, Batch);
}

/// Rule-based validator with three independent rule categories: required
/// fields, accepted types, and value constraints.
///
/// Every rule is checked for every record, so an invalid record lists all
/// of its violations in `_validation_errors`, in rule order: required
/// fields first, then types, then constraints. Within a category rules run
/// in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct DataValidator {
    required: Vec<String>,
    types: Vec<(String, Vec<ValueType>)>,
    constraints: Vec<(String, Constraint)>,
}

impl DataValidator {
    /// A validator with no rules; every record passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to be present and non-null.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.push(field.into());
        self
    }

    pub fn require_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Accepts `field` only when its value is one of `types`. Absent and
    /// null values are left to the required-field rule.
    pub fn expect_type<I>(mut self, field: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = ValueType>,
    {
        self.types.push((field.into(), types.into_iter().collect()));
        self
    }

    /// Checks present, non-null values of `field` against `constraint`.
    pub fn constrain(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.push((field.into(), constraint));
        self
    }

    pub fn has_rules(&self) -> bool {
        !(self.required.is_empty() && self.types.is_empty() && self.constraints.is_empty())
    }

    /// Returns every rule violation of `record`, in rule order.
    pub fn check(&self, record: &Record) -> Vec<String> {
        let mut reasons = Vec::new();

        for field in &self.required {
            if record.get(field).map_or(true, Value::is_null) {
                reasons.push(format!("missing required field: {field}"));
            }
        }

        for (field, accepted) in &self.types {
            let Some(value) = present(record, field) else {
                continue;
            };
            let actual = value.value_type();
            if !accepted.contains(&actual) {
                reasons.push(format!(
                    "invalid type for {field}: expected {}, got {actual}",
                    describe_types(accepted)
                ));
            }
        }

        for (field, constraint) in &self.constraints {
            let Some(value) = present(record, field) else {
                continue;
            };
            match constraint.check(value) {
                Ok(true) => {}
                Ok(false) => reasons.push(format!("value constraint failed for {field}")),
                Err(source) => {
                    let err = ETLError::ValidationRule {
                        field: field.clone(),
                        source,
                    };
                    debug!(field = %field, error = %err, "Constraint raised an error");
                    reasons.push(err.to_string());
                }
            }
        }

        reasons
    }
}

impl Validator for DataValidator {
    fn validate(&self, batch: Batch) -> (Batch, Batch) {
        if batch.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut valid = Vec::with_capacity(batch.len());
        let mut invalid = Vec::new();

        for mut record in batch {
            let reasons = self.check(&record);
            if reasons.is_empty() {
                valid.push(record);
            } else {
                record.insert(VALIDATION_ERRORS_FIELD.to_string(), Value::from(reasons));
                invalid.push(record);
            }
        }

        info!(
            valid = valid.len(),
            invalid = invalid.len(),
            "Validation complete"
        );
        (valid, invalid)
    }
}

fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|value| !value.is_null())
}

fn describe_types(types: &[ValueType]) -> String {
    match types {
        [] => "nothing".to_string(),
        [only] => only.to_string(),
        _ => types
            .iter()
            .map(ValueType::name)
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
