use std::collections::BTreeMap;

use derive_builder::Builder;

use crate::etl::ETLError;

/// Column operations applied by a [`StandardTransformer`](super::StandardTransformer).
///
/// Fields left unset on the builder take their value from `Default`.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct TransformerConfig {
    /// Drop records that repeat an earlier record
    pub(crate) drop_duplicates: bool,

    /// Drop columns whose share of missing or null values exceeds this
    /// ratio. `0.0` disables the check.
    pub(crate) drop_null_threshold: f64,

    /// Columns parsed as dates and normalised to ISO form
    pub(crate) date_columns: Vec<String>,

    /// Old column name to new column name
    pub(crate) rename_columns: BTreeMap<String, String>,
}

impl TransformerConfig {
    #[inline]
    pub fn drop_duplicates(&self) -> bool {
        self.drop_duplicates
    }

    #[inline]
    pub fn drop_null_threshold(&self) -> f64 {
        self.drop_null_threshold
    }

    #[inline]
    pub fn date_columns(&self) -> &[String] {
        &self.date_columns
    }

    #[inline]
    pub fn rename_columns(&self) -> &BTreeMap<String, String> {
        &self.rename_columns
    }

    pub(crate) fn validate(&self) -> Result<(), ETLError> {
        if !(0.0..=1.0).contains(&self.drop_null_threshold) {
            return Err(ETLError::Configuration(format!(
                "drop_null_threshold must be within [0, 1], got {}",
                self.drop_null_threshold
            )));
        }
        Ok(())
    }
}

impl Default for TransformerConfig {
    fn default() -> Self {
        TransformerConfig {
            drop_duplicates: true,
            drop_null_threshold: 0.5,
            date_columns: Vec::new(),
            rename_columns: BTreeMap::new(),
        }
    }
}
