use derive_builder::Builder;

/// Configuration for an [`ETLPipeline`](super::ETLPipeline).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct PipelineConfig {
    /// Name used in run results and log events
    pub(crate) name: String,
}

impl PipelineConfig {
    /// Creates a config with the given pipeline name
    pub fn new(name: impl Into<String>) -> Self {
        PipelineConfig { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::new("ETL Pipeline")
    }
}
