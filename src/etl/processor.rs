use std::future::Future;

use async_trait::async_trait;

use super::types::BoxError;
use crate::record::Batch;

/// Produces the batch a run starts from.
///
/// Must return an empty batch rather than fail when the source simply has
/// nothing to give.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self) -> Result<Batch, BoxError>;
}

/// Maps one batch to a cleaned batch.
///
/// The output may be shorter than the input (deduplication, filtering).
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, batch: Batch) -> Result<Batch, BoxError>;
}

/// Persists a batch.
///
/// Returns `Ok(false)` when the destination refused the batch. The pipeline
/// never calls `load` with an empty batch.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, batch: Batch) -> Result<bool, BoxError>;
}

#[async_trait]
impl<F, Fut> Extractor for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Batch, BoxError>> + Send,
{
    async fn extract(&self) -> Result<Batch, BoxError> {
        self().await
    }
}

#[async_trait]
impl<F, Fut> Transformer for F
where
    F: Fn(Batch) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Batch, BoxError>> + Send,
{
    async fn transform(&self, batch: Batch) -> Result<Batch, BoxError> {
        self(batch).await
    }
}

#[async_trait]
impl<F, Fut> Loader for F
where
    F: Fn(Batch) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BoxError>> + Send,
{
    async fn load(&self, batch: Batch) -> Result<bool, BoxError> {
        self(batch).await
    }
}
