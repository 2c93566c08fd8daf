use async_trait::async_trait;

use crate::error::StoreError;
use crate::sample::Sample;

/// Write side of the archive. Implemented by the persistence layer and
/// consumed by the single sink worker.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Persists one batch. The store stamps each row with its own clock.
    async fn store_batch(&self, samples: &[Sample]) -> Result<(), StoreError>;
}
