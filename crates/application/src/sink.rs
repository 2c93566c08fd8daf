use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use domain::{ArchiveSink, Sample};

/// The single archive writer. Consumes sample batches from every driver
/// and persists each as one insert. A failed insert is fatal: with no
/// replay buffer upstream, continuing would silently lose data.
pub struct SinkWorker {
    rx: mpsc::Receiver<Vec<Sample>>,
    archive: Arc<dyn ArchiveSink>,
    token: CancellationToken,
}

impl SinkWorker {
    pub fn new(
        rx: mpsc::Receiver<Vec<Sample>>,
        archive: Arc<dyn ArchiveSink>,
        token: CancellationToken,
    ) -> Self {
        Self { rx, archive, token }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("sink running");

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                batch = self.rx.recv() => match batch {
                    Some(batch) => self.store(batch).await?,
                    None if self.token.is_cancelled() => break,
                    None => bail!("sample channel closed unexpectedly"),
                }
            }
        }

        // Keep consuming until every driver has dropped its sender, so
        // nothing already produced is lost on the way out.
        while let Some(batch) = self.rx.recv().await {
            self.store(batch).await?;
        }

        info!("sink stopped");
        Ok(())
    }

    async fn store(&self, batch: Vec<Sample>) -> anyhow::Result<()> {
        debug!(samples = batch.len(), "storing batch");
        self.archive
            .store_batch(&batch)
            .await
            .context("archive write failed")
    }
}
