use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use domain::{ArchiveSink, LinkTransport, Sample, SystemConfig};

use crate::driver::Driver;
use crate::scheduler::Scheduler;
use crate::sink::SinkWorker;
use crate::CHANNEL_CAPACITY;

/// Owns the cancellation scope and the worker set of the pipeline.
///
/// Start order is sink, then one driver per link, then one scheduler per
/// link; the HTTP surface is started by the caller afterwards. Any worker
/// that fails cancels the scope, so the rest drains and the process exits
/// with the first error.
pub struct Supervisor {
    token: CancellationToken,
    workers: Vec<(String, JoinHandle<anyhow::Result<()>>)>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            workers: Vec::new(),
        }
    }

    /// The scope every cooperative task selects on.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wires and launches the full pipeline: one shared sink channel, and
    /// a scan channel per host link between its scheduler and driver.
    pub fn start_pipeline(
        &mut self,
        config: &SystemConfig,
        transports: Vec<(String, Box<dyn LinkTransport>)>,
        archive: Arc<dyn ArchiveSink>,
    ) {
        let (sink_tx, sink_rx) = mpsc::channel::<Vec<Sample>>(CHANNEL_CAPACITY);

        let sink = SinkWorker::new(sink_rx, archive, self.token.clone());
        self.spawn("sink".to_string(), sink.run());

        for (link_name, transport) in transports {
            let (scan_tx, scan_rx) = mpsc::channel(CHANNEL_CAPACITY);

            let driver = Driver::new(
                link_name.clone(),
                transport,
                scan_rx,
                sink_tx.clone(),
                self.token.clone(),
            );
            self.spawn(format!("driver:{link_name}"), driver.run());

            let items = config.scan_items_for_link(&link_name);
            let scheduler =
                Scheduler::new(link_name.clone(), items, scan_tx, self.token.clone());
            self.spawn(format!("scheduler:{link_name}"), scheduler.run());
        }

        // The sink sees end-of-stream once the last driver drops its clone.
        drop(sink_tx);

        info!("pipeline running");
    }

    fn spawn(
        &mut self,
        name: String,
        work: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) {
        let token = self.token.clone();
        let worker_name = name.clone();
        let handle = tokio::spawn(async move {
            let result = work.await;
            if let Err(error) = &result {
                error!(worker = %worker_name, %error, "worker failed; stopping pipeline");
                token.cancel();
            }
            result
        });
        self.workers.push((name, handle));
    }

    /// Cancels the scope and waits for every worker to drain. Returns the
    /// first worker error, which becomes the process exit status.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.token.cancel();

        let mut first_error = None;
        for (name, handle) in self.workers {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow!("worker `{name}` panicked: {join_error}")),
            };
            if let Err(error) = outcome
                && first_error.is_none()
            {
                first_error = Some(error);
            }
        }

        info!("pipeline stopped");
        match first_error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
