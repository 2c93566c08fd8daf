use anyhow::{Context, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use domain::{FuncType, LinkTransport, RawPayload, Sample, ScanBatch, ScanItem, decode_value};

/// Protocol driver of one host link. Exclusively owns the transport
/// handle, pulls batches from the scheduler and pushes decoded samples to
/// the sink.
///
/// A failed wire transaction degrades only the affected tag (zero value,
/// quality 0); a decode failure or an unexpectedly closed channel takes
/// the whole pipeline down.
pub struct Driver {
    link: String,
    transport: Box<dyn LinkTransport>,
    rx: mpsc::Receiver<ScanBatch>,
    sink_tx: mpsc::Sender<Vec<Sample>>,
    token: CancellationToken,
}

impl Driver {
    pub fn new(
        link: impl Into<String>,
        transport: Box<dyn LinkTransport>,
        rx: mpsc::Receiver<ScanBatch>,
        sink_tx: mpsc::Sender<Vec<Sample>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            link: link.into(),
            transport,
            rx,
            sink_tx,
            token,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(link = %self.link, "driver running");

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                batch = self.rx.recv() => match batch {
                    Some(batch) => self.handle_batch(batch).await?,
                    None if self.token.is_cancelled() => break,
                    None => bail!("scan channel closed unexpectedly on link `{}`", self.link),
                }
            }
        }

        // Residual batches were already emitted by the scheduler; finish
        // them before standing down.
        while let Ok(batch) = self.rx.try_recv() {
            self.handle_batch(batch).await?;
        }

        info!(link = %self.link, "driver stopped");
        Ok(())
    }

    async fn handle_batch(&mut self, batch: ScanBatch) -> anyhow::Result<()> {
        let mut samples = Vec::with_capacity(batch.items.len());
        for item in batch.items.iter() {
            samples.push(self.read_item(item).await?);
        }

        if self.sink_tx.send(samples).await.is_err() {
            bail!("archive channel closed on link `{}`", self.link);
        }
        Ok(())
    }

    async fn read_item(&mut self, item: &ScanItem) -> anyhow::Result<Sample> {
        let response = match item.func {
            FuncType::ReadHoldingRegisters => self
                .transport
                .read_holding_registers(item.unit_id, item.address, item.count)
                .await
                .map(RawPayload::Words),
            FuncType::ReadInputRegisters => self
                .transport
                .read_input_registers(item.unit_id, item.address, item.count)
                .await
                .map(RawPayload::Words),
            FuncType::ReadCoil => self
                .transport
                .read_coils(item.unit_id, item.address, item.count)
                .await
                .map(|bits| RawPayload::from_bits(&bits)),
            FuncType::ReadDiscreteInputs => self
                .transport
                .read_discrete_inputs(item.unit_id, item.address, item.count)
                .await
                .map(|bits| RawPayload::from_bits(&bits)),
            FuncType::WriteSingleRegister => {
                bail!(
                    "write function reached the scan path for tag `{}` on link `{}`",
                    item.name,
                    self.link
                );
            }
        };

        match response {
            Err(error) => {
                warn!(
                    link = %self.link,
                    device = %item.device,
                    tag = %item.name,
                    unit = item.unit_id,
                    address = item.address,
                    count = item.count,
                    %error,
                    "wire request failed"
                );
                Ok(Sample::failed(&item.device, &item.name))
            }
            Ok(payload) => {
                let value = decode_value(&payload, item.data_type, &item.format)
                    .with_context(|| format!("decoding tag `{}`", item.name))?;
                Ok(Sample::good(&item.device, &item.name, value))
            }
        }
    }
}
