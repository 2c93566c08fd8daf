use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use domain::{ScanBatch, ScanItem};

/// Tags of one link sharing a scan period. Bucket order is first-seen
/// period order; item order is global tag order. Both are stable, so each
/// tick re-emits an identical batch.
struct Bucket {
    period: Duration,
    items: Arc<Vec<ScanItem>>,
}

fn partition(items: Vec<ScanItem>) -> Vec<Bucket> {
    let mut groups: Vec<(Duration, Vec<ScanItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(p, _)| *p == item.scan_period) {
            Some((_, bucket)) => bucket.push(item),
            None => groups.push((item.scan_period, vec![item])),
        }
    }
    groups
        .into_iter()
        .map(|(period, items)| Bucket {
            period,
            items: Arc::new(items),
        })
        .collect()
}

/// Emits scan batches for one host link on the cadence each tag declares.
///
/// A single task holds a min-heap of `(next_fire, bucket)` entries instead
/// of one timer task per distinct period; tick ordering is deterministic
/// and the task count stays flat. Ticks are never coalesced: when the
/// driver falls behind, the bounded channel blocks the send and the
/// scheduler yields to the driver's pace rather than dropping work.
pub struct Scheduler {
    link: String,
    buckets: Vec<Bucket>,
    tx: mpsc::Sender<ScanBatch>,
    token: CancellationToken,
}

impl Scheduler {
    pub fn new(
        link: impl Into<String>,
        items: Vec<ScanItem>,
        tx: mpsc::Sender<ScanBatch>,
        token: CancellationToken,
    ) -> Self {
        Self {
            link: link.into(),
            buckets: partition(items),
            tx,
            token,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if self.buckets.is_empty() {
            info!(link = %self.link, "no tags bound to this link; scheduler idle");
            self.token.cancelled().await;
            return Ok(());
        }

        info!(
            link = %self.link,
            buckets = self.buckets.len(),
            tags = self.buckets.iter().map(|b| b.items.len()).sum::<usize>(),
            "scheduler running"
        );

        let start = Instant::now();
        let mut timeline: BinaryHeap<Reverse<(Instant, usize)>> = self
            .buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| Reverse((start + bucket.period, index)))
            .collect();

        while let Some(&Reverse((fire_at, index))) = timeline.peek() {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep_until(fire_at) => {}
            }
            timeline.pop();

            let bucket = &self.buckets[index];
            let batch = ScanBatch {
                period: bucket.period,
                items: Arc::clone(&bucket.items),
            };
            debug!(link = %self.link, period_ms = bucket.period.as_millis() as u64, "tick");

            tokio::select! {
                _ = self.token.cancelled() => break,
                sent = self.tx.send(batch) => {
                    if sent.is_err() {
                        bail!("scan channel closed on link `{}`", self.link);
                    }
                }
            }

            timeline.push(Reverse((fire_at + bucket.period, index)));
        }

        info!(link = %self.link, "scheduler stopped");
        Ok(())
    }
}
