use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use application::SinkWorker;
use domain::{ArchiveSink, Sample, ScalarValue, StoreError};

// --- Infrastructure mock (port) ---

#[derive(Default)]
struct MockArchive {
    batches: Mutex<Vec<Vec<Sample>>>,
    fail: bool,
}

#[async_trait]
impl ArchiveSink for MockArchive {
    async fn store_batch(&self, samples: &[Sample]) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError("disk on fire".to_string()));
        }
        self.batches.lock().unwrap().push(samples.to_vec());
        Ok(())
    }
}

fn sample(name: &str, value: u64) -> Sample {
    Sample::good("Dev1", name, ScalarValue::UInt(value))
}

// --- Tests ---

#[tokio::test]
async fn batches_are_stored_in_arrival_order() {
    let archive = Arc::new(MockArchive::default());
    let (tx, rx) = mpsc::channel(10);
    let token = CancellationToken::new();
    let worker = SinkWorker::new(rx, Arc::clone(&archive) as Arc<dyn ArchiveSink>, token.clone());
    let handle = tokio::spawn(worker.run());

    tx.send(vec![sample("a", 1)]).await.unwrap();
    tx.send(vec![sample("a", 2), sample("b", 7)]).await.unwrap();

    token.cancel();
    drop(tx);
    handle.await.unwrap().unwrap();

    let batches = archive.batches.lock().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0][0].value, ScalarValue::UInt(1));
    assert_eq!(batches[1][0].value, ScalarValue::UInt(2));
    assert_eq!(batches[1][1].name, "b");
}

#[tokio::test]
async fn residual_batches_are_flushed_after_cancellation() {
    let archive = Arc::new(MockArchive::default());
    let (tx, rx) = mpsc::channel(10);
    let token = CancellationToken::new();

    tx.send(vec![sample("a", 1)]).await.unwrap();
    tx.send(vec![sample("a", 2)]).await.unwrap();
    tx.send(vec![sample("a", 3)]).await.unwrap();
    token.cancel();
    drop(tx);

    let worker = SinkWorker::new(rx, Arc::clone(&archive) as Arc<dyn ArchiveSink>, token);
    worker.run().await.unwrap();

    assert_eq!(archive.batches.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn insert_failure_is_fatal() {
    let archive = Arc::new(MockArchive {
        fail: true,
        ..MockArchive::default()
    });
    let (tx, rx) = mpsc::channel(10);
    let token = CancellationToken::new();
    let worker = SinkWorker::new(rx, archive as Arc<dyn ArchiveSink>, token);
    let handle = tokio::spawn(worker.run());

    tx.send(vec![sample("a", 1)]).await.unwrap();

    let error = handle.await.unwrap().unwrap_err();
    assert!(error.to_string().contains("archive write failed"));
}

#[tokio::test]
async fn closed_sample_channel_is_fatal_while_running() {
    let archive = Arc::new(MockArchive::default());
    let (tx, rx) = mpsc::channel::<Vec<Sample>>(10);
    let token = CancellationToken::new();
    let worker = SinkWorker::new(rx, archive as Arc<dyn ArchiveSink>, token);
    let handle = tokio::spawn(worker.run());

    drop(tx);

    let error = handle.await.unwrap().unwrap_err();
    assert!(error.to_string().contains("closed unexpectedly"));
}
