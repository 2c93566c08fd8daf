use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use application::Scheduler;
use domain::{ByteFormat, DataType, FuncType, ScanItem};

fn item(name: &str, period_ms: u64, address: u16) -> ScanItem {
    let data_type = DataType::Word;
    ScanItem {
        device: "Dev1".to_string(),
        name: name.to_string(),
        unit_id: 1,
        address,
        count: data_type.register_count(),
        func: FuncType::ReadHoldingRegisters,
        data_type,
        format: ByteFormat::parse("1_0", 2).unwrap(),
        scan_period: Duration::from_millis(period_ms),
    }
}

#[tokio::test(start_paused = true)]
async fn cadence_matches_each_tag_period() {
    let (tx, mut rx) = mpsc::channel(100);
    let token = CancellationToken::new();
    let scheduler = Scheduler::new(
        "Host1",
        vec![item("fast", 100, 0), item("slow", 500, 2)],
        tx,
        token.clone(),
    );
    let handle = tokio::spawn(scheduler.run());

    // One second of virtual time: ten fast ticks, two slow ones.
    tokio::time::sleep(Duration::from_millis(1001)).await;
    token.cancel();
    handle.await.unwrap().unwrap();

    let mut fast = 0;
    let mut slow = 0;
    while let Ok(batch) = rx.try_recv() {
        if batch.items.iter().any(|i| i.name == "fast") {
            fast += 1;
        }
        if batch.items.iter().any(|i| i.name == "slow") {
            slow += 1;
        }
    }
    assert_eq!(fast, 10);
    assert_eq!(slow, 2);
}

#[tokio::test(start_paused = true)]
async fn every_tick_emits_the_whole_bucket_in_order() {
    let (tx, mut rx) = mpsc::channel(100);
    let token = CancellationToken::new();
    let scheduler = Scheduler::new(
        "Host1",
        vec![item("fast_a", 100, 0), item("fast_b", 100, 2), item("slow", 500, 4)],
        tx,
        token.clone(),
    );
    let handle = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_millis(501)).await;
    token.cancel();
    handle.await.unwrap().unwrap();

    let mut fast_batches = 0;
    while let Ok(batch) = rx.try_recv() {
        let names: Vec<&str> = batch.items.iter().map(|i| i.name.as_str()).collect();
        if names.contains(&"fast_a") {
            // The whole bucket, nothing added, nothing removed, stable order.
            assert_eq!(names, vec!["fast_a", "fast_b"]);
            assert_eq!(batch.period, Duration::from_millis(100));
            fast_batches += 1;
        } else {
            assert_eq!(names, vec!["slow"]);
        }
    }
    assert_eq!(fast_batches, 5);
}

#[tokio::test(start_paused = true)]
async fn blocked_send_is_abandoned_on_cancellation() {
    // Capacity 1 and no consumer: the scheduler must wedge on the send and
    // still exit promptly once the scope is cancelled.
    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let scheduler = Scheduler::new("Host1", vec![item("fast", 100, 0)], tx, token.clone());
    let handle = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();
    handle.await.unwrap().unwrap();
    drop(rx);
}

#[tokio::test(start_paused = true)]
async fn link_without_tags_idles_until_cancelled() {
    let (tx, _rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let scheduler = Scheduler::new("Host1", Vec::new(), tx, token.clone());
    let handle = tokio::spawn(scheduler.run());

    token.cancel();
    handle.await.unwrap().unwrap();
}
