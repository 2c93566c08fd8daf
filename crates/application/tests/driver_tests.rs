use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use application::Driver;
use domain::{
    ByteFormat, DataType, FuncType, LinkTransport, Quality, ScalarValue, ScanBatch, ScanItem,
    TransportError,
};

// --- Infrastructure mock (port) ---

#[derive(Default)]
struct MockTransport {
    words: HashMap<u16, Result<Vec<u16>, TransportError>>,
    bits: HashMap<u16, Result<Vec<bool>, TransportError>>,
}

impl MockTransport {
    fn respond_words(&self, address: u16) -> Result<Vec<u16>, TransportError> {
        self.words
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Io("unscripted address".to_string())))
    }

    fn respond_bits(&self, address: u16) -> Result<Vec<bool>, TransportError> {
        self.bits
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Io("unscripted address".to_string())))
    }
}

#[async_trait]
impl LinkTransport for MockTransport {
    async fn read_holding_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        _count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.respond_words(address)
    }

    async fn read_input_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        _count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.respond_words(address)
    }

    async fn read_coils(
        &mut self,
        _unit_id: u8,
        address: u16,
        _count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.respond_bits(address)
    }

    async fn read_discrete_inputs(
        &mut self,
        _unit_id: u8,
        address: u16,
        _count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.respond_bits(address)
    }

    async fn write_single_register(
        &mut self,
        _unit_id: u8,
        _address: u16,
        _value: u16,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

fn scan_item(name: &str, address: u16, func: FuncType, data_type: DataType, format: &str) -> ScanItem {
    ScanItem {
        device: "Dev1".to_string(),
        name: name.to_string(),
        unit_id: 1,
        address,
        count: data_type.register_count(),
        func,
        data_type,
        format: ByteFormat::parse(format, data_type.byte_width()).unwrap(),
        scan_period: Duration::from_millis(100),
    }
}

fn batch(items: Vec<ScanItem>) -> ScanBatch {
    ScanBatch {
        period: Duration::from_millis(100),
        items: std::sync::Arc::new(items),
    }
}

// --- Tests ---

#[tokio::test]
async fn batch_decodes_values_and_degrades_failed_tags() {
    let mut transport = MockTransport::default();
    // Big-endian float 3.14 as two holding registers.
    transport
        .words
        .insert(0, Ok(vec![0x4048, 0xF5C3]));
    // The slave at address 2 never answers.
    transport.words.insert(
        2,
        Err(TransportError::Timeout(Duration::from_secs(5))),
    );
    // A single energized coil.
    transport.bits.insert(4, Ok(vec![true]));

    let (scan_tx, scan_rx) = mpsc::channel(10);
    let (sink_tx, mut sink_rx) = mpsc::channel(10);
    let token = CancellationToken::new();
    let driver = Driver::new(
        "Host1",
        Box::new(transport),
        scan_rx,
        sink_tx,
        token.clone(),
    );
    let handle = tokio::spawn(driver.run());

    scan_tx
        .send(batch(vec![
            scan_item("pressure", 0, FuncType::ReadHoldingRegisters, DataType::Float, "3_2_1_0"),
            scan_item("rpm", 2, FuncType::ReadHoldingRegisters, DataType::Word, "1_0"),
            scan_item("pump", 4, FuncType::ReadCoil, DataType::Bool, "0"),
        ]))
        .await
        .unwrap();

    let samples = sink_rx.recv().await.unwrap();
    assert_eq!(samples.len(), 3);

    assert_eq!(samples[0].name, "pressure");
    assert_eq!(samples[0].quality, Quality::Good);
    match samples[0].value {
        ScalarValue::Float(v) => assert!((v - 3.14).abs() < 1e-6),
        other => panic!("expected float, got {other:?}"),
    }

    // The timed-out tag degrades to a zero sample; the batch continues.
    assert_eq!(samples[1].name, "rpm");
    assert_eq!(samples[1].quality, Quality::Bad);
    assert_eq!(samples[1].value, ScalarValue::zero());

    assert_eq!(samples[2].name, "pump");
    assert_eq!(samples[2].quality, Quality::Good);
    assert_eq!(samples[2].value, ScalarValue::UInt(1));

    token.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn closed_scan_channel_is_fatal_while_running() {
    let (scan_tx, scan_rx) = mpsc::channel::<ScanBatch>(10);
    let (sink_tx, _sink_rx) = mpsc::channel(10);
    let token = CancellationToken::new();
    let driver = Driver::new(
        "Host1",
        Box::new(MockTransport::default()),
        scan_rx,
        sink_tx,
        token,
    );
    let handle = tokio::spawn(driver.run());

    // The scheduler vanishing without a cancellation is a wiring bug.
    drop(scan_tx);

    let error = handle.await.unwrap().unwrap_err();
    assert!(error.to_string().contains("closed unexpectedly"));
}

#[tokio::test]
async fn write_function_on_the_scan_path_is_fatal() {
    let (scan_tx, scan_rx) = mpsc::channel(10);
    let (sink_tx, _sink_rx) = mpsc::channel(10);
    let token = CancellationToken::new();
    let driver = Driver::new(
        "Host1",
        Box::new(MockTransport::default()),
        scan_rx,
        sink_tx,
        token,
    );
    let handle = tokio::spawn(driver.run());

    scan_tx
        .send(batch(vec![scan_item(
            "setpoint",
            0,
            FuncType::WriteSingleRegister,
            DataType::Word,
            "1_0",
        )]))
        .await
        .unwrap();

    let error = handle.await.unwrap().unwrap_err();
    assert!(error.to_string().contains("write function"));
}

#[tokio::test]
async fn residual_batches_are_drained_after_cancellation() {
    let mut transport = MockTransport::default();
    transport.words.insert(0, Ok(vec![7]));

    let (scan_tx, scan_rx) = mpsc::channel(10);
    let (sink_tx, mut sink_rx) = mpsc::channel(10);
    let token = CancellationToken::new();

    let make = || {
        batch(vec![scan_item(
            "rpm",
            0,
            FuncType::ReadHoldingRegisters,
            DataType::Word,
            "1_0",
        )])
    };
    scan_tx.send(make()).await.unwrap();
    scan_tx.send(make()).await.unwrap();
    token.cancel();

    let driver = Driver::new("Host1", Box::new(transport), scan_rx, sink_tx, token);
    driver.run().await.unwrap();

    let mut stored = 0;
    while let Ok(samples) = sink_rx.try_recv() {
        assert_eq!(samples[0].value, ScalarValue::UInt(7));
        stored += 1;
    }
    assert_eq!(stored, 2);
}
