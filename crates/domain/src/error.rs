use std::time::Duration;

use thiserror::Error;

/// Startup-time configuration errors. Always fatal: the pipeline never
/// starts polling on a partially valid configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("device `{device}` references unknown host link `{host}`")]
    UnknownHostLink { device: String, host: String },

    #[error("tag at address {address} references unknown device `{device}`")]
    UnknownDevice { device: String, address: String },

    #[error("duplicate device name `{0}`")]
    DuplicateDevice(String),

    #[error("host link `{link}`: invalid {field} `{value}`")]
    InvalidLinkField {
        link: String,
        field: &'static str,
        value: String,
    },

    #[error("device `{device}`: invalid {field} `{value}`")]
    InvalidDeviceField {
        device: String,
        field: &'static str,
        value: String,
    },

    #[error("tag `{tag}`: invalid {field} `{value}`")]
    InvalidTagField {
        tag: String,
        field: &'static str,
        value: String,
    },

    #[error("device `{device}` speaks {protocol} but host link `{host}` is a {kind} link")]
    ProtocolMismatch {
        device: String,
        protocol: String,
        host: String,
        kind: String,
    },

    #[error("tag `{tag}`: function {func} does not permit data type {data_type}")]
    IncompatibleFunction {
        tag: String,
        func: String,
        data_type: String,
    },

    #[error("tag `{tag}`: write function {func} cannot be placed on the cyclic scan path")]
    UnschedulableFunction { tag: String, func: String },
}

/// Per-request transport failures. Recoverable: the affected tag is
/// published with quality 0 and the batch continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect to {0} failed: {1}")]
    Connect(String, String),

    #[error("i/o failure: {0}")]
    Io(String),

    #[error("modbus exception: {0}")]
    Exception(String),
}

/// Decoder failures. Unreachable after configuration validation; any
/// occurrence aborts the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("empty payload for data type {0}")]
    EmptyPayload(String),

    #[error("payload of {got} bytes is shorter than the {want} bytes required by {data_type}")]
    ShortPayload {
        data_type: String,
        want: usize,
        got: usize,
    },
}

/// Archive write failure. Fatal: there is no replay buffer, so a lost
/// insert would otherwise be silent data loss.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("archive insert failed: {0}")]
pub struct StoreError(pub String);
