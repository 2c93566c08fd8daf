use std::fmt;

/// Per-sample wire health: 1 when the transaction succeeded, 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Bad,
    Good,
}

impl Quality {
    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Bad => 0,
            Self::Good => 1,
        }
    }
}

/// A decoded scalar. Integers keep their native width so 64-bit register
/// values survive unclipped until the store coerces them to NUMERIC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl ScalarValue {
    pub fn zero() -> Self {
        Self::UInt(0)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::UInt(v) => *v as f64,
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One ingested value on its way to the archive. The timestamp is assigned
/// by the store at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub device: String,
    pub name: String,
    pub value: ScalarValue,
    pub quality: Quality,
}

impl Sample {
    pub fn good(device: &str, name: &str, value: ScalarValue) -> Self {
        Self {
            device: device.to_string(),
            name: name.to_string(),
            value,
            quality: Quality::Good,
        }
    }

    /// Sample emitted for a failed wire transaction: numerically zero,
    /// quality 0.
    pub fn failed(device: &str, name: &str) -> Self {
        Self {
            device: device.to_string(),
            name: name.to_string(),
            value: ScalarValue::zero(),
            quality: Quality::Bad,
        }
    }
}
