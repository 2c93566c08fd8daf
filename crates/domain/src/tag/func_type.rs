use std::fmt;

use super::DataType;

/// Modbus function selected for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncType {
    ReadCoil,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleRegister,
}

impl FuncType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ReadCoil" => Some(Self::ReadCoil),
            "ReadDiscreteInputs" => Some(Self::ReadDiscreteInputs),
            "ReadHoldingRegisters" => Some(Self::ReadHoldingRegisters),
            "ReadInputRegisters" => Some(Self::ReadInputRegisters),
            "WriteSingleRegister" => Some(Self::WriteSingleRegister),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadCoil => "ReadCoil",
            Self::ReadDiscreteInputs => "ReadDiscreteInputs",
            Self::ReadHoldingRegisters => "ReadHoldingRegisters",
            Self::ReadInputRegisters => "ReadInputRegisters",
            Self::WriteSingleRegister => "WriteSingleRegister",
        }
    }

    /// True for functions that read values off the wire. Only these may
    /// appear on the cyclic scan path.
    pub fn is_read(&self) -> bool {
        !matches!(self, Self::WriteSingleRegister)
    }

    /// Function/data-type compatibility: coil and discrete-input reads
    /// carry booleans only; register functions carry everything else.
    pub fn permits(&self, data_type: DataType) -> bool {
        match self {
            Self::ReadCoil | Self::ReadDiscreteInputs => data_type == DataType::Bool,
            Self::ReadHoldingRegisters | Self::ReadInputRegisters | Self::WriteSingleRegister => {
                data_type != DataType::Bool
            }
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_functions_permit_bool_only() {
        for func in [FuncType::ReadCoil, FuncType::ReadDiscreteInputs] {
            assert!(func.permits(DataType::Bool));
            for dt in DataType::ALL.into_iter().filter(|d| *d != DataType::Bool) {
                assert!(!func.permits(dt), "{func} must reject {dt}");
            }
        }
    }

    #[test]
    fn register_functions_reject_bool() {
        for func in [
            FuncType::ReadHoldingRegisters,
            FuncType::ReadInputRegisters,
            FuncType::WriteSingleRegister,
        ] {
            assert!(!func.permits(DataType::Bool));
            assert!(func.permits(DataType::Word));
            assert!(func.permits(DataType::Double));
        }
    }

    #[test]
    fn only_the_write_function_is_not_a_read() {
        assert!(!FuncType::WriteSingleRegister.is_read());
        assert!(FuncType::ReadCoil.is_read());
        assert!(FuncType::ReadHoldingRegisters.is_read());
    }
}
