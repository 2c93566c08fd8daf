mod data_type;
mod entity;
mod format;
mod func_type;

pub use data_type::DataType;
pub use entity::Tag;
pub use format::{ByteFormat, FormatError};
pub use func_type::FuncType;
