//! Scan data types and the typed values they decode to

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric interpretation applied to memory during a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 4-byte little-endian signed integer
    #[default]
    #[serde(rename = "int")]
    Int32,
    /// 4-byte IEEE-754 float
    #[serde(rename = "float")]
    Float32,
}

impl DataType {
    /// All supported data types
    pub const ALL: [DataType; 2] = [DataType::Int32, DataType::Float32];

    /// Returns the encoded width in bytes
    pub const fn width(&self) -> usize {
        match self {
            DataType::Int32 | DataType::Float32 => 4,
        }
    }

    /// Short name used in configuration and the command line
    pub const fn name(&self) -> &'static str {
        match self {
            DataType::Int32 => "int",
            DataType::Float32 => "float",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "i32" | "int32" => Ok(DataType::Int32),
            "float" | "f32" | "float32" => Ok(DataType::Float32),
            other => Err(MemoryError::InvalidValue(format!(
                "unknown data type '{}', expected int or float",
                other
            ))),
        }
    }
}

/// A value in the domain of one [`DataType`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScanValue {
    #[serde(rename = "int")]
    Int32(i32),
    #[serde(rename = "float")]
    Float32(f32),
}

impl ScanValue {
    /// Gets the data type of this value
    pub const fn data_type(&self) -> DataType {
        match self {
            ScanValue::Int32(_) => DataType::Int32,
            ScanValue::Float32(_) => DataType::Float32,
        }
    }

    /// Parses user input under the given data type
    pub fn parse(text: &str, data_type: DataType) -> MemoryResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MemoryError::InvalidValue(
                "please enter a value to scan for".to_string(),
            ));
        }

        match data_type {
            DataType::Int32 => text
                .parse::<i32>()
                .map(ScanValue::Int32)
                .map_err(|e| MemoryError::InvalidValue(format!("'{}' is not an int: {}", text, e))),
            DataType::Float32 => {
                let value = text.parse::<f32>().map_err(|e| {
                    MemoryError::InvalidValue(format!("'{}' is not a float: {}", text, e))
                })?;
                if !value.is_finite() {
                    return Err(MemoryError::InvalidValue(format!(
                        "'{}' is not a finite float",
                        text
                    )));
                }
                Ok(ScanValue::Float32(value))
            }
        }
    }
}

impl fmt::Display for ScanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::Int32(v) => write!(f, "{}", v),
            ScanValue::Float32(v) => write!(f, "{:.2}", v),
        }
    }
}
