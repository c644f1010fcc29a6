//! Default configuration values for memedit

use crate::core::types::DataType;
use crate::memory::{DEFAULT_CHUNK_SIZE, DEFAULT_FLOAT_TOLERANCE};
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub display: DisplayDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub float_tolerance: f64,
    pub chunk_size: usize,
    pub max_threads: usize,
    pub default_data_type: DataType,
}

/// Default display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayDefaults {
    pub max_rows: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub ansi: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
            chunk_size: DEFAULT_CHUNK_SIZE, // 1MB
            max_threads: num_cpus::get().min(8),
            default_data_type: DataType::Int32,
        },
        display: DisplayDefaults { max_rows: 100 },
        logging: LoggingDefaults {
            level: "info".to_string(),
            ansi: true,
        },
    }
}
