//! Core type definitions for memedit
//!
//! This module contains the fundamental types shared by the scanner,
//! writer and process adapters: addresses, data types and values,
//! candidates, module descriptions and the error type.

mod address;
mod candidate;
mod error;
mod process_info;
mod value;

pub use address::{parse_address, Address};
pub use candidate::{Candidate, ResultRow, ScanState, VerifiedValue};
pub use error::{MemoryError, MemoryResult};
pub use process_info::{ModuleRegion, ProcessInfo};
pub use value::{DataType, ScanValue};

// Common type aliases
pub type ProcessId = u32;
