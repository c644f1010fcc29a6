//! memedit library: find and change numeric values in a live process

pub mod cli;
pub mod config;
pub mod core;
pub mod memory;
pub mod process;

// Re-export main types from core module
pub use crate::core::types::{
    Address, Candidate, DataType, MemoryError, MemoryResult, ModuleRegion, ProcessId,
    ProcessInfo, ResultRow, ScanState, ScanValue, VerifiedValue,
};

// Re-export core directly for full access
pub use crate::core::*;

pub use memory::{ScanOptions, ScanSession, ScanWorker, ValueCodec};
pub use process::{ProcessMemory, ProcessMemoryPort};
