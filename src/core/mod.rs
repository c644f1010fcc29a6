//! Core module containing fundamental types for memedit
//!
//! This module provides the foundational building blocks used throughout
//! the crate, including address handling, typed scan values, candidates,
//! module descriptions and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, Candidate, DataType, MemoryError, MemoryResult, ModuleRegion, ProcessId,
    ProcessInfo, ResultRow, ScanState, ScanValue, VerifiedValue,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
