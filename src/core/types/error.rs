//! Custom error types for memedit

use std::fmt;
use thiserror::Error;

/// Main error type for scanning and editing operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Access denied to process {pid}: {reason}")]
    AccessDenied { pid: u32, reason: String },

    #[error("Region unreadable at {address}: {reason}")]
    RegionUnreadable { address: String, reason: String },

    #[error("Decode error: expected {expected} bytes, got {actual}")]
    Decode { expected: usize, actual: usize },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Write verification failed at {address}: expected {expected}, read back {actual}")]
    VerifyMismatch {
        address: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Data type mismatch: session uses {session}, value is {value}")]
    DataTypeMismatch { session: String, value: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan worker stopped")]
    WorkerStopped,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an access denied error for a process
    pub fn access_denied(pid: u32, reason: impl Into<String>) -> Self {
        MemoryError::AccessDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a region unreadable error
    pub fn unreadable(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::RegionUnreadable {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a verification mismatch error
    pub fn verify_mismatch(
        address: impl fmt::Display,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        MemoryError::VerifyMismatch {
            address: address.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a data type mismatch error
    pub fn type_mismatch(session: impl fmt::Display, value: impl fmt::Display) -> Self {
        MemoryError::DataTypeMismatch {
            session: session.to_string(),
            value: value.to_string(),
        }
    }
}
