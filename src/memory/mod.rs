//! Value scanning and verified writes over process memory
//!
//! This module provides:
//! - Encoding and tolerant matching of scalar values
//! - First scans over module images and narrowing rounds
//! - Write-then-verify modification of a single address
//! - A background worker so scans never block the caller

pub mod cancel;
pub mod codec;
pub mod region;
pub mod scanner;
pub mod worker;
pub mod writer;

pub use cancel::CancelFlag;
pub use codec::{ValueCodec, DEFAULT_FLOAT_TOLERANCE};
pub use region::MemoryRegion;
pub use scanner::{ScanOptions, ScanSession, DEFAULT_CHUNK_SIZE};
pub use worker::{RoundKind, ScanCommand, ScanEvent, ScanWorker};
pub use writer::MemoryWriter;
