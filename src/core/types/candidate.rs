//! Candidate addresses and scan session state

use super::{Address, ScanValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An address currently believed to hold the searched-for value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: Address,
    pub last_seen_value: ScanValue,
}

impl Candidate {
    /// Creates a new candidate
    pub fn new(address: Address, last_seen_value: ScanValue) -> Self {
        Candidate {
            address,
            last_seen_value,
        }
    }

    /// Renders the candidate as a display row
    pub fn to_row(&self) -> ResultRow {
        ResultRow {
            address: self.address.to_string(),
            value: self.last_seen_value.to_string(),
        }
    }
}

/// Formatted `(address, value)` pair handed to the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub address: String,
    pub value: String,
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.address, self.value)
    }
}

/// Lifecycle state of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    FirstScanDone,
    Narrowed,
}

impl ScanState {
    /// Whether writes to the target are permitted
    pub fn allows_modify(&self) -> bool {
        !matches!(self, ScanState::Idle)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::FirstScanDone => write!(f, "first scan done"),
            ScanState::Narrowed => write!(f, "narrowed"),
        }
    }
}

/// A successful, read-back-confirmed write
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifiedValue {
    pub address: Address,
    pub value: ScanValue,
}

impl fmt::Display for VerifiedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Changed value at {} to {}", self.address, self.value)
    }
}
