//! Process and module descriptions supplied by the process layer

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A process as reported by the process enumeration layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessInfo {
            pid,
            name: name.into(),
        }
    }
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

/// One loaded module image inside the target's address space.
///
/// Only valid for the scan round that listed it; layouts change between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRegion {
    pub name: String,
    pub base: Address,
    pub size: u64,
}

impl ModuleRegion {
    /// Creates a new ModuleRegion
    pub fn new(name: impl Into<String>, base: Address, size: u64) -> Self {
        ModuleRegion {
            name: name.into(),
            base,
            size,
        }
    }
}
