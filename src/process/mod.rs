//! Process access layer
//!
//! The scanner never touches another process directly. It goes through a
//! [`ProcessMemoryPort`] that opens processes and hands back a
//! [`ProcessMemory`] handle. Handles release the underlying OS resource when
//! dropped, so each one is closed exactly once.

pub mod simulated;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(windows)]
pub mod windows;

pub use simulated::{ReadBehavior, SimulatedHandle, SimulatedProcess, WriteBehavior};

use crate::core::types::{Address, MemoryResult, ModuleRegion, ProcessId};

/// Opens processes by id
pub trait ProcessMemoryPort {
    /// Handle type produced by this port
    type Handle: ProcessMemory;

    /// Open a process for reading and writing.
    ///
    /// Fails with `ProcessNotFound` or `AccessDenied`.
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Handle>;

    /// Executable name of a process, if the platform can tell
    fn process_name(&self, _pid: ProcessId) -> Option<String> {
        None
    }
}

/// Memory operations on one opened process
pub trait ProcessMemory: Send {
    /// Id of the process this handle refers to
    fn pid(&self) -> ProcessId;

    /// Loaded modules, base and size each
    fn list_modules(&self) -> MemoryResult<Vec<ModuleRegion>>;

    /// Read exactly `length` bytes at `address`.
    ///
    /// Protected or unmapped pages fail with `RegionUnreadable`, which callers
    /// treat as a per-address miss.
    fn read_bytes(&self, address: Address, length: usize) -> MemoryResult<Vec<u8>>;

    /// Write an encoded scalar at `address`, failing with `WriteFailed`
    fn write_scalar(&mut self, address: Address, bytes: &[u8]) -> MemoryResult<()>;
}

/// Adapter for the platform this binary was built for
#[cfg(target_os = "linux")]
pub type SystemProcesses = linux::ProcfsPort;

/// Adapter for the platform this binary was built for
#[cfg(windows)]
pub type SystemProcesses = windows::WinApiPort;
