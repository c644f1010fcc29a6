//! In-memory process used in place of a live target
//!
//! A [`SimulatedProcess`] owns a set of module images that can be scanned,
//! poked from "outside" to emulate the target changing its own memory, and
//! configured to refuse reads or writes.

use super::{ProcessMemory, ProcessMemoryPort};
use crate::core::types::{Address, MemoryError, MemoryResult, ModuleRegion, ProcessId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// How the simulated target reacts to `write_scalar`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteBehavior {
    /// Store the bytes
    #[default]
    Apply,
    /// Report success without storing anything
    Ignore,
    /// Refuse the write
    Fail,
}

/// How the simulated target answers `read_bytes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadBehavior {
    /// Return exactly the requested bytes
    #[default]
    Exact,
    /// Return at most this many bytes
    Truncate(usize),
    /// Return everything from the address to the end of its module
    Overlong,
}

#[derive(Debug)]
struct SimModule {
    name: String,
    base: Address,
    bytes: Vec<u8>,
    readable: bool,
}

impl SimModule {
    fn range(&self, address: Address, length: usize) -> Option<std::ops::Range<usize>> {
        let start = address.as_usize().checked_sub(self.base.as_usize())?;
        let end = start.checked_add(length)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

#[derive(Debug, Default)]
struct SimState {
    modules: Vec<SimModule>,
    write_behavior: WriteBehavior,
    read_behavior: ReadBehavior,
    deny_access: bool,
    reads: usize,
    opens: usize,
    closes: usize,
}

/// A fake process whose memory lives in this process
#[derive(Debug, Clone)]
pub struct SimulatedProcess {
    pid: ProcessId,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedProcess {
    /// Create an empty process with the given id
    pub fn new(pid: ProcessId) -> Self {
        SimulatedProcess {
            pid,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Add a readable module image
    pub fn with_module(self, name: impl Into<String>, base: Address, bytes: Vec<u8>) -> Self {
        self.push_module(name.into(), base, bytes, true);
        self
    }

    /// Add a module that is listed but fails every read
    pub fn with_unreadable_module(self, name: impl Into<String>, base: Address, size: usize) -> Self {
        self.push_module(name.into(), base, vec![0; size], false);
        self
    }

    /// Make every `open` fail with `AccessDenied`
    pub fn with_access_denied(self) -> Self {
        self.lock().deny_access = true;
        self
    }

    /// Change how writes are handled
    pub fn set_write_behavior(&self, behavior: WriteBehavior) {
        self.lock().write_behavior = behavior;
    }

    /// Change how reads are answered
    pub fn set_read_behavior(&self, behavior: ReadBehavior) {
        self.lock().read_behavior = behavior;
    }

    /// Toggle readability of the module containing `address`
    pub fn set_readable(&self, address: Address, readable: bool) {
        let mut state = self.lock();
        if let Some(module) = state
            .modules
            .iter_mut()
            .find(|m| m.range(address, 1).is_some())
        {
            module.readable = readable;
        }
    }

    /// Overwrite target memory directly, as the target itself would
    pub fn poke(&self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        let mut state = self.lock();
        let module = state
            .modules
            .iter_mut()
            .find_map(|m| m.range(address, bytes.len()).map(|r| (m, r)));

        match module {
            Some((module, range)) => {
                module.bytes[range].copy_from_slice(bytes);
                Ok(())
            }
            None => Err(MemoryError::InvalidAddress(address.to_string())),
        }
    }

    /// Read target memory directly, ignoring readability
    pub fn peek(&self, address: Address, length: usize) -> Option<Vec<u8>> {
        let state = self.lock();
        state
            .modules
            .iter()
            .find_map(|m| m.range(address, length).map(|r| m.bytes[r].to_vec()))
    }

    /// Number of `read_bytes` calls served so far
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Number of handles opened so far
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    /// Number of handles closed so far
    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    fn push_module(&self, name: String, base: Address, bytes: Vec<u8>, readable: bool) {
        self.lock().modules.push(SimModule {
            name,
            base,
            bytes,
            readable,
        });
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProcessMemoryPort for SimulatedProcess {
    type Handle = SimulatedHandle;

    fn open(&self, pid: ProcessId) -> MemoryResult<SimulatedHandle> {
        if pid != self.pid {
            return Err(MemoryError::ProcessNotFound(format!("PID: {}", pid)));
        }

        let mut state = self.lock();
        if state.deny_access {
            return Err(MemoryError::access_denied(pid, "simulated access denial"));
        }
        state.opens += 1;

        Ok(SimulatedHandle {
            pid,
            state: Arc::clone(&self.state),
        })
    }
}

/// Open handle onto a [`SimulatedProcess`]
#[derive(Debug)]
pub struct SimulatedHandle {
    pid: ProcessId,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHandle {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProcessMemory for SimulatedHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> MemoryResult<Vec<ModuleRegion>> {
        Ok(self
            .lock()
            .modules
            .iter()
            .map(|m| ModuleRegion::new(m.name.clone(), m.base, m.bytes.len() as u64))
            .collect())
    }

    fn read_bytes(&self, address: Address, length: usize) -> MemoryResult<Vec<u8>> {
        let mut state = self.lock();
        state.reads += 1;
        trace!(%address, length, "simulated read");

        let behavior = state.read_behavior;
        state
            .modules
            .iter()
            .find_map(|m| m.range(address, length).map(|r| (m, r)))
            .filter(|(m, _)| m.readable)
            .map(|(m, r)| match behavior {
                ReadBehavior::Exact => m.bytes[r].to_vec(),
                ReadBehavior::Truncate(limit) => {
                    let end = r.start + (r.end - r.start).min(limit);
                    m.bytes[r.start..end].to_vec()
                }
                ReadBehavior::Overlong => m.bytes[r.start..].to_vec(),
            })
            .ok_or_else(|| MemoryError::unreadable(address, "simulated page is not readable"))
    }

    fn write_scalar(&mut self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        let mut state = self.lock();
        let behavior = state.write_behavior;
        match behavior {
            WriteBehavior::Fail => {
                Err(MemoryError::write_failed(address, "simulated write refusal"))
            }
            WriteBehavior::Ignore => Ok(()),
            WriteBehavior::Apply => {
                let target = state
                    .modules
                    .iter_mut()
                    .find_map(|m| m.range(address, bytes.len()).map(|r| (m, r)));
                match target {
                    Some((module, range)) => {
                        module.bytes[range].copy_from_slice(bytes);
                        Ok(())
                    }
                    None => Err(MemoryError::write_failed(address, "address is not mapped")),
                }
            }
        }
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        self.lock().closes += 1;
    }
}
