//! Scan sessions: first scan over module images, then narrowing rounds
//!
//! A [`ScanSession`] owns the process handle and the candidate set. Each
//! round builds a fresh candidate list and swaps it in only once the round
//! has finished, so a failed or cancelled round never leaves a half-updated
//! set behind.

use super::cancel::CancelFlag;
use super::codec::{ValueCodec, DEFAULT_FLOAT_TOLERANCE};
use super::region::MemoryRegion;
use super::writer::MemoryWriter;
use crate::config::ScannerConfig;
use crate::core::types::{
    Address, Candidate, DataType, MemoryError, MemoryResult, ModuleRegion, ProcessInfo,
    ResultRow, ScanState, ScanValue, VerifiedValue,
};
use crate::process::{ProcessMemory, ProcessMemoryPort};
use tracing::{debug, error, info, warn};

/// Default number of bytes requested from the adapter per read
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Options for scan sessions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOptions {
    /// Absolute tolerance for float comparisons
    pub float_tolerance: f64,
    /// Maximum bytes per adapter read; a multiple of every data width
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        ScanOptions {
            float_tolerance: config.float_tolerance,
            chunk_size: config.chunk_size,
        }
    }
}

/// Candidate set and state machine for one attached process
pub struct ScanSession<H: ProcessMemory> {
    handle: H,
    process: ProcessInfo,
    data_type: DataType,
    state: ScanState,
    candidates: Vec<Candidate>,
    codec: ValueCodec,
    chunk_size: usize,
    rounds: u32,
}

impl<H: ProcessMemory> ScanSession<H> {
    /// Create a session over an already opened handle
    pub fn new(handle: H, process: ProcessInfo, data_type: DataType, options: ScanOptions) -> Self {
        let width = DataType::ALL.iter().map(DataType::width).max().unwrap_or(4);
        let chunk_size = options.chunk_size.max(width) / width * width;

        ScanSession {
            handle,
            process,
            data_type,
            state: ScanState::Idle,
            candidates: Vec::new(),
            codec: ValueCodec::new(options.float_tolerance),
            chunk_size,
            rounds: 0,
        }
    }

    /// Open `process` through `port` and start an idle session on it
    pub fn attach<P>(
        port: &P,
        process: ProcessInfo,
        data_type: DataType,
        options: ScanOptions,
    ) -> MemoryResult<Self>
    where
        P: ProcessMemoryPort<Handle = H>,
    {
        let handle = port.open(process.pid)?;
        info!(process = %process, "attached to process");
        Ok(Self::new(handle, process, data_type, options))
    }

    /// Process this session is attached to
    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Data type used by every round of this session
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Current candidates in ascending address order per module
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether there are no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Rounds completed since the last reset
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Codec used for matching
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// Candidates formatted for display
    pub fn rows(&self) -> Vec<ResultRow> {
        self.candidates.iter().map(Candidate::to_row).collect()
    }

    /// Drop all candidates and return to `Idle`
    pub fn reset(&mut self) {
        self.candidates = Vec::new();
        self.state = ScanState::Idle;
        self.rounds = 0;
    }

    /// Switch the data type, resetting the session if it changed
    pub fn set_data_type(&mut self, data_type: DataType) -> bool {
        if data_type == self.data_type {
            return false;
        }
        info!(from = %self.data_type, to = %data_type, "data type changed, resetting session");
        self.data_type = data_type;
        self.reset();
        true
    }

    /// Attach to a different process; the previous handle is closed first
    pub fn switch_process(&mut self, handle: H, process: ProcessInfo) {
        info!(from = %self.process, to = %process, "process selection changed");
        self.handle = handle;
        self.process = process;
        self.reset();
    }

    /// Scan every module for `value`
    pub fn first_scan(&mut self, value: ScanValue) -> MemoryResult<usize> {
        self.first_scan_with_cancel(value, &CancelFlag::new())
    }

    /// Scan every module for `value`, checking `cancel` between reads.
    ///
    /// Always starts over: any previous candidates are discarded and the
    /// session adopts the value's data type. Unreadable regions are skipped.
    pub fn first_scan_with_cancel(
        &mut self,
        value: ScanValue,
        cancel: &CancelFlag,
    ) -> MemoryResult<usize> {
        self.data_type = value.data_type();
        self.reset();

        let modules = self.handle.list_modules()?;
        let mut found = Vec::new();
        let mut skipped = 0usize;

        for module in &modules {
            for (base, length) in self.chunks(module) {
                if cancel.is_cancelled() {
                    info!(value = %value, "first scan cancelled");
                    return Err(MemoryError::Cancelled);
                }

                match self.handle.read_bytes(base, length) {
                    Ok(mut bytes) => {
                        if bytes.len() != length {
                            error!(
                                module = %module.name,
                                %base,
                                requested = length,
                                returned = bytes.len(),
                                "adapter returned a read of the wrong length"
                            );
                            // Bytes past the request belong to the next chunk
                            bytes.truncate(length);
                        }
                        let region = MemoryRegion::new(base, bytes);
                        found.extend(region.find_matches(&value, &self.codec));
                    }
                    Err(e) => {
                        skipped += 1;
                        debug!(module = %module.name, %base, error = %e, "skipping unreadable region");
                    }
                }
            }
        }

        let count = found.len();
        self.candidates = found;
        self.state = ScanState::FirstScanDone;
        self.rounds = 1;

        info!(
            value = %value,
            modules = modules.len(),
            skipped,
            count,
            "first scan complete"
        );
        Ok(count)
    }

    /// Re-read the current candidates and keep those matching `value`
    pub fn next_scan(&mut self, value: ScanValue) -> MemoryResult<usize> {
        self.next_scan_with_cancel(value, &CancelFlag::new())
    }

    /// Re-read the current candidates, checking `cancel` between addresses.
    ///
    /// Candidates that can no longer be read are dropped. Survivors carry the
    /// freshly read value. A value of a different data type resets the session
    /// and is rejected.
    pub fn next_scan_with_cancel(
        &mut self,
        value: ScanValue,
        cancel: &CancelFlag,
    ) -> MemoryResult<usize> {
        if self.state == ScanState::Idle {
            return Err(MemoryError::InvalidState(
                "run a first scan before narrowing".to_string(),
            ));
        }
        if value.data_type() != self.data_type {
            let err = MemoryError::type_mismatch(self.data_type, value.data_type());
            warn!(error = %err, "resetting session");
            self.data_type = value.data_type();
            self.reset();
            return Err(err);
        }

        let before = self.candidates.len();
        let width = self.data_type.width();
        let mut survivors = Vec::with_capacity(before);

        for candidate in &self.candidates {
            if cancel.is_cancelled() {
                info!(value = %value, "next scan cancelled");
                return Err(MemoryError::Cancelled);
            }

            let bytes = match self.handle.read_bytes(candidate.address, width) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(address = %candidate.address, error = %e, "dropping unreadable candidate");
                    continue;
                }
            };

            match ValueCodec::decode(&bytes, self.data_type) {
                Ok(decoded) => {
                    if self.codec.matches(&decoded, &value) {
                        survivors.push(Candidate::new(candidate.address, decoded));
                    }
                }
                Err(e) => {
                    error!(
                        address = %candidate.address,
                        bytes = %hex::encode(&bytes),
                        error = %e,
                        "adapter returned a truncated read"
                    );
                }
            }
        }

        debug_assert!(survivors.len() <= before);
        let count = survivors.len();
        self.candidates = survivors;
        self.state = ScanState::Narrowed;
        self.rounds += 1;

        info!(value = %value, before, count, "next scan complete");
        Ok(count)
    }

    /// Write `value` to `address` and confirm it by reading it back.
    ///
    /// Only allowed after a scan; the candidate set is left untouched.
    pub fn modify(&mut self, address: Address, value: ScanValue) -> MemoryResult<VerifiedValue> {
        if !self.state.allows_modify() {
            return Err(MemoryError::InvalidState(
                "run a scan before modifying memory".to_string(),
            ));
        }
        if value.data_type() != self.data_type {
            return Err(MemoryError::type_mismatch(self.data_type, value.data_type()));
        }

        MemoryWriter::new(&mut self.handle, self.codec).modify(address, value)
    }

    /// End the session, closing the process handle
    pub fn close(self) {
        info!(process = %self.process, "closing scan session");
    }

    fn chunks(&self, module: &ModuleRegion) -> Vec<(Address, usize)> {
        let size = usize::try_from(module.size).unwrap_or(usize::MAX);
        (0..size)
            .step_by(self.chunk_size)
            .map_while(|offset| {
                let base = module.base.checked_add(offset)?;
                Some((base, self.chunk_size.min(size - offset)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{SimulatedHandle, SimulatedProcess};

    fn image(values: &[(usize, i32)], size: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; size];
        for (offset, value) in values {
            bytes[*offset..*offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    fn session(sim: &SimulatedProcess, options: ScanOptions) -> ScanSession<SimulatedHandle> {
        ScanSession::attach(sim, ProcessInfo::new(1, "sim"), DataType::Int32, options).unwrap()
    }

    #[test]
    fn test_options_default() {
        let opts = ScanOptions::default();
        assert_eq!(opts.float_tolerance, 0.1);
        assert_eq!(opts.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_chunk_size_is_rounded_to_width() {
        let sim = SimulatedProcess::new(1);
        let s = session(
            &sim,
            ScanOptions {
                chunk_size: 10,
                ..ScanOptions::default()
            },
        );
        assert_eq!(s.chunk_size, 8);

        let s = session(
            &sim,
            ScanOptions {
                chunk_size: 1,
                ..ScanOptions::default()
            },
        );
        assert_eq!(s.chunk_size, 4);
    }

    #[test]
    fn test_chunks_cover_module() {
        let sim = SimulatedProcess::new(1);
        let s = session(
            &sim,
            ScanOptions {
                chunk_size: 16,
                ..ScanOptions::default()
            },
        );
        let module = ModuleRegion::new("m", Address::new(0x100), 40);
        assert_eq!(
            s.chunks(&module),
            vec![
                (Address::new(0x100), 16),
                (Address::new(0x110), 16),
                (Address::new(0x120), 8)
            ]
        );
        assert!(s.chunks(&ModuleRegion::new("e", Address::new(0), 0)).is_empty());
    }

    #[test]
    fn test_matches_across_chunk_boundaries() {
        let sim = SimulatedProcess::new(1).with_module(
            "main",
            Address::new(0x1000),
            image(&[(12, 5), (16, 5), (60, 5)], 64),
        );
        let mut s = session(
            &sim,
            ScanOptions {
                chunk_size: 16,
                ..ScanOptions::default()
            },
        );

        assert_eq!(s.first_scan(ScanValue::Int32(5)).unwrap(), 3);
        assert_eq!(sim.read_count(), 4);
        let addresses: Vec<_> = s.candidates().iter().map(|c| c.address).collect();
        assert_eq!(
            addresses,
            vec![Address::new(0x100C), Address::new(0x1010), Address::new(0x103C)]
        );
    }

    #[test]
    fn test_next_scan_requires_first_scan() {
        let sim = SimulatedProcess::new(1);
        let mut s = session(&sim, ScanOptions::default());
        assert!(matches!(
            s.next_scan(ScanValue::Int32(1)),
            Err(MemoryError::InvalidState(_))
        ));
    }

    #[test]
    fn test_first_scan_adopts_value_type() {
        let sim = SimulatedProcess::new(1).with_module("main", Address::new(0), vec![0; 16]);
        let mut s = session(&sim, ScanOptions::default());
        s.first_scan(ScanValue::Float32(0.0)).unwrap();
        assert_eq!(s.data_type(), DataType::Float32);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_set_data_type_resets() {
        let sim = SimulatedProcess::new(1).with_module("main", Address::new(0), vec![0; 16]);
        let mut s = session(&sim, ScanOptions::default());
        s.first_scan(ScanValue::Int32(0)).unwrap();

        assert!(!s.set_data_type(DataType::Int32));
        assert_eq!(s.state(), ScanState::FirstScanDone);

        assert!(s.set_data_type(DataType::Float32));
        assert_eq!(s.state(), ScanState::Idle);
        assert!(s.is_empty());
        assert_eq!(s.rounds(), 0);
    }

    #[test]
    fn test_attach_unknown_pid() {
        let sim = SimulatedProcess::new(1);
        let result = ScanSession::attach(
            &sim,
            ProcessInfo::new(2, "other"),
            DataType::Int32,
            ScanOptions::default(),
        );
        assert!(matches!(result, Err(MemoryError::ProcessNotFound(_))));
    }
}
