//! Linux process access through procfs
//!
//! Modules come from `/proc/<pid>/maps`, memory goes through positioned
//! reads and writes on `/proc/<pid>/mem`.

use super::{ProcessMemory, ProcessMemoryPort};
use crate::core::types::{Address, MemoryError, MemoryResult, ModuleRegion, ProcessId};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use tracing::debug;

/// Port that opens processes via `/proc`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsPort;

impl ProcessMemoryPort for ProcfsPort {
    type Handle = ProcfsHandle;

    fn open(&self, pid: ProcessId) -> MemoryResult<ProcfsHandle> {
        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .open(format!("/proc/{}/mem", pid))
            .map_err(|e| open_error(pid, e))?;

        debug!(pid, "opened /proc mem handle");
        Ok(ProcfsHandle { pid, mem })
    }

    fn process_name(&self, pid: ProcessId) -> Option<String> {
        let comm = fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
        Some(comm.trim_end().to_string()).filter(|name| !name.is_empty())
    }
}

fn open_error(pid: ProcessId, err: io::Error) -> MemoryError {
    match err.kind() {
        io::ErrorKind::NotFound => MemoryError::ProcessNotFound(format!("PID: {}", pid)),
        io::ErrorKind::PermissionDenied => MemoryError::access_denied(pid, err.to_string()),
        _ => MemoryError::IoError(err),
    }
}

/// Open `/proc/<pid>/mem`; closed when dropped
#[derive(Debug)]
pub struct ProcfsHandle {
    pid: ProcessId,
    mem: File,
}

impl ProcessMemory for ProcfsHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> MemoryResult<Vec<ModuleRegion>> {
        let maps = fs::read_to_string(format!("/proc/{}/maps", self.pid))
            .map_err(|e| open_error(self.pid, e))?;
        Ok(parse_maps(&maps))
    }

    fn read_bytes(&self, address: Address, length: usize) -> MemoryResult<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        self.mem
            .read_exact_at(&mut buffer, address.as_usize() as u64)
            .map_err(|e| MemoryError::unreadable(address, e.to_string()))?;
        Ok(buffer)
    }

    fn write_scalar(&mut self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        self.mem
            .write_all_at(bytes, address.as_usize() as u64)
            .map_err(|e| MemoryError::write_failed(address, e.to_string()))
    }
}

/// Readable, file-backed mappings from a maps listing
pub fn parse_maps(maps: &str) -> Vec<ModuleRegion> {
    maps.lines().filter_map(parse_maps_line).collect()
}

fn next_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    match line.split_once(char::is_whitespace) {
        Some((field, rest)) => Some((field, rest.trim_start())),
        None if !line.is_empty() => Some((line, "")),
        None => None,
    }
}

fn parse_maps_line(line: &str) -> Option<ModuleRegion> {
    let (range, rest) = next_field(line)?;
    let (permissions, rest) = next_field(rest)?;
    // offset, device and inode come before the path
    let (_, rest) = next_field(rest)?;
    let (_, rest) = next_field(rest)?;
    let (_, rest) = next_field(rest)?;

    // The path runs to the end of the line and may contain spaces
    let path = rest.trim_end();
    let path = path.strip_suffix(" (deleted)").unwrap_or(path);
    if !path.starts_with('/') {
        return None;
    }
    let (start, end) = range.split_once('-')?;

    if !permissions.starts_with('r') {
        return None;
    }

    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    Some(ModuleRegion::new(
        name,
        Address::new(start),
        end.checked_sub(start)? as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 08:01 1234 /usr/bin/game
55d0c0a02000-55d0c0a05000 r-xp 00002000 08:01 1234 /usr/bin/game
55d0c0c00000-55d0c0c21000 rw-p 00000000 00:00 0 [heap]
7f1e2a000000-7f1e2a001000 ---p 00000000 08:01 99 /usr/lib/libc.so.6
7f1e2a001000-7f1e2a002000 rw-p 00000000 00:00 0
";

    #[test]
    fn test_parse_maps() {
        let modules = parse_maps(MAPS);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "game");
        assert_eq!(modules[0].base, Address::new(0x55d0c0a00000));
        assert_eq!(modules[0].size, 0x2000);
        assert_eq!(modules[1].size, 0x3000);
    }

    #[test]
    fn test_parse_maps_path_with_spaces() {
        let line = "7f00a0000000-7f00a0004000 r--p 00000000 08:01 5150                       /opt/My Game/game bin";
        let module = parse_maps_line(line).unwrap();
        assert_eq!(module.name, "game bin");
        assert_eq!(module.size, 0x4000);

        let deleted = "7f00a0004000-7f00a0005000 r--p 00000000 08:01 5151 /tmp/old lib.so (deleted)";
        assert_eq!(parse_maps_line(deleted).unwrap().name, "old lib.so");
    }

    #[test]
    fn test_parse_maps_ignores_garbage() {
        assert!(parse_maps("not a maps line\n\n").is_empty());
    }

    #[test]
    fn test_open_missing_process() {
        let result = ProcfsPort.open(u32::MAX - 1);
        assert!(matches!(result, Err(MemoryError::ProcessNotFound(_))));
    }

    #[test]
    fn test_process_name() {
        assert!(ProcfsPort.process_name(process::id()).is_some());
        assert_eq!(ProcfsPort.process_name(u32::MAX - 1), None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_read_own_memory() {
        let handle = match ProcfsPort.open(process::id()) {
            Ok(handle) => handle,
            // Hardened kernels may refuse even self access
            Err(_) => return,
        };

        let secret = Box::new(0x1337_u32.to_le_bytes());
        let address = Address::new(secret.as_ptr() as usize);
        if let Ok(bytes) = handle.read_bytes(address, 4) {
            assert_eq!(bytes, secret.to_vec());
        }
        assert!(handle.read_bytes(Address::new(0), 4).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_list_own_modules() {
        if let Ok(handle) = ProcfsPort.open(process::id()) {
            let modules = handle.list_modules().unwrap();
            assert!(!modules.is_empty());
            assert!(modules.iter().all(|m| m.size > 0));
        }
    }
}
