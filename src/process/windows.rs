//! Windows process access through the Win32 API

use super::{ProcessMemory, ProcessMemoryPort};
use crate::core::types::{Address, MemoryError, MemoryResult, ModuleRegion, ProcessId};
use std::{mem, ptr};
use tracing::debug;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, LPCVOID, LPVOID, MAX_PATH};
use winapi::shared::winerror::{ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::psapi::{EnumProcessModules, GetModuleBaseNameW, GetModuleInformation, MODULEINFO};
use winapi::um::winnt::{
    HANDLE, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};

/// Port that opens processes with `OpenProcess`
#[derive(Debug, Clone, Copy, Default)]
pub struct WinApiPort;

impl ProcessMemoryPort for WinApiPort {
    type Handle = WinApiHandle;

    fn open(&self, pid: ProcessId) -> MemoryResult<WinApiHandle> {
        let access =
            PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION;
        let raw = unsafe { OpenProcess(access, FALSE, pid) };

        if raw.is_null() {
            let code = unsafe { GetLastError() };
            return Err(match code {
                ERROR_ACCESS_DENIED => MemoryError::access_denied(pid, "OpenProcess denied"),
                ERROR_INVALID_PARAMETER => MemoryError::ProcessNotFound(format!("PID: {}", pid)),
                other => MemoryError::ProcessNotFound(format!(
                    "PID: {} (OpenProcess error {})",
                    pid, other
                )),
            });
        }

        debug!(pid, "opened process handle");
        Ok(WinApiHandle { pid, handle: raw })
    }

    fn process_name(&self, pid: ProcessId) -> Option<String> {
        unsafe {
            let raw = OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, FALSE, pid);
            if raw.is_null() {
                return None;
            }

            let mut name: [u16; MAX_PATH] = [0; MAX_PATH];
            let len = GetModuleBaseNameW(raw, ptr::null_mut(), name.as_mut_ptr(), MAX_PATH as DWORD);
            CloseHandle(raw);

            (len > 0).then(|| String::from_utf16_lossy(&name[..len as usize]))
        }
    }
}

/// Process handle; `CloseHandle` runs on drop
#[derive(Debug)]
pub struct WinApiHandle {
    pid: ProcessId,
    handle: HANDLE,
}

// HANDLEs are process-local values and may move between threads
unsafe impl Send for WinApiHandle {}

impl WinApiHandle {
    fn module_region(&self, module: HMODULE) -> Option<ModuleRegion> {
        unsafe {
            let mut info: MODULEINFO = mem::zeroed();
            let ok = GetModuleInformation(
                self.handle,
                module,
                &mut info,
                mem::size_of::<MODULEINFO>() as DWORD,
            );
            if ok == FALSE {
                return None;
            }

            let mut name: [u16; MAX_PATH] = [0; MAX_PATH];
            let len = GetModuleBaseNameW(self.handle, module, name.as_mut_ptr(), MAX_PATH as DWORD);
            let name = String::from_utf16_lossy(&name[..len as usize]);

            Some(ModuleRegion::new(
                name,
                Address::new(info.lpBaseOfDll as usize),
                u64::from(info.SizeOfImage),
            ))
        }
    }

    /// Enumerate modules starting from a buffer of `capacity` handles
    fn enumerate_modules(&self, capacity: usize) -> MemoryResult<Vec<ModuleRegion>> {
        let mut modules: Vec<HMODULE> = vec![ptr::null_mut(); capacity.max(1)];

        // Grow the buffer until the whole module list fits
        let count = loop {
            let capacity = modules.len() * mem::size_of::<HMODULE>();
            let mut needed: DWORD = 0;
            let ok = unsafe {
                EnumProcessModules(
                    self.handle,
                    modules.as_mut_ptr(),
                    capacity as DWORD,
                    &mut needed,
                )
            };
            if ok == FALSE {
                return Err(MemoryError::access_denied(
                    self.pid,
                    "failed to enumerate process modules",
                ));
            }

            let needed = needed as usize;
            if needed <= capacity {
                break needed / mem::size_of::<HMODULE>();
            }
            debug!(pid = self.pid, needed, capacity, "module list grew, retrying");
            modules.resize(needed / mem::size_of::<HMODULE>(), ptr::null_mut());
        };

        Ok(modules[..count]
            .iter()
            .filter_map(|&module| self.module_region(module))
            .collect())
    }
}

impl ProcessMemory for WinApiHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> MemoryResult<Vec<ModuleRegion>> {
        self.enumerate_modules(1024)
    }

    fn read_bytes(&self, address: Address, length: usize) -> MemoryResult<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        let mut bytes_read = 0;

        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                address.as_usize() as LPCVOID,
                buffer.as_mut_ptr() as LPVOID,
                length,
                &mut bytes_read,
            )
        };

        if ok == FALSE || bytes_read != length {
            return Err(MemoryError::unreadable(
                address,
                format!("ReadProcessMemory read {} of {} bytes", bytes_read, length),
            ));
        }
        Ok(buffer)
    }

    fn write_scalar(&mut self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        let mut bytes_written = 0;

        let ok = unsafe {
            WriteProcessMemory(
                self.handle,
                address.as_usize() as LPVOID,
                bytes.as_ptr() as LPCVOID,
                bytes.len(),
                &mut bytes_written,
            )
        };

        if ok == FALSE || bytes_written != bytes.len() {
            return Err(MemoryError::write_failed(
                address,
                format!(
                    "WriteProcessMemory wrote {} of {} bytes",
                    bytes_written,
                    bytes.len()
                ),
            ));
        }
        Ok(())
    }
}

impl Drop for WinApiHandle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                CloseHandle(self.handle);
            }
        }
    }
}
