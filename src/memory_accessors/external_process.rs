use std::{ffi::c_void, mem::size_of};

use anyhow::{anyhow, bail, Result};
use tracing::debug;
use windows::Win32::{
    Foundation::{CloseHandle, FALSE, HANDLE},
    System::{
        Diagnostics::{
            Debug::{ReadProcessMemory, WriteProcessMemory},
            ToolHelp::{
                CreateToolhelp32Snapshot, Process32First, Process32Next, PROCESSENTRY32,
                TH32CS_SNAPPROCESS,
            },
        },
        Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
            PROCESS_VM_WRITE,
        },
    },
};

use super::MemoryAccessor;

struct SafeHandle(HANDLE);

impl Drop for SafeHandle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) }.unwrap();
    }
}

fn entry_exe_file(pe: &PROCESSENTRY32) -> String {
    let len = pe
        .szExeFile
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(pe.szExeFile.len());
    String::from_utf8_lossy(&pe.szExeFile[..len]).into_owned()
}

fn find_process_id(exe_file: &str) -> Result<u32> {
    let snapshot = SafeHandle(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }?);

    let mut pe = PROCESSENTRY32 {
        dwSize: size_of::<PROCESSENTRY32>() as u32,
        ..Default::default()
    };
    if unsafe { Process32First(snapshot.0, &mut pe) }.is_ok() {
        loop {
            if entry_exe_file(&pe).eq_ignore_ascii_case(exe_file) {
                return Ok(pe.th32ProcessID);
            }
            if unsafe { Process32Next(snapshot.0, &mut pe) }.is_err() {
                break;
            }
        }
    }
    Err(anyhow!("process not found: {}", exe_file))
}

/// Read/write over a separate target process.
pub struct ExternalProcess {
    process: SafeHandle,
}

impl ExternalProcess {
    /// Attaches to the process whose executable name matches `exe_file`.
    pub fn new(exe_file: &str) -> Result<Self> {
        let process_id = find_process_id(exe_file)?;
        debug!("attaching to {} (pid {})", exe_file, process_id);
        Self::from_pid(process_id)
    }

    pub fn from_pid(process_id: u32) -> Result<Self> {
        let process = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION
                    | PROCESS_VM_OPERATION
                    | PROCESS_VM_READ
                    | PROCESS_VM_WRITE,
                FALSE,
                process_id,
            )
        }?;
        Ok(Self {
            process: SafeHandle(process),
        })
    }
}

impl MemoryAccessor for ExternalProcess {
    fn read(&self, addr: usize, buffer: &mut [u8]) -> Result<()> {
        let mut number_of_bytes_read: usize = 0;
        unsafe {
            ReadProcessMemory(
                self.process.0,
                addr as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                buffer.len(),
                Some(&mut number_of_bytes_read),
            )
        }?;
        if number_of_bytes_read != buffer.len() {
            bail!(
                "ReadProcessMemory transferred {} of {} bytes at {:#x}",
                number_of_bytes_read,
                buffer.len(),
                addr
            );
        }
        Ok(())
    }

    fn write(&self, addr: usize, buffer: &[u8]) -> Result<()> {
        let mut number_of_bytes_written: usize = 0;
        unsafe {
            WriteProcessMemory(
                self.process.0,
                addr as *const c_void,
                buffer.as_ptr() as *const c_void,
                buffer.len(),
                Some(&mut number_of_bytes_written),
            )
        }?;
        if number_of_bytes_written != buffer.len() {
            bail!(
                "WriteProcessMemory transferred {} of {} bytes at {:#x}",
                number_of_bytes_written,
                buffer.len(),
                addr
            );
        }
        Ok(())
    }
}
