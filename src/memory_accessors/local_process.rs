use std::{ffi::c_void, mem::size_of};

use anyhow::{bail, Result};
use windows::Win32::System::Memory::{
    VirtualQuery, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ,
    PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY,
    PAGE_READWRITE, PAGE_WRITECOPY,
};

use super::MemoryAccessor;

const READABLE: u32 = PAGE_READONLY.0
    | PAGE_READWRITE.0
    | PAGE_WRITECOPY.0
    | PAGE_EXECUTE_READ.0
    | PAGE_EXECUTE_READWRITE.0
    | PAGE_EXECUTE_WRITECOPY.0;
const WRITABLE: u32 =
    PAGE_READWRITE.0 | PAGE_WRITECOPY.0 | PAGE_EXECUTE_READWRITE.0 | PAGE_EXECUTE_WRITECOPY.0;

/// Direct access to the calling process's own memory.
///
/// Every access is validated against the region map first, so touching an
/// unmapped or guarded range fails like any other read instead of faulting.
#[derive(Default)]
pub struct LocalProcess;

impl LocalProcess {
    pub fn new() -> Self {
        Self
    }
}

fn accessible(addr: usize, len: usize, protection: u32) -> bool {
    let Some(end) = addr.checked_add(len) else {
        return false;
    };
    let mut cursor = addr;
    while cursor < end {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        let written = unsafe {
            VirtualQuery(
                Some(cursor as *const c_void),
                &mut info,
                size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0
            || info.State != MEM_COMMIT
            || info.Protect.0 & (PAGE_GUARD.0 | PAGE_NOACCESS.0) != 0
            || info.Protect.0 & protection == 0
        {
            return false;
        }
        cursor = info.BaseAddress as usize + info.RegionSize;
    }
    true
}

impl MemoryAccessor for LocalProcess {
    fn read(&self, addr: usize, buffer: &mut [u8]) -> Result<()> {
        if !accessible(addr, buffer.len(), READABLE) {
            bail!("memory range at {:#x} is not readable", addr);
        }
        unsafe { (addr as *const u8).copy_to(buffer.as_mut_ptr(), buffer.len()) };
        Ok(())
    }

    fn write(&self, addr: usize, buffer: &[u8]) -> Result<()> {
        if !accessible(addr, buffer.len(), WRITABLE) {
            bail!("memory range at {:#x} is not writable", addr);
        }
        unsafe { (addr as *mut u8).copy_from(buffer.as_ptr(), buffer.len()) };
        Ok(())
    }
}
