#[cfg(target_os = "windows")]
mod external_process;
#[cfg(target_os = "windows")]
mod local_process;
#[cfg(test)]
pub(crate) mod mock;

use std::mem::size_of;

use anyhow::Result;

#[cfg(target_os = "windows")]
pub use external_process::ExternalProcess;
#[cfg(target_os = "windows")]
pub use local_process::LocalProcess;

/// Explicit read/write capability over a target address space.
///
/// Implementations report failure through the returned `Result`; callers do
/// not interpret failure classes beyond "not success".
pub trait MemoryAccessor {
    fn read(&self, addr: usize, buffer: &mut [u8]) -> Result<()>;
    fn write(&self, addr: usize, buffer: &[u8]) -> Result<()>;

    /// Reads one pointer-sized value, the unit step of a chain walk.
    fn read_ptr(&self, addr: usize) -> Result<usize> {
        let mut buffer = [0; size_of::<usize>()];
        self.read(addr, &mut buffer)?;
        Ok(usize::from_le_bytes(buffer))
    }
}
