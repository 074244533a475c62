//! In-memory stand-in for a target process.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use anyhow::{bail, Result};

use super::MemoryAccessor;

/// Sparse byte image with explicit holes. Reads and writes touching an
/// unmapped byte fail, mirroring an invalid address in a real target.
#[derive(Default)]
pub struct MockMemory {
    bytes: RefCell<HashMap<usize, u8>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MockMemory {
    pub fn builder() -> MockMemoryBuilder {
        MockMemoryBuilder::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Maps further bytes after construction.
    pub fn map_bytes(&self, addr: usize, bytes: &[u8]) {
        let mut image = self.bytes.borrow_mut();
        for (i, &byte) in bytes.iter().enumerate() {
            image.insert(addr + i, byte);
        }
    }

    pub fn map_ptr(&self, addr: usize, value: usize) {
        self.map_bytes(addr, &value.to_le_bytes());
    }

    /// Mapped bytes at `addr`, or `None` if any byte in the range is a hole.
    pub fn bytes_at(&self, addr: usize, len: usize) -> Option<Vec<u8>> {
        let image = self.bytes.borrow();
        (addr..addr + len).map(|a| image.get(&a).copied()).collect()
    }
}

impl MemoryAccessor for MockMemory {
    fn read(&self, addr: usize, buffer: &mut [u8]) -> Result<()> {
        self.reads.set(self.reads.get() + 1);
        let image = self.bytes.borrow();
        for (i, slot) in buffer.iter_mut().enumerate() {
            let Some(&byte) = image.get(&(addr + i)) else {
                bail!("read of unmapped address {:#x}", addr + i);
            };
            *slot = byte;
        }
        Ok(())
    }

    fn write(&self, addr: usize, buffer: &[u8]) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        if self.fail_writes.get() {
            bail!("write refused");
        }
        let mut image = self.bytes.borrow_mut();
        if (0..buffer.len()).any(|i| !image.contains_key(&(addr + i))) {
            bail!("write to unmapped address {:#x}", addr);
        }
        for (i, &byte) in buffer.iter().enumerate() {
            image.insert(addr + i, byte);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockMemoryBuilder {
    bytes: HashMap<usize, u8>,
}

impl MockMemoryBuilder {
    pub fn with_bytes(mut self, addr: usize, bytes: &[u8]) -> Self {
        for (i, &byte) in bytes.iter().enumerate() {
            self.bytes.insert(addr + i, byte);
        }
        self
    }

    /// Stores a little-endian pointer-sized value, one hop of a chain.
    pub fn with_ptr(self, addr: usize, value: usize) -> Self {
        self.with_bytes(addr, &value.to_le_bytes())
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            bytes: RefCell::new(self.bytes),
            ..Default::default()
        }
    }
}
