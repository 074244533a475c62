use std::{
    mem::{size_of, MaybeUninit},
    slice,
};

use tracing::warn;

use crate::{memory_accessors::MemoryAccessor, pointer_chain::PointerChain};

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("pointer chain did not resolve")]
    InvalidChain,
    #[error("write to resolved address failed: {}", .0)]
    WriteFailed(anyhow::Error),
}

/// Walks a [`PointerChain`] through a [`MemoryAccessor`] and keeps a local
/// shadow copy of the value found at the end of the chain.
///
/// `T` must be a plain-old-data type matching the target's in-memory
/// representation; the shadow copy is filled byte-for-byte from the target
/// and starts out zeroed. Nothing is cached between accesses: every call
/// re-walks the chain against live memory, so two calls may disagree if the
/// target is mutated in between.
pub struct ChainResolver<'a, T, A: MemoryAccessor> {
    accessor: &'a A,
    chain: PointerChain,
    last_addr: usize,
    data: MaybeUninit<T>,
}

struct Fault {
    step: Option<usize>,
    addr: usize,
    source: anyhow::Error,
}

impl<'a, T: Copy, A: MemoryAccessor> ChainResolver<'a, T, A> {
    pub fn new(accessor: &'a A, chain: PointerChain) -> Self {
        Self {
            accessor,
            chain,
            last_addr: 0,
            data: MaybeUninit::zeroed(),
        }
    }

    pub fn chain(&self) -> &PointerChain {
        &self.chain
    }

    /// Address computed by the most recent walk, kept for error reporting.
    pub fn last_addr(&self) -> usize {
        self.last_addr
    }

    /// Resolves the chain to the address of the target value.
    ///
    /// The base is dereferenced once up front, every offset but the last is
    /// added and dereferenced in order, the last offset is added without a
    /// dereference, and an indirect chain ends with one more dereference.
    /// A zero base or a failed read yields `None`.
    pub fn get_ptr(&mut self) -> Option<usize> {
        if self.chain.base() == 0 {
            return None;
        }
        match self.walk() {
            Ok(addr) => {
                self.last_addr = addr;
                Some(addr)
            }
            Err(fault) => {
                self.last_addr = fault.addr;
                warn!(
                    "invalid pointer dereference: base {:#x}, offset index {}, target address {:#x}: {}",
                    self.chain.base(),
                    fault
                        .step
                        .map_or_else(|| "none".to_owned(), |step| step.to_string()),
                    fault.addr,
                    fault.source,
                );
                None
            }
        }
    }

    fn walk(&self) -> Result<usize, Fault> {
        let offsets = self.chain.offsets();
        let mut addr = self.deref(self.chain.base(), None)?;
        if let Some((&last, walked)) = offsets.split_last() {
            for (step, &offset) in walked.iter().enumerate() {
                addr = self.deref(addr.wrapping_add_signed(offset), Some(step))?;
            }
            addr = addr.wrapping_add_signed(last);
        }
        if self.chain.indirect() {
            addr = self.deref(addr, offsets.len().checked_sub(1))?;
        }
        Ok(addr)
    }

    fn deref(&self, addr: usize, step: Option<usize>) -> Result<usize, Fault> {
        self.accessor
            .read_ptr(addr)
            .map_err(|source| Fault { step, addr, source })
    }

    /// Reads the target value into the shadow copy and hands it out for
    /// inspection or editing.
    ///
    /// The shadow copy is overwritten on every successful call. Edits to it
    /// reach the target only through [`commit`](Self::commit).
    pub fn resolve(&mut self) -> Option<&mut T> {
        let addr = self.get_ptr()?;
        let buffer = unsafe {
            slice::from_raw_parts_mut(self.data.as_mut_ptr().cast::<u8>(), size_of::<T>())
        };
        if let Err(err) = self.accessor.read(addr, buffer) {
            warn!("read of resolved value at {:#x} failed: {}", addr, err);
            return None;
        }
        Some(unsafe { self.data.assume_init_mut() })
    }

    /// Copy of the target value.
    pub fn get(&mut self) -> Option<T> {
        self.resolve().map(|value| *value)
    }

    /// Writes the shadow copy back through the chain.
    ///
    /// The chain is re-resolved first; if it no longer resolves, nothing is
    /// written and `InvalidChain` is returned. A failed write is surfaced
    /// verbatim.
    pub fn commit(&mut self) -> Result<(), CommitError> {
        let addr = self.get_ptr().ok_or(CommitError::InvalidChain)?;
        let buffer =
            unsafe { slice::from_raw_parts(self.data.as_ptr().cast::<u8>(), size_of::<T>()) };
        self.accessor
            .write(addr, buffer)
            .map_err(CommitError::WriteFailed)
    }
}
