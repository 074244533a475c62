//! Multi-level pointer chain resolution over process memory.
//!
//! A [`PointerChain`] describes a base address and ordered offsets leading
//! to a value buried behind several levels of indirection. A
//! [`ChainResolver`] walks the chain through any [`MemoryAccessor`] — the
//! calling process's own memory or an attached target process — and keeps a
//! local shadow copy of the target value that can be edited and committed
//! back.

mod memory_accessors;
mod pointer_chain;
mod resolver;

pub use crate::memory_accessors::MemoryAccessor;
#[cfg(target_os = "windows")]
pub use crate::memory_accessors::{ExternalProcess, LocalProcess};
pub use crate::pointer_chain::PointerChain;
pub use crate::resolver::{ChainResolver, CommitError};
