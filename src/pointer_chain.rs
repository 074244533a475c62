use derive_new::new;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Description of a chain of pointer dereferences: a base address followed
/// by ordered signed offsets.
///
/// A zero `base` marks the chain as unset; resolution then yields no value
/// without touching memory. `indirect` must be set when the target value is
/// itself a pointer, which costs one extra trailing dereference. A chain is
/// immutable once built; re-targeting requires a new chain.
#[derive(Clone, Debug, PartialEq, Eq, CopyGetters, Getters, Serialize, Deserialize, new)]
pub struct PointerChain {
    #[getset(get_copy = "pub")]
    base: usize,
    #[getset(get = "pub")]
    offsets: Vec<isize>,
    #[getset(get_copy = "pub")]
    #[new(default)]
    #[serde(default)]
    indirect: bool,
}

impl PointerChain {
    /// Chain whose target value is itself a pointer.
    pub fn new_indirect(base: usize, offsets: Vec<isize>) -> Self {
        Self {
            indirect: true,
            ..Self::new(base, offsets)
        }
    }
}
