//! The 32-byte, content-addressed chunk address, wrapping [`XorName`] the way `sn`'s own
//! `ChunkAddress`/`RegisterAddress` types do.

use serde::{Deserialize, Serialize};
use std::fmt;
use xor_name::XorName;

/// Opaque, fixed-width (32 byte) address of a chunk in the content-addressed store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkAddress(pub XorName);

impl ChunkAddress {
    /// The reserved sentinel meaning "no reference". Never produced by a real `split`.
    pub const ZERO: ChunkAddress = ChunkAddress(XorName([0u8; 32]));

    /// Wraps a raw 32-byte name.
    pub fn new(name: XorName) -> Self {
        Self(name)
    }

    /// True iff this is the reserved zero address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The underlying 32-byte name.
    pub fn name(&self) -> &XorName {
        &self.0
    }
}

impl Default for ChunkAddress {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkAddress({})", hex::encode(self.0 .0))
    }
}

impl fmt::Display for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0 .0))
    }
}
