//! The table selecting how the main opcode byte is interpreted.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Which opcode map the main opcode byte is looked up in.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OpcodeMap {
    /// The one-byte primary opcode map.
    Default,
    /// Reached via the `0F` escape byte.
    Escape0F,
    /// Reached via `0F 38`.
    Escape0F38,
    /// Reached via `0F 3A`.
    Escape0F3A,
    /// XOP map 8.
    Xop8,
    /// XOP map 9.
    Xop9,
    /// XOP map 10.
    Xop10,
}

impl Default for OpcodeMap {
    fn default() -> Self {
        OpcodeMap::Default
    }
}
