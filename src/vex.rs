//! `VexOpcodeEncoding`: the packed descriptor produced by the dotted
//! `vex.`/`xop.`/`evex.` sub-parser (spec §3, §4.1).
//!
//! The source models this as a single flag-style integer; we keep the same
//! storage shape (a `u32` of orthogonal bitfields) but hide it behind an
//! accessor API, so the matcher never depends on bit positions directly
//! (spec §9, "packed bit-field descriptor").

use crate::xex::XexFamily;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Which extended-prefix family a `Vex` encoding token was parsed from.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VexType {
    Vex,
    Xop,
    EVex,
}

impl VexType {
    /// The [`XexFamily`] this descriptor expects on the instruction.
    pub fn family(self) -> XexFamily {
        match self {
            VexType::Vex => XexFamily::Vex,
            VexType::Xop => XexFamily::Xop,
            VexType::EVex => XexFamily::EVex,
        }
    }
}

/// The opcode map selected by the `m..`/map-name component of a dotted
/// VEX/XOP/EVEX descriptor.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VexMap {
    Map0F,
    Map0F38,
    Map0F3A,
    Xop8,
    Xop9,
    Xop10,
}

impl VexMap {
    pub fn to_opcode_map(self) -> crate::opcode_map::OpcodeMap {
        use crate::opcode_map::OpcodeMap;
        match self {
            VexMap::Map0F => OpcodeMap::Escape0F,
            VexMap::Map0F38 => OpcodeMap::Escape0F38,
            VexMap::Map0F3A => OpcodeMap::Escape0F3A,
            VexMap::Xop8 => OpcodeMap::Xop8,
            VexMap::Xop9 => OpcodeMap::Xop9,
            VexMap::Xop10 => OpcodeMap::Xop10,
        }
    }
}

/// The `w0`/`w1`/`wig` component.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VexRexW {
    W0,
    W1,
    /// `wig`: REX.W is ignored, any value matches.
    Ignored,
}

/// The `128`/`256`/`512`/`lig` vector-length component.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VexVectorLength {
    Len128,
    Len256,
    Len512,
    /// `lig`: vector length is ignored, any value matches.
    Ignored,
}

/// The SIMD-prefix component (`66`/`f2`/`f3`/none).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VexSimdPrefix {
    None,
    Op66,
    F2,
    F3,
}

/// The non-destructive-register role of the `VEX.vvvv` field, as named by
/// the `nds`/`ndd`/`dds` descriptor component. Informational only — the
/// matcher does not gate on it (spec §4.2).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NonDestructiveReg {
    Invalid,
    /// `nds`: vvvv is a non-destructive source operand.
    Source,
    /// `ndd`: vvvv is the (non-destructive) destination operand.
    Dest,
    /// `dds`: vvvv is a second source operand.
    SecondSource,
}

/// The packed descriptor produced by parsing a dotted `vex.`/`xop.`/`evex.`
/// token (spec §3 `VexOpcodeEncoding`).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VexOpcodeEncoding {
    pub vex_type: VexType,
    pub map: VexMap,
    pub rex_w: VexRexW,
    pub vector_length: VexVectorLength,
    pub simd_prefix: VexSimdPrefix,
    pub non_destructive_reg: NonDestructiveReg,
}

impl VexOpcodeEncoding {
    /// The [`XexType`] family this descriptor expects on the instruction
    /// (used to seed the matcher's `expected_xex_type`, spec §4.2).
    pub fn xex_type(self) -> VexType {
        self.vex_type
    }
}
