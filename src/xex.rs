//! The extended prefix: REX / VEX / XOP / EVEX.

use crate::address_size::AddressSize;
use crate::vex::VexVectorLength;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Which extended-prefix family, if any, preceded the opcode.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum XexType {
    /// No extended prefix; legacy escape bytes (`0F`, `0F 38`, `0F 3A`) are
    /// still reachable.
    Escapes,
    /// A REX prefix.
    Rex,
    /// A two-byte VEX prefix (`C5 ..`).
    Vex2,
    /// A three-byte VEX prefix (`C4 .. ..`).
    Vex3,
    /// An XOP prefix (`8F .. ..`).
    Xop,
    /// An EVEX prefix (`62 .. .. ..`).
    EVex,
}

impl XexType {
    /// True iff this family still permits the legacy `0F`/`0F 38`/`0F 3A`
    /// escape bytes to select an opcode map (spec §3, `allows_escapes`).
    pub fn allows_escapes(self) -> bool {
        matches!(self, XexType::Escapes | XexType::Rex)
    }

    /// Collapses `Vex2`/`Vex3` into a single `Vex` family. The dotted
    /// descriptor's `Type` component (spec §3 `VexOpcodeEncoding`) never
    /// distinguishes the two VEX prefix lengths, so the matcher compares at
    /// this coarser grain rather than against the raw [`XexType`].
    pub fn family(self) -> XexFamily {
        match self {
            XexType::Escapes => XexFamily::Escapes,
            XexType::Rex => XexFamily::Rex,
            XexType::Vex2 | XexType::Vex3 => XexFamily::Vex,
            XexType::Xop => XexFamily::Xop,
            XexType::EVex => XexFamily::EVex,
        }
    }
}

/// The extended-prefix family at the grain the dotted VEX/XOP/EVEX
/// descriptor and the matcher's `expected_xex_type` operate at: coarser
/// than [`XexType`] in that it does not distinguish the 2-byte and 3-byte
/// VEX encodings.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum XexFamily {
    Escapes,
    Rex,
    Vex,
    Xop,
    EVex,
}

/// The decoded extended prefix of a partially decoded instruction.
///
/// Only the fields the matcher consumes are modelled: REX.W (promoted
/// operand size to 64 bits), REX.B (base-register extension), and, for the
/// vector prefix families, the vector length actually encoded (needed to
/// verify a `Vex` token's `VectorLength` sub-field against the observed
/// instruction).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Xex {
    pub xex_type: XexType,
    /// REX.W / VEX.W / XOP.W / EVEX.W.
    pub operand_size_64: bool,
    /// REX.B / VEX.B / XOP.B / EVEX.B.
    pub base_reg_extension: bool,
    /// The vector length encoded by a VEX/XOP/EVEX prefix. `None` for
    /// `Escapes`/`Rex`, where there is no such field.
    pub vector_length: Option<VexVectorLength>,
}

impl Xex {
    /// The plain REX/escapes-only extended prefix (no VEX/XOP/EVEX).
    pub fn escapes() -> Self {
        Xex {
            xex_type: XexType::Escapes,
            operand_size_64: false,
            base_reg_extension: false,
            vector_length: None,
        }
    }

    pub fn rex(operand_size_64: bool, base_reg_extension: bool) -> Self {
        Xex {
            xex_type: XexType::Rex,
            operand_size_64,
            base_reg_extension,
            vector_length: None,
        }
    }

    pub fn vex(
        xex_type: XexType,
        operand_size_64: bool,
        base_reg_extension: bool,
        vector_length: VexVectorLength,
    ) -> Self {
        debug_assert!(matches!(
            xex_type,
            XexType::Vex2 | XexType::Vex3 | XexType::Xop | XexType::EVex
        ));
        Xex {
            xex_type,
            operand_size_64,
            base_reg_extension,
            vector_length: Some(vector_length),
        }
    }
}

/// The default address size for the current processor mode, as supplied by
/// the caller alongside the rest of the partial instruction.
pub fn default_address_size_bits(size: AddressSize) -> u32 {
    size.bits()
}
