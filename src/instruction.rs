//! The partially decoded instruction the matcher runs against (spec §3).

use crate::address_size::{AddressSize, SimdPrefix};
use crate::legacy_prefix::LegacyPrefixList;
use crate::modrm::{ModRm, Sib};
use crate::opcode_map::OpcodeMap;
use crate::xex::Xex;

/// The input to the matcher: everything decoded about an instruction up to
/// (and, depending on the caller, including) its immediates.
///
/// When the matcher is invoked with `up_to_opcode = true`, only the fields
/// up to and including `main_byte` are authoritative — `modrm`, `sib`, and
/// `immediate_size_in_bytes` are ignored even if present (spec §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// The default address size for the current processor mode.
    pub default_address_size: AddressSize,
    /// The address size actually in effect, after any `0x67` override.
    pub effective_address_size: AddressSize,
    pub legacy_prefixes: LegacyPrefixList,
    pub xex: Xex,
    pub opcode_map: OpcodeMap,
    /// The opcode byte itself (after any escape bytes have been consumed).
    pub main_byte: u8,
    pub modrm: Option<ModRm>,
    pub sib: Option<Sib>,
    /// Derived from the legacy prefixes / extended prefix; see spec
    /// glossary "SIMD prefix".
    pub simd_prefix: SimdPrefix,
    /// Only meaningful when the instruction is fully decoded (i.e. not an
    /// `up_to_opcode` match attempt).
    pub immediate_size_in_bytes: u32,
}

impl Instruction {
    /// Whether the legacy prefix list carries an operand-size override
    /// (spec §4.2 `OperandSize_NoOverride`/`OperandSize_64WithoutW`).
    pub fn has_operand_size_override(&self) -> bool {
        self.legacy_prefixes.has_operand_size_override()
    }

    /// Implements the matcher's `integer_operand_size` helper (spec §4.2)
    /// for this instruction.
    pub fn integer_operand_size(&self) -> crate::address_size::OperandSize {
        crate::address_size::integer_operand_size(
            self.default_address_size,
            self.xex.operand_size_64,
            self.has_operand_size_override(),
        )
    }
}
