//! The encoding-token model (spec §3, §6): the tagged kind + optional byte
//! payload emitted by the NASM line parser and consumed by the matcher.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// The closed set of encoding-token kinds NASM's `insns.dat` encoding
/// strings decompose into (spec §6).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    // --- address size ---
    AddressSizeFixed16,
    AddressSizeFixed32,
    AddressSizeFixed64,
    AddressSizeNoOverride,

    // --- operand size ---
    OperandSize16,
    OperandSize32,
    OperandSize64,
    OperandSizeNoOverride,
    OperandSize64WithoutW,

    // --- legacy prefix ---
    LegacyPrefixF2,
    LegacyPrefixF3,
    LegacyPrefixNoF3,
    LegacyPrefixNoSimd,
    LegacyPrefixMustRep,
    LegacyPrefixNoRep,
    LegacyPrefixDisassembleRepAsRepE,
    LegacyPrefixHleAlways,
    LegacyPrefixHleWithLock,
    LegacyPrefixXReleaseAlways,

    // --- extended prefix ---
    /// A dotted `vex.`/`xop.`/`evex.` descriptor; `byte` is unused, the
    /// decoded descriptor lives on the owning [`crate::entry::NasmInsnsEntry`].
    Vex,
    RexNoB,
    RexNoW,
    RexLockAsRexR,

    // --- opcode ---
    /// A literal opcode/escape/ModR/M/constant-immediate byte, meaning
    /// depending on matcher state (spec §4.2).
    Byte,
    /// `xx+r`: the low 3 bits of `byte` are ORed with a register number.
    BytePlusRegister,
    /// `xx+c`: the low nibble of `byte` is ORed with a condition code.
    BytePlusConditionCode,

    // --- ModR/M ---
    ModRM,
    /// `/n`: as `ModRM`, plus a fixed `reg` subfield given by `byte`.
    ModRMFixedReg,

    // --- vector SIB ---
    VectorSibX,
    VectorSibXIndexOnly,
    VectorSibY,
    VectorSibYIndexOnly,
    VectorSibZ,
    VectorSibZIndexOnly,

    // --- immediates ---
    ImmediateByte,
    ImmediateByteSigned,
    ImmediateByteUnsigned,
    ImmediateIs4,
    ImmediateRelativeOffset8,
    ImmediateWord,
    ImmediateDword,
    ImmediateDwordSigned,
    ImmediateQword,
    ImmediateRelativeOffset,

    // --- misc ---
    MiscAssembleWaitPrefix,
    MiscNoHigh8Register,
}

impl TokenKind {
    /// Whether this kind's `byte` payload is meaningful (spec §3): only
    /// `Byte`, `Byte_PlusRegister`, `Byte_PlusConditionCode`, and
    /// `ModRM_FixedReg` carry one.
    pub fn carries_byte(self) -> bool {
        matches!(
            self,
            TokenKind::Byte
                | TokenKind::BytePlusRegister
                | TokenKind::BytePlusConditionCode
                | TokenKind::ModRMFixedReg
        )
    }
}

/// A single encoding token: a `kind` plus a `byte` payload that is only
/// meaningful for the kinds [`TokenKind::carries_byte`] reports `true` for.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NasmEncodingToken {
    pub kind: TokenKind,
    pub byte: u8,
}

impl NasmEncodingToken {
    pub fn simple(kind: TokenKind) -> Self {
        debug_assert!(!kind.carries_byte());
        NasmEncodingToken { kind, byte: 0 }
    }

    pub fn with_byte(kind: TokenKind, byte: u8) -> Self {
        debug_assert!(kind.carries_byte());
        NasmEncodingToken { kind, byte }
    }

    /// The number of immediate bytes this token alone contributes, given
    /// `default_address_size` (only `ImmediateRelativeOffset` depends on
    /// it; spec invariant 1).
    pub fn immediate_width(self, default_address_size_bits: u32) -> u32 {
        match self.kind {
            TokenKind::ImmediateByte
            | TokenKind::ImmediateByteSigned
            | TokenKind::ImmediateByteUnsigned
            | TokenKind::ImmediateIs4
            | TokenKind::ImmediateRelativeOffset8 => 1,
            TokenKind::ImmediateWord => 2,
            TokenKind::ImmediateDword | TokenKind::ImmediateDwordSigned => 4,
            TokenKind::ImmediateQword => 8,
            TokenKind::ImmediateRelativeOffset => {
                if default_address_size_bits == 16 {
                    2
                } else {
                    4
                }
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_offset_width_depends_on_default_address_size() {
        let tok = NasmEncodingToken::simple(TokenKind::ImmediateRelativeOffset);
        assert_eq!(tok.immediate_width(16), 2);
        assert_eq!(tok.immediate_width(32), 4);
        assert_eq!(tok.immediate_width(64), 4);
    }

    #[test]
    fn fixed_width_immediates_do_not_depend_on_address_size() {
        let tok = NasmEncodingToken::with_byte(TokenKind::ImmediateDword, 0);
        assert_eq!(tok.immediate_width(16), 4);
        assert_eq!(tok.immediate_width(64), 4);
    }
}
