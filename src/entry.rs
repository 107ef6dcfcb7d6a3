//! The immutable instruction-database entry (spec §3, C3) produced by the
//! NASM line parser and consumed by the matcher.

use bitflags::bitflags;

use crate::token::NasmEncodingToken;
use crate::vex::VexOpcodeEncoding;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Which operand-role character (from the `operand_fields` half of the
/// code-string's field-chars, spec §4.1 item 2) an operand is bound to.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OperandField {
    /// `-`: no encoding field (implicit operand).
    None,
    /// `r`: the ModR/M `reg` subfield.
    ModReg,
    /// `m`: the ModR/M `rm` subfield (register or base of a memory operand).
    BaseReg,
    /// `x`: the SIB `index` subfield (vector-SIB addressing).
    IndexReg,
    /// `i`: the (first) immediate operand.
    Immediate,
    /// `j`: a second immediate operand (e.g. `ENTER`'s two immediates).
    Immediate2,
    /// `v`: `VEX.vvvv` / `EVEX.vvvv`, the non-destructive register operand.
    NonDestructiveReg,
    /// `s`: the register encoded in bits 7:4 of an `is4` immediate byte.
    Is4,
}

impl OperandField {
    /// Parses one field-chars character (spec §4.1 item 2).
    pub fn from_char(c: char) -> Option<OperandField> {
        match c {
            '-' => Some(OperandField::None),
            'r' => Some(OperandField::ModReg),
            'm' => Some(OperandField::BaseReg),
            'x' => Some(OperandField::IndexReg),
            'i' => Some(OperandField::Immediate),
            'j' => Some(OperandField::Immediate2),
            'v' => Some(OperandField::NonDestructiveReg),
            's' => Some(OperandField::Is4),
            _ => None,
        }
    }
}

/// The coarse classification of an operand's NASM type name, as used by the
/// matcher's register/memory operand post-pass (spec §4.2). The full NASM
/// operand-type vocabulary (`reg32`, `rm8`, `xmmreg`, `imm16`, `mem`, ...) is
/// open-ended, so anything not needed to resolve that check is preserved
/// verbatim in [`OperandType::Other`].
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum OperandType {
    /// A register-only operand (NASM names beginning `reg`, plus the named
    /// vector-register families `xmmreg`/`ymmreg`/`zmmreg`/`mmxreg`).
    Register,
    /// A memory-only operand (NASM names beginning `mem`).
    Memory,
    /// A register-or-memory operand (NASM names beginning `rm`).
    RegisterOrMemory,
    /// An immediate operand (NASM names beginning `imm`).
    Immediate,
    /// A relative (PC-relative) operand (NASM names beginning `rel` or the
    /// bare `imm` used by `Jcc`/`CALL`/`LOOP` families with `Immediate_RelativeOffset*` tokens).
    Relative,
    /// Anything else, canonicalised to uppercase (e.g. `VOID`, `XMEM`,
    /// structured register-class names NASM doesn't subdivide further).
    Other(String),
}

impl OperandType {
    /// Parses one operand-value's type component, case-insensitively
    /// (spec §4.1 item 4).
    pub fn parse(name: &str) -> OperandType {
        let upper = name.to_ascii_uppercase();
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("rm")
            || lower.starts_with("xmmrm")
            || lower.starts_with("ymmrm")
            || lower.starts_with("zmmrm")
            || lower.starts_with("mmxrm")
        {
            OperandType::RegisterOrMemory
        } else if lower.starts_with("reg") || matches!(lower.as_str(), "xmmreg" | "ymmreg" | "zmmreg" | "mmxreg" | "fpureg" | "kreg") {
            OperandType::Register
        } else if lower.starts_with("mem") {
            OperandType::Memory
        } else if lower.starts_with("imm") {
            OperandType::Immediate
        } else if lower.starts_with("rel") {
            OperandType::Relative
        } else {
            OperandType::Other(upper)
        }
    }

    /// Spec §4.2 operand post-pass: `optype == Register → is_reg`.
    pub fn requires_register(&self) -> bool {
        matches!(self, OperandType::Register)
    }

    /// Spec §4.2 operand post-pass: `optype == Memory → !is_reg`.
    pub fn requires_memory(&self) -> bool {
        matches!(self, OperandType::Memory)
    }
}

/// The EVEX tuple type named by the (optional) second field-chars
/// component, parsed case-insensitively (spec §4.1 item 2).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NasmEVexTupleType {
    Full,
    Half,
    FullMem,
    Tuple1Scalar,
    Tuple1Fixed,
    Tuple2,
    Tuple4,
    Tuple8,
    Tuple1_4X,
    HalfMem,
    QuarterMem,
    EighthMem,
    Mem128,
    MovDdup,
}

impl NasmEVexTupleType {
    pub fn parse(name: &str) -> Option<NasmEVexTupleType> {
        Some(match name.to_ascii_lowercase().as_str() {
            "full" => NasmEVexTupleType::Full,
            "half" => NasmEVexTupleType::Half,
            "fullmem" => NasmEVexTupleType::FullMem,
            "tuple1scalar" => NasmEVexTupleType::Tuple1Scalar,
            "tuple1fixed" => NasmEVexTupleType::Tuple1Fixed,
            "tuple2" => NasmEVexTupleType::Tuple2,
            "tuple4" => NasmEVexTupleType::Tuple4,
            "tuple8" => NasmEVexTupleType::Tuple8,
            "tuple1_4x" => NasmEVexTupleType::Tuple1_4X,
            "halfmem" => NasmEVexTupleType::HalfMem,
            "quartermem" => NasmEVexTupleType::QuarterMem,
            "eighthmem" => NasmEVexTupleType::EighthMem,
            "mem128" => NasmEVexTupleType::Mem128,
            "movddup" => NasmEVexTupleType::MovDdup,
            _ => return None,
        })
    }
}

bitflags! {
    /// Instruction flags from the fourth `insns.dat` column (spec §4.1 item
    /// 5, §3): CPU-level gates, assembler-only markers, and HLE/lock
    /// acceptance markers. Flag names starting with a digit are looked up
    /// with a leading underscore (e.g. `8086` -> `_8086`).
    #[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct NasmInstructionFlag: u64 {
        const _8086      = 1 << 0;
        const _186       = 1 << 1;
        const _286       = 1 << 2;
        const _386       = 1 << 3;
        const _486       = 1 << 4;
        const PENT       = 1 << 5;
        const P6         = 1 << 6;
        const KATMAI     = 1 << 7;
        const WILLAMETTE = 1 << 8;
        const PRESCOTT   = 1 << 9;
        const X86_64     = 1 << 10;
        const NOLONG     = 1 << 11;
        const LONG       = 1 << 12;
        const SIZE_O16   = 1 << 13;
        const SIZE_O32   = 1 << 14;
        const SIZE_O64   = 1 << 15;
        const LOCK       = 1 << 16;
        const HLE        = 1 << 17;
        const FPU        = 1 << 18;
        const MMX        = 1 << 19;
        const SSE        = 1 << 20;
        const SSE2       = 1 << 21;
        const SSE3       = 1 << 22;
        const SSSE3      = 1 << 23;
        const SSE4A      = 1 << 24;
        const SSE41      = 1 << 25;
        const SSE42      = 1 << 26;
        const AVX        = 1 << 27;
        const AVX2       = 1 << 28;
        const AVX512     = 1 << 29;
        const VEX        = 1 << 30;
        const EVEX       = 1 << 31;
        /// "No disassemble": the entry exists to steer the *assembler*
        /// towards a particular encoding and should never be matched by a
        /// decoder. Drives `is_assemble_only` (spec §9).
        const ND         = 1 << 32;
        /// An entry that only exists as a pseudo-instruction placeholder
        /// (rarely set directly; `is_pseudo` mainly comes from mnemonic
        /// membership in the pseudo-instruction list, spec §6).
        const PSEUDO     = 1 << 33;
    }
}

/// The closed list of pseudo-instruction mnemonics recognised for
/// `is_pseudo` (spec §6): data-reservation and raw-data-emission
/// directives, which have no opcode.
pub const PSEUDO_MNEMONICS: &[&str] = &[
    "DB", "DW", "DD", "DQ", "DT", "DO", "DY", "DZ", "RESB", "RESW", "RESD", "RESQ", "REST",
    "RESO", "RESY", "RESZ",
];

/// One parsed `insns.dat` line: an immutable instruction-database entry
/// (spec §3 `NasmInsnsEntry`).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NasmInsnsEntry {
    /// Uppercase mnemonic, ending in literal `cc` for condition-code
    /// families.
    pub mnemonic: String,
    pub encoding_tokens: Vec<NasmEncodingToken>,
    pub operands: Vec<(OperandField, OperandType)>,
    /// Meaningful iff `encoding_tokens` contains a `Vex` token.
    pub vex_encoding: Option<VexOpcodeEncoding>,
    pub evex_tuple_type: Option<NasmEVexTupleType>,
    pub flags: NasmInstructionFlag,
    /// The original line text, kept for diagnostics (spec §10.2).
    pub source_line: String,
}

impl NasmInsnsEntry {
    /// Whether this entry exists only to steer instruction *selection*
    /// during assembly and must never be matched by a decoder (spec §9:
    /// derived from the `ND` flag).
    pub fn is_assemble_only(&self) -> bool {
        self.flags.contains(NasmInstructionFlag::ND)
    }

    /// Whether this entry's mnemonic names a pseudo-instruction directive
    /// (spec §6 `PSEUDO_MNEMONICS`), which reserves or emits raw bytes and
    /// has no opcode to match against.
    pub fn is_pseudo(&self) -> bool {
        self.flags.contains(NasmInstructionFlag::PSEUDO)
            || PSEUDO_MNEMONICS.contains(&self.mnemonic.as_str())
    }

    /// Whether this entry names a condition-code family (mnemonic ends in
    /// the literal, lowercase `cc` suffix, spec §4.1 item 1 — e.g. `Jcc`).
    pub fn is_condition_code_family(&self) -> bool {
        self.mnemonic.ends_with("cc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_type_classifies_common_nasm_names() {
        assert_eq!(OperandType::parse("rm32"), OperandType::RegisterOrMemory);
        assert_eq!(OperandType::parse("reg64"), OperandType::Register);
        assert_eq!(OperandType::parse("xmmreg"), OperandType::Register);
        assert_eq!(OperandType::parse("imm8"), OperandType::Immediate);
        assert_eq!(OperandType::parse("mem"), OperandType::Memory);
        assert_eq!(
            OperandType::parse("void"),
            OperandType::Other("VOID".to_string())
        );
    }

    #[test]
    fn pseudo_mnemonics_are_recognised() {
        let entry = NasmInsnsEntry {
            mnemonic: "RESB".to_string(),
            encoding_tokens: vec![],
            operands: vec![],
            vex_encoding: None,
            evex_tuple_type: None,
            flags: NasmInstructionFlag::empty(),
            source_line: "RESB imm [ ignore] ignore".to_string(),
        };
        assert!(entry.is_pseudo());
        assert!(!entry.is_assemble_only());
    }

    #[test]
    fn nd_flag_drives_is_assemble_only() {
        let entry = NasmInsnsEntry {
            mnemonic: "ADD".to_string(),
            encoding_tokens: vec![],
            operands: vec![],
            vex_encoding: None,
            evex_tuple_type: None,
            flags: NasmInstructionFlag::ND,
            source_line: String::new(),
        };
        assert!(entry.is_assemble_only());
    }
}
