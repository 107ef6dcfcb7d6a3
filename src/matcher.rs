//! The matcher (spec §4.2, C5): runs one entry's encoding-token stream as a
//! declarative matcher against a partially decoded [`Instruction`], deriving
//! `has_modrm` and `immediate_size_in_bytes` as a side product.
//!
//! This is a pure function: it reads its two arguments and returns a value,
//! with no shared mutable state, so it may be called from any number of
//! threads concurrently (spec §5).

use crate::address_size::{OperandSize, SimdPrefix};
use crate::entry::NasmInsnsEntry;
use crate::instruction::Instruction;
use crate::legacy_prefix::LegacyPrefix;
use crate::opcode_map::OpcodeMap;
use crate::token::{NasmEncodingToken, TokenKind};
use crate::vex::{VexRexW, VexSimdPrefix, VexVectorLength};
use crate::xex::XexFamily;

/// The result of matching one entry against one instruction.
///
/// `NoMatch` is a normal, expected outcome (most entries in a database
/// don't match any given instruction) and is not an error. `Unimplemented`
/// is reserved for the token/state-machine branches this matcher
/// deliberately does not resolve either way (spec §7, §9): a constant
/// immediate byte following ModR/M, and a `+r`/`+cc` opcode suffix
/// encountered once the opcode has already been established.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { has_modrm: bool, immediate_size: u32 },
    NoMatch,
    Unimplemented { mnemonic: String, reason: String },
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

/// The matcher's internal progress through an entry's token stream. States
/// only ever advance (spec §4.2); `PreOpcode` from the spec is an alias for
/// `PostEscape` and is not given its own variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
enum MatchState {
    Prefixes,
    PostSimdPrefix,
    Escape0F,
    PostEscape,
    PostOpcode,
    PostModRM,
    Immediates,
}

struct MatchCtx {
    state: MatchState,
    expected_xex_family: XexFamily,
    expected_opcode_map: OpcodeMap,
    has_modrm: bool,
    immediate_size: u32,
}

impl MatchCtx {
    fn advance_to(&mut self, state: MatchState) {
        if state > self.state {
            self.state = state;
        }
    }
}

/// Runs the declarative matcher described in spec §4.2.
///
/// `up_to_opcode` restricts which instruction fields are authoritative: when
/// `true`, only fields up to and including `main_byte` may be relied on —
/// `modrm`, `sib`, and `immediate_size_in_bytes` are not yet known and any
/// check that would depend on them is skipped, though the entry's derived
/// `has_modrm`/immediate-width bookkeeping still accumulates normally.
pub fn match_entry(
    entry: &NasmInsnsEntry,
    instruction: &Instruction,
    up_to_opcode: bool,
) -> MatchOutcome {
    if entry.is_assemble_only() || entry.is_pseudo() {
        return MatchOutcome::NoMatch;
    }

    let mut ctx = MatchCtx {
        state: MatchState::Prefixes,
        expected_xex_family: XexFamily::Escapes,
        expected_opcode_map: OpcodeMap::Default,
        has_modrm: false,
        immediate_size: 0,
    };

    for token in &entry.encoding_tokens {
        match token.kind {
            TokenKind::AddressSizeFixed16 => {
                if instruction.effective_address_size != crate::address_size::AddressSize::Bits16
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::AddressSizeFixed32 => {
                if instruction.effective_address_size != crate::address_size::AddressSize::Bits32
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::AddressSizeFixed64 => {
                if instruction.effective_address_size != crate::address_size::AddressSize::Bits64
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::AddressSizeNoOverride => {
                if instruction.effective_address_size != instruction.default_address_size {
                    return MatchOutcome::NoMatch;
                }
            }

            TokenKind::OperandSize16 => {
                if instruction.integer_operand_size() != OperandSize::Word {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::OperandSize32 => {
                if instruction.integer_operand_size() != OperandSize::Dword {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::OperandSize64 => {
                if instruction.integer_operand_size() != OperandSize::Qword {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::OperandSizeNoOverride => {
                if instruction.has_operand_size_override() {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::OperandSize64WithoutW => {
                if instruction.default_address_size != crate::address_size::AddressSize::Bits64
                    || instruction.has_operand_size_override()
                {
                    return MatchOutcome::NoMatch;
                }
            }

            TokenKind::LegacyPrefixF2 => {
                if !instruction
                    .legacy_prefixes
                    .contains(LegacyPrefix::RepeatNotEqual)
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixF3 => {
                if !instruction.legacy_prefixes.contains(LegacyPrefix::RepeatEqual) {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixNoF3 => {
                if instruction.legacy_prefixes.contains(LegacyPrefix::RepeatEqual) {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixNoSimd => {
                let lp = &instruction.legacy_prefixes;
                if lp.contains(LegacyPrefix::RepeatEqual)
                    || lp.contains(LegacyPrefix::RepeatNotEqual)
                    || lp.contains(LegacyPrefix::OperandSizeOverride)
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixMustRep => {
                if instruction.simd_prefix != SimdPrefix::Rep {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixNoRep => {
                let lp = &instruction.legacy_prefixes;
                if lp.contains(LegacyPrefix::RepeatEqual)
                    || lp.contains(LegacyPrefix::RepeatNotEqual)
                {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::LegacyPrefixDisassembleRepAsRepE
            | TokenKind::LegacyPrefixHleAlways
            | TokenKind::LegacyPrefixHleWithLock
            | TokenKind::LegacyPrefixXReleaseAlways => {
                // Informational only; no matching effect.
            }

            TokenKind::Vex => {
                let Some(vex) = entry.vex_encoding else {
                    return MatchOutcome::NoMatch;
                };
                if instruction.xex.xex_type.family() != vex.xex_type().family() {
                    return MatchOutcome::NoMatch;
                }
                match vex.rex_w {
                    VexRexW::W0 if instruction.xex.operand_size_64 => return MatchOutcome::NoMatch,
                    VexRexW::W1 if !instruction.xex.operand_size_64 => {
                        return MatchOutcome::NoMatch
                    }
                    _ => {}
                }
                let expected_simd = match vex.simd_prefix {
                    VexSimdPrefix::None => SimdPrefix::None,
                    VexSimdPrefix::Op66 => SimdPrefix::Op66,
                    VexSimdPrefix::F2 => SimdPrefix::RepNe,
                    VexSimdPrefix::F3 => SimdPrefix::Rep,
                };
                if instruction.simd_prefix != expected_simd {
                    return MatchOutcome::NoMatch;
                }
                if vex.vector_length != VexVectorLength::Ignored {
                    match instruction.xex.vector_length {
                        Some(observed) if observed == vex.vector_length => {}
                        _ => return MatchOutcome::NoMatch,
                    }
                }
                ctx.expected_xex_family = vex.xex_type().family();
                ctx.expected_opcode_map = vex.map.to_opcode_map();
            }
            TokenKind::RexNoB => {
                if instruction.xex.base_reg_extension {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::RexNoW => {
                if instruction.xex.operand_size_64 {
                    return MatchOutcome::NoMatch;
                }
            }
            TokenKind::RexLockAsRexR => {
                // Informational only; no matching effect.
            }

            TokenKind::Byte => match byte_state_machine(
                &mut ctx,
                instruction,
                token.byte,
                up_to_opcode,
            ) {
                Ok(()) => {}
                Err(MatchOutcome::Unimplemented { reason, .. }) => {
                    return MatchOutcome::Unimplemented {
                        mnemonic: entry.mnemonic.clone(),
                        reason,
                    }
                }
                Err(outcome) => return outcome,
            },
            TokenKind::BytePlusConditionCode => {
                if ctx.state <= MatchState::PostOpcode {
                    if (instruction.main_byte & 0xF0) != token.byte {
                        return MatchOutcome::NoMatch;
                    }
                    ctx.advance_to(MatchState::PostOpcode);
                } else {
                    return MatchOutcome::Unimplemented {
                        mnemonic: entry.mnemonic.clone(),
                        reason: "+cc opcode suffix encountered past the opcode byte".to_string(),
                    };
                }
            }
            TokenKind::BytePlusRegister => {
                if ctx.state <= MatchState::PostOpcode {
                    if (instruction.main_byte & 0xF8) != token.byte {
                        return MatchOutcome::NoMatch;
                    }
                    ctx.advance_to(MatchState::PostOpcode);
                } else {
                    return MatchOutcome::Unimplemented {
                        mnemonic: entry.mnemonic.clone(),
                        reason: "+r opcode suffix encountered past the opcode byte".to_string(),
                    };
                }
            }

            TokenKind::ModRM => {
                if !up_to_opcode && instruction.modrm.is_none() {
                    return MatchOutcome::NoMatch;
                }
                ctx.has_modrm = true;
                ctx.advance_to(MatchState::PostModRM);
            }
            TokenKind::ModRMFixedReg => {
                if !up_to_opcode {
                    match instruction.modrm {
                        Some(modrm) if modrm.reg == token.byte => {}
                        _ => return MatchOutcome::NoMatch,
                    }
                }
                ctx.has_modrm = true;
                ctx.advance_to(MatchState::PostModRM);
            }

            TokenKind::VectorSibX
            | TokenKind::VectorSibXIndexOnly
            | TokenKind::VectorSibY
            | TokenKind::VectorSibYIndexOnly
            | TokenKind::VectorSibZ
            | TokenKind::VectorSibZIndexOnly => {
                if !up_to_opcode && instruction.sib.is_none() {
                    return MatchOutcome::NoMatch;
                }
            }

            TokenKind::ImmediateByte
            | TokenKind::ImmediateByteSigned
            | TokenKind::ImmediateByteUnsigned
            | TokenKind::ImmediateIs4
            | TokenKind::ImmediateRelativeOffset8
            | TokenKind::ImmediateWord
            | TokenKind::ImmediateDword
            | TokenKind::ImmediateDwordSigned
            | TokenKind::ImmediateQword
            | TokenKind::ImmediateRelativeOffset => {
                ctx.immediate_size += token.immediate_width(instruction.default_address_size.bits());
                ctx.advance_to(MatchState::Immediates);
            }

            TokenKind::MiscAssembleWaitPrefix | TokenKind::MiscNoHigh8Register => {
                // Informational only; no matching effect.
            }
        }
    }

    if let Some(outcome) = operand_postpass(entry, instruction) {
        return outcome;
    }

    let family_ok = if ctx.expected_xex_family == XexFamily::Escapes {
        instruction.xex.xex_type.allows_escapes()
    } else {
        instruction.xex.xex_type.family() == ctx.expected_xex_family
    };

    let accepted = ctx.state >= MatchState::PostOpcode
        && family_ok
        && instruction.opcode_map == ctx.expected_opcode_map
        && (up_to_opcode
            || (instruction.modrm.is_some() == ctx.has_modrm
                && instruction.immediate_size_in_bytes == ctx.immediate_size));

    if accepted {
        MatchOutcome::Matched {
            has_modrm: ctx.has_modrm,
            immediate_size: ctx.immediate_size,
        }
    } else {
        MatchOutcome::NoMatch
    }
}

/// The `Byte` token's state machine (spec §4.2). Returns `Ok(())` to
/// continue the token loop, or `Err(outcome)` to short-circuit the whole
/// match with a final result.
fn byte_state_machine(
    ctx: &mut MatchCtx,
    instruction: &Instruction,
    byte: u8,
    up_to_opcode: bool,
) -> Result<(), MatchOutcome> {
    if ctx.state < MatchState::PostSimdPrefix && matches!(byte, 0x66 | 0xF2 | 0xF3) {
        let prefix = match byte {
            0x66 => LegacyPrefix::OperandSizeOverride,
            0xF2 => LegacyPrefix::RepeatNotEqual,
            0xF3 => LegacyPrefix::RepeatEqual,
            _ => unreachable!(),
        };
        if !instruction.legacy_prefixes.ends_with(prefix) {
            return Err(MatchOutcome::NoMatch);
        }
        ctx.advance_to(MatchState::PostSimdPrefix);
        return Ok(());
    }

    if ctx.state < MatchState::Escape0F && byte == 0x0F {
        if !instruction.xex.xex_type.allows_escapes() {
            return Err(MatchOutcome::NoMatch);
        }
        ctx.expected_opcode_map = OpcodeMap::Escape0F;
        ctx.advance_to(MatchState::Escape0F);
        return Ok(());
    }

    if ctx.state == MatchState::Escape0F && matches!(byte, 0x38 | 0x3A) {
        ctx.expected_opcode_map = if byte == 0x38 {
            OpcodeMap::Escape0F38
        } else {
            OpcodeMap::Escape0F3A
        };
        ctx.advance_to(MatchState::PostEscape);
        return Ok(());
    }

    if ctx.state < MatchState::PostOpcode {
        if instruction.main_byte != byte {
            return Err(MatchOutcome::NoMatch);
        }
        ctx.advance_to(MatchState::PostOpcode);
        return Ok(());
    }

    if ctx.state == MatchState::PostOpcode {
        // A `Byte` token here is a literal ModR/M value.
        if !up_to_opcode {
            match instruction.modrm {
                Some(modrm) if modrm.to_byte() == byte => {}
                _ => return Err(MatchOutcome::NoMatch),
            }
        }
        ctx.has_modrm = true;
        ctx.advance_to(MatchState::PostModRM);
        return Ok(());
    }

    Err(MatchOutcome::Unimplemented {
        mnemonic: String::new(),
        reason: "constant immediate byte after ModR/M is not verified against the immediate \
                 stream"
            .to_string(),
    })
}

/// Spec §4.2 operand post-pass: for each `BaseReg` operand, its
/// register-vs-memory classification must agree with whether ModR/M
/// actually encodes a direct register.
fn operand_postpass(entry: &NasmInsnsEntry, instruction: &Instruction) -> Option<MatchOutcome> {
    let is_reg = instruction
        .modrm
        .map(|modrm| modrm.is_direct())
        .unwrap_or(true);
    for (field, optype) in &entry.operands {
        if *field != crate::entry::OperandField::BaseReg {
            continue;
        }
        if optype.requires_register() && !is_reg {
            return Some(MatchOutcome::NoMatch);
        }
        if optype.requires_memory() && is_reg {
            return Some(MatchOutcome::NoMatch);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_size::AddressSize;
    use crate::entry::NasmInstructionFlag;
    use crate::legacy_prefix::LegacyPrefixList;
    use crate::modrm::ModRm;
    use crate::xex::Xex;

    /// An x87-style instruction whose second opcode byte is itself a
    /// complete, fixed ModR/M byte (e.g. `FCHS`, `D9 E0`), rather than a
    /// `/n` fixed-reg or a fully variable ModR/M.
    fn fixed_modrm_byte_entry() -> NasmInsnsEntry {
        NasmInsnsEntry {
            mnemonic: "FCHS".to_string(),
            encoding_tokens: vec![
                NasmEncodingToken::with_byte(TokenKind::Byte, 0xD9),
                NasmEncodingToken::with_byte(TokenKind::Byte, 0xE0),
            ],
            operands: vec![],
            vex_encoding: None,
            evex_tuple_type: None,
            flags: NasmInstructionFlag::FPU,
            source_line: "FCHS void [void: d9 e0] FPU".to_string(),
        }
    }

    fn base_instruction(main_byte: u8) -> Instruction {
        Instruction {
            default_address_size: AddressSize::Bits32,
            effective_address_size: AddressSize::Bits32,
            legacy_prefixes: LegacyPrefixList::new(),
            xex: Xex::escapes(),
            opcode_map: crate::opcode_map::OpcodeMap::Default,
            main_byte,
            modrm: None,
            sib: None,
            simd_prefix: SimdPrefix::None,
            immediate_size_in_bytes: 0,
        }
    }

    #[test]
    fn second_literal_byte_in_modrm_position_is_checked_and_sets_has_modrm() {
        let entry = fixed_modrm_byte_entry();
        let mut instruction = base_instruction(0xD9);
        instruction.modrm = Some(ModRm::from_byte(0xE0));

        assert_eq!(
            match_entry(&entry, &instruction, false),
            MatchOutcome::Matched {
                has_modrm: true,
                immediate_size: 0,
            }
        );
    }

    #[test]
    fn second_literal_byte_in_modrm_position_rejects_a_mismatched_byte() {
        let entry = fixed_modrm_byte_entry();
        let mut instruction = base_instruction(0xD9);
        instruction.modrm = Some(ModRm::from_byte(0xE1));

        assert_eq!(match_entry(&entry, &instruction, false), MatchOutcome::NoMatch);
    }

    #[test]
    fn second_literal_byte_in_modrm_position_is_unchecked_up_to_opcode() {
        let entry = fixed_modrm_byte_entry();
        let instruction = base_instruction(0xD9);

        assert_eq!(
            match_entry(&entry, &instruction, true),
            MatchOutcome::Matched {
                has_modrm: true,
                immediate_size: 0,
            }
        );
    }

    #[test]
    fn byte_after_modrm_is_still_reported_as_unimplemented() {
        let mut entry = fixed_modrm_byte_entry();
        entry
            .encoding_tokens
            .push(NasmEncodingToken::with_byte(TokenKind::Byte, 0x00));
        let mut instruction = base_instruction(0xD9);
        instruction.modrm = Some(ModRm::from_byte(0xE0));

        match match_entry(&entry, &instruction, false) {
            MatchOutcome::Unimplemented { mnemonic, .. } => assert_eq!(mnemonic, "FCHS"),
            other => panic!("expected Unimplemented, got {other:?}"),
        }
    }
}
