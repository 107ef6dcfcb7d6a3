//! Property tests over the matcher's and parser's core invariants:
//! generated partial instructions are checked against a small fixed table
//! rather than fuzzing the parser itself, since most of the properties
//! below are about matcher behaviour, not about `insns.dat` syntax; the
//! printer round-trip property instead picks among a handful of
//! representative already-parsed entries.

use nasm_insns::{
    match_entry, parser, AddressSize, Instruction, LegacyPrefix, LegacyPrefixList, MatchOutcome,
    ModRm, NasmInsnsDatabase, OpcodeMap, SimdPrefix, TokenKind, Xex,
};
use proptest::prelude::*;

const TABLE: &str = "\
ADD rm32,imm8 [mi: o32 83 /0 ib,s] 8086,LOCK
MOV reg32,imm32 [ri: o32 b8+r id] 386
Jcc imm [i: 70+c rb] 8086
MOVSD xmmreg,xmmrm64 [rm: f2i 0f 10 /r] SSE2
VADDPS xmmreg,xmmreg,xmmrm128 [rvm: vex.nds.128.0f.wig 58 /r] AVX
RESB imm [ignore] ignore
";

fn arbitrary_instruction() -> impl Strategy<Value = Instruction> {
    (
        prop_oneof![
            Just(AddressSize::Bits16),
            Just(AddressSize::Bits32),
            Just(AddressSize::Bits64),
        ],
        any::<u8>(),
        any::<bool>(),
        any::<u8>(),
        0u32..8,
        any::<bool>(),
    )
        .prop_map(
            |(address_size, main_byte, has_modrm, modrm_byte, immediate_size, has_f2)| {
                let mut legacy_prefixes = LegacyPrefixList::new();
                if has_f2 {
                    legacy_prefixes.push(LegacyPrefix::RepeatNotEqual);
                }
                Instruction {
                    default_address_size: address_size,
                    effective_address_size: address_size,
                    legacy_prefixes,
                    xex: Xex::escapes(),
                    opcode_map: if main_byte == 0x10 {
                        OpcodeMap::Escape0F
                    } else {
                        OpcodeMap::Default
                    },
                    main_byte,
                    modrm: has_modrm.then(|| ModRm::from_byte(modrm_byte)),
                    sib: None,
                    simd_prefix: SimdPrefix::None,
                    immediate_size_in_bytes: immediate_size,
                }
            },
        )
}

proptest! {
    /// Spec §8 invariant 6: the matcher is a pure function.
    #[test]
    fn matcher_is_pure(instruction in arbitrary_instruction()) {
        let db = NasmInsnsDatabase::from_str(TABLE).unwrap();
        for entry in db.entries() {
            prop_assert_eq!(
                match_entry(entry, &instruction, false),
                match_entry(entry, &instruction, false)
            );
        }
    }

    /// Spec §8 invariant 7: an `up_to_opcode` rejection can never be undone
    /// by decoding further bytes of the same instruction.
    #[test]
    fn up_to_opcode_rejection_is_never_undone_by_extending(instruction in arbitrary_instruction()) {
        let db = NasmInsnsDatabase::from_str(TABLE).unwrap();
        for entry in db.entries() {
            if match_entry(entry, &instruction, true) == MatchOutcome::NoMatch {
                let mut extended = instruction.clone();
                extended.modrm = Some(ModRm::from_byte(0xC0));
                extended.immediate_size_in_bytes += 1;
                prop_assert_eq!(match_entry(entry, &extended, false), MatchOutcome::NoMatch);
            }
        }
    }

    /// Spec §8 invariant 2, as observed through the public API: a fully
    /// matched entry always carries an opcode-establishing token, i.e. the
    /// matcher never accepts an entry that never reached `PostOpcode`.
    #[test]
    fn matched_entries_carry_an_opcode_token(instruction in arbitrary_instruction()) {
        let db = NasmInsnsDatabase::from_str(TABLE).unwrap();
        for entry in db.entries() {
            if let MatchOutcome::Matched { .. } = match_entry(entry, &instruction, false) {
                prop_assert!(entry.encoding_tokens.iter().any(|t| matches!(
                    t.kind,
                    TokenKind::Byte | TokenKind::BytePlusRegister | TokenKind::BytePlusConditionCode
                )));
            }
        }
    }

    /// Spec §8 invariant 5: printing an entry's code-string and re-parsing
    /// it reproduces the same encoding tokens, EVEX tuple type, and VEX
    /// descriptor for every entry the printer covers (plain opcodes,
    /// ModR/M-fixed-reg, and VEX-descriptor entries alike).
    #[test]
    fn entries_round_trip_through_the_printer(index in 0usize..6) {
        let db = NasmInsnsDatabase::from_str(TABLE).unwrap();
        let entry = &db.entries()[index];
        prop_assert!(parser::round_trips_through_printer(entry));
    }
}
