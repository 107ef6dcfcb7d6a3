//! End-to-end parse-then-match scenarios against literal `insns.dat` lines.

use nasm_insns::{
    AddressSize, Instruction, LegacyPrefix, LegacyPrefixList, LookupOutcome, ModRm,
    NasmInsnsDatabase, OpcodeMap, SimdPrefix, Xex, XexType,
};

fn base_instruction(main_byte: u8) -> Instruction {
    Instruction {
        default_address_size: AddressSize::Bits32,
        effective_address_size: AddressSize::Bits32,
        legacy_prefixes: LegacyPrefixList::new(),
        xex: Xex::escapes(),
        opcode_map: OpcodeMap::Default,
        main_byte,
        modrm: None,
        sib: None,
        simd_prefix: SimdPrefix::None,
        immediate_size_in_bytes: 0,
    }
}

#[test]
fn add_rm32_imm8() {
    let db = NasmInsnsDatabase::from_str("ADD rm32,imm8 [mi: o32 83 /0 ib,s] 8086,LOCK\n").unwrap();
    let mut instruction = base_instruction(0x83);
    instruction.modrm = Some(ModRm::from_byte(0xC0));
    instruction.immediate_size_in_bytes = 1;

    let outcome = db.lookup(&instruction, false);
    assert_eq!(
        outcome,
        LookupOutcome::Matched {
            entry: &db.entries()[0],
            has_modrm: true,
            immediate_size: 1,
        }
    );
}

#[test]
fn mov_r32_imm32() {
    let db = NasmInsnsDatabase::from_str("MOV reg32,imm32 [ri: o32 b8+r id] 386\n").unwrap();
    let mut instruction = base_instruction(0xBA); // b8 + register 2
    instruction.immediate_size_in_bytes = 4;

    let outcome = db.lookup(&instruction, false);
    assert_eq!(
        outcome,
        LookupOutcome::Matched {
            entry: &db.entries()[0],
            has_modrm: false,
            immediate_size: 4,
        }
    );
}

#[test]
fn vaddps_vex_nds() {
    let db = NasmInsnsDatabase::from_str(
        "VADDPS xmmreg,xmmreg,xmmrm128 [rvm: vex.nds.128.0f.wig 58 /r] AVX\n",
    )
    .unwrap();
    let mut instruction = base_instruction(0x58);
    instruction.xex = Xex::vex(
        XexType::Vex3,
        false,
        false,
        nasm_insns::VexVectorLength::Len128,
    );
    instruction.opcode_map = OpcodeMap::Escape0F;
    instruction.modrm = Some(ModRm::from_byte(0xC1));

    let outcome = db.lookup(&instruction, false);
    assert_eq!(
        outcome,
        LookupOutcome::Matched {
            entry: &db.entries()[0],
            has_modrm: true,
            immediate_size: 0,
        }
    );
}

#[test]
fn jcc_short() {
    let db = NasmInsnsDatabase::from_str("Jcc imm [i: 70+c rb] 8086\n").unwrap();
    let mut instruction = base_instruction(0x74); // 70 | Equal
    instruction.immediate_size_in_bytes = 1;

    let outcome = db.lookup(&instruction, false);
    assert_eq!(
        outcome,
        LookupOutcome::Matched {
            entry: &db.entries()[0],
            has_modrm: false,
            immediate_size: 1,
        }
    );
}

#[test]
fn add_with_wrong_operand_size_does_not_match() {
    let db = NasmInsnsDatabase::from_str("ADD rm32,imm8 [mi: o32 83 /0 ib,s] 8086,LOCK\n").unwrap();
    let mut instruction = base_instruction(0x83);
    instruction.modrm = Some(ModRm::from_byte(0xC0));
    instruction.immediate_size_in_bytes = 1;
    instruction
        .legacy_prefixes
        .push(LegacyPrefix::OperandSizeOverride);

    assert_eq!(db.lookup(&instruction, false), LookupOutcome::NoMatch);
}

#[test]
fn movsd_two_byte_escape() {
    let db =
        NasmInsnsDatabase::from_str("MOVSD xmmreg,xmmrm64 [rm: f2i 0f 10 /r] SSE2\n").unwrap();
    let mut instruction = base_instruction(0x10);
    instruction
        .legacy_prefixes
        .push(LegacyPrefix::RepeatNotEqual);
    instruction.opcode_map = OpcodeMap::Escape0F;
    instruction.modrm = Some(ModRm::from_byte(0xC1));

    let outcome = db.lookup(&instruction, false);
    assert_eq!(
        outcome,
        LookupOutcome::Matched {
            entry: &db.entries()[0],
            has_modrm: true,
            immediate_size: 0,
        }
    );
}
