//! Parsing and recognition of x86 / x86-64 machine instruction encodings
//! as described by NASM's `insns.dat` table format.
//!
//! The crate is split into two tightly coupled halves:
//!
//! - [`parser`] turns one textual `insns.dat` line into a [`entry::NasmInsnsEntry`],
//!   including the compact dotted VEX/XOP/EVEX descriptor.
//! - [`matcher`] runs an entry's encoding-token stream as a declarative matcher
//!   against a partially decoded [`instruction::Instruction`], deriving whether a
//!   ModR/M byte is present and how many immediate bytes follow.
//!
//! [`database::NasmInsnsDatabase`] ties both halves together: it owns the parsed
//! entry list and exposes the lookup façade that runs the matcher over every
//! entry for a given partial instruction.

pub mod address_size;
pub mod condition_code;
pub mod database;
pub mod entry;
pub mod error;
pub mod instruction;
pub mod legacy_prefix;
pub mod matcher;
pub mod modrm;
pub mod opcode_map;
pub mod parser;
pub mod token;
pub mod vex;
pub mod xex;

pub use address_size::{AddressSize, OperandSize, SimdPrefix};
pub use condition_code::ConditionCode;
pub use database::{LookupOutcome, NasmInsnsDatabase};
pub use entry::{
    NasmEVexTupleType, NasmInsnsEntry, NasmInstructionFlag, OperandField, OperandType,
};
pub use error::{NasmDatabaseError, ParseErrorKind};
pub use instruction::Instruction;
pub use legacy_prefix::{LegacyPrefix, LegacyPrefixGroup, LegacyPrefixList};
pub use matcher::{match_entry, MatchOutcome};
pub use modrm::{Mod, ModRm, Sib};
pub use opcode_map::OpcodeMap;
pub use token::{NasmEncodingToken, TokenKind};
pub use vex::{
    NonDestructiveReg, VexMap, VexOpcodeEncoding, VexRexW, VexSimdPrefix, VexType, VexVectorLength,
};
pub use xex::{Xex, XexFamily, XexType};
