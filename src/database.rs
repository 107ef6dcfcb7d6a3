//! The instruction database: the parsed entry table plus the lookup façade
//! that runs the matcher over every entry (spec §6-7, C6-C7).

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::entry::NasmInsnsEntry;
use crate::error::NasmDatabaseError;
use crate::instruction::Instruction;
use crate::matcher::{match_entry, MatchOutcome};
use crate::parser::parse_line;

/// The result of looking an instruction up against every entry in a
/// database (spec §6, §9).
///
/// Multiple simultaneous matches are possible for a hand-authored table
/// like `insns.dat` (overlapping entries exist, e.g. assembler-convenience
/// aliases). When every matching entry agrees on `has_modrm`/`immediate_size`
/// this still resolves as a plain `Matched`, the last entry in database order
/// winning (spec §4.3); [`LookupOutcome::Ambiguous`] is reserved for the case
/// where the matching entries actually disagree on those derived values.
#[derive(Clone, Debug, PartialEq)]
pub enum LookupOutcome<'a> {
    Matched {
        entry: &'a NasmInsnsEntry,
        has_modrm: bool,
        immediate_size: u32,
    },
    NoMatch,
    Ambiguous {
        entry: &'a NasmInsnsEntry,
        has_modrm: bool,
        immediate_size: u32,
        candidates: Vec<&'a NasmInsnsEntry>,
    },
    /// At least one entry's token stream reached a branch the matcher
    /// deliberately leaves unresolved (spec §9), and no entry matched
    /// outright.
    Unimplemented { mnemonic: String, reason: String },
}

impl<'a> LookupOutcome<'a> {
    pub fn entry(&self) -> Option<&'a NasmInsnsEntry> {
        match self {
            LookupOutcome::Matched { entry, .. } | LookupOutcome::Ambiguous { entry, .. } => {
                Some(entry)
            }
            LookupOutcome::NoMatch | LookupOutcome::Unimplemented { .. } => None,
        }
    }
}

/// Runs `instruction` against every entry in `entries`, in order, and
/// reconciles the results (spec §6 `try_lookup`).
///
/// Multiple entries matching the same instruction is only reported as
/// [`LookupOutcome::Ambiguous`] when their derived `has_modrm`/`immediate_size`
/// actually disagree; ties that agree on both resolve as a plain `Matched`,
/// with the last entry in database order winning (spec §4.3).
pub fn try_lookup<'a>(
    entries: &'a [NasmInsnsEntry],
    instruction: &Instruction,
    up_to_opcode: bool,
) -> LookupOutcome<'a> {
    let mut matched: Vec<&NasmInsnsEntry> = Vec::new();
    let mut has_modrm = false;
    let mut immediate_size = 0;
    let mut diverges = false;
    let mut unimplemented: Option<(String, String)> = None;

    for entry in entries {
        match match_entry(entry, instruction, up_to_opcode) {
            MatchOutcome::Matched {
                has_modrm: hm,
                immediate_size: sz,
            } => {
                if !matched.is_empty() && (hm != has_modrm || sz != immediate_size) {
                    diverges = true;
                }
                matched.push(entry);
                has_modrm = hm;
                immediate_size = sz;
            }
            MatchOutcome::Unimplemented { mnemonic, reason } => {
                tracing::debug!(mnemonic = %mnemonic, reason = %reason, "entry left unresolved by matcher");
                unimplemented.get_or_insert((mnemonic, reason));
            }
            MatchOutcome::NoMatch => {}
        }
    }

    match matched.last().copied() {
        Some(winner) if matched.len() == 1 || !diverges => LookupOutcome::Matched {
            entry: winner,
            has_modrm,
            immediate_size,
        },
        Some(winner) => {
            tracing::warn!(
                mnemonic = %winner.mnemonic,
                candidates = matched.len(),
                "ambiguous lookup, last entry in database order wins"
            );
            LookupOutcome::Ambiguous {
                entry: winner,
                has_modrm,
                immediate_size,
                candidates: matched,
            }
        }
        None => match unimplemented {
            Some((mnemonic, reason)) => LookupOutcome::Unimplemented { mnemonic, reason },
            None => LookupOutcome::NoMatch,
        },
    }
}

/// An immutable, parsed `insns.dat` table (spec §3 `NasmInsnsDatabase`).
///
/// Construction is the only place that can fail or observe I/O; once
/// built, the database is read-only and every lookup is a pure function
/// safe to call from multiple threads concurrently (spec §5).
#[derive(Clone, Debug, Default)]
pub struct NasmInsnsDatabase {
    entries: Vec<NasmInsnsEntry>,
}

impl NasmInsnsDatabase {
    pub fn entries(&self) -> &[NasmInsnsEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `instruction` against every entry (spec §6).
    pub fn lookup(&self, instruction: &Instruction, up_to_opcode: bool) -> LookupOutcome<'_> {
        try_lookup(&self.entries, instruction, up_to_opcode)
    }

    /// Parses an entire `insns.dat` document, failing on the first error
    /// (spec §7).
    #[tracing::instrument(skip(reader))]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, NasmDatabaseError> {
        let mut entries = Vec::new();
        for (number, text) in BufReader::new(reader).lines().enumerate() {
            let text = text.map_err(NasmDatabaseError::from)?;
            let line_number = number + 1;
            match parse_line(&text) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(kind) => return Err(NasmDatabaseError::parse(line_number, text, kind)),
            }
        }
        tracing::info!(entries = entries.len(), "parsed instruction database");
        Ok(NasmInsnsDatabase { entries })
    }

    /// Parses an entire `insns.dat` document, collecting every line that
    /// failed to parse instead of stopping at the first one (spec §7).
    /// Returns the entries that did parse alongside the collected errors.
    #[tracing::instrument(skip(reader))]
    pub fn from_reader_lenient<R: Read>(reader: R) -> (Self, Vec<NasmDatabaseError>) {
        let mut entries = Vec::new();
        let mut errors = Vec::new();
        for (number, text) in BufReader::new(reader).lines().enumerate() {
            let line_number = number + 1;
            let text = match text {
                Ok(text) => text,
                Err(io_err) => {
                    errors.push(NasmDatabaseError::from(io_err));
                    continue;
                }
            };
            match parse_line(&text) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(kind) => errors.push(NasmDatabaseError::parse(line_number, text, kind)),
            }
        }
        tracing::info!(
            entries = entries.len(),
            errors = errors.len(),
            "parsed instruction database leniently"
        );
        (NasmInsnsDatabase { entries }, errors)
    }

    pub fn from_str(text: &str) -> Result<Self, NasmDatabaseError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NasmDatabaseError> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| io_error_with_path(path, e))?;
        Self::from_reader(file)
    }
}

fn io_error_with_path(path: &Path, err: io::Error) -> NasmDatabaseError {
    NasmDatabaseError::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
ADD rm32,imm8 [mi: o32 83 /0 ib,s] 386
MOV reg32,imm32 [ri: o32 b8+r id] 386
Jcc imm [i: 70+c rb] 8086
; a comment line should be skipped

";

    #[test]
    fn from_str_parses_all_entries_and_skips_blanks_and_comments() {
        let db = NasmInsnsDatabase::from_str(TABLE).unwrap();
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn from_reader_fails_fast_on_first_bad_line() {
        let bad = "ADD rm32,imm8 [mi: o32 83 /0 ib,s] 386\nbadmnemonic void ignore ignore\n";
        let err = NasmInsnsDatabase::from_reader(bad.as_bytes()).unwrap_err();
        match err {
            NasmDatabaseError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn from_reader_lenient_collects_every_error_and_keeps_good_entries() {
        let text = "ADD rm32,imm8 [mi: o32 83 /0 ib,s] 386\nbadmnemonic void ignore ignore\nMOV reg32,imm32 [ri: o32 b8+r id] 386\n";
        let (db, errors) = NasmInsnsDatabase::from_reader_lenient(text.as_bytes());
        assert_eq!(db.len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn lookup_reports_no_match_on_empty_database() {
        let db = NasmInsnsDatabase::from_str("").unwrap();
        let instruction = Instruction {
            default_address_size: crate::address_size::AddressSize::Bits32,
            effective_address_size: crate::address_size::AddressSize::Bits32,
            legacy_prefixes: crate::legacy_prefix::LegacyPrefixList::new(),
            xex: crate::xex::Xex::escapes(),
            opcode_map: crate::opcode_map::OpcodeMap::Default,
            main_byte: 0x90,
            modrm: None,
            sib: None,
            simd_prefix: crate::address_size::SimdPrefix::None,
            immediate_size_in_bytes: 0,
        };
        assert_eq!(db.lookup(&instruction, false), LookupOutcome::NoMatch);
    }
}
