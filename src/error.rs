//! Structured errors for database construction (spec §7, §10.2).
//!
//! Matching itself does not raise errors — `NoMatch` is a normal negative
//! result and lives in [`crate::matcher::MatchOutcome`], and an ambiguous
//! lookup is a variant of [`crate::database::LookupOutcome`] — both are
//! ordinary return values, not `std::error::Error` implementors, since
//! "this entry doesn't match" or "two entries tie" are expected outcomes of
//! calling these APIs, not bugs.

use thiserror::Error;

/// Why a single `insns.dat` line failed to parse (spec §4.1, §7).
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseErrorKind {
    #[error("expected 4 whitespace-separated columns, found {found}")]
    WrongColumnCount { found: usize },

    #[error("mnemonic {mnemonic:?} does not match /[A-Z_0-9]+(cc)?/")]
    InvalidMnemonic { mnemonic: String },

    #[error("unrecognised encoding token {token:?}")]
    UnknownEncodingToken { token: String },

    #[error("code-string is missing its closing ']'")]
    UnterminatedCodeString,

    #[error("operand values list has {values} entries but field-chars has {fields}")]
    OperandFieldLengthMismatch { values: usize, fields: usize },

    #[error("unknown operand field character {0:?}")]
    UnknownOperandField(char),

    #[error("unknown NASM EVEX tuple type {0:?}")]
    UnknownEVexTupleType(String),

    #[error("unknown instruction flag {0:?}")]
    UnknownInstructionFlag(String),

    #[error("malformed vex/xop/evex descriptor {descriptor:?}: {reason}")]
    MalformedVexDescriptor { descriptor: String, reason: String },

    #[error("missing mandatory map component in vex/xop/evex descriptor {0:?}")]
    MissingVexMap(String),

    #[error("malformed code-string {text:?}: {reason}")]
    MalformedCodeString { text: String, reason: String },
}

/// A database-construction error, carrying enough context (line number and
/// text) to find and fix the offending `insns.dat` line (spec §7).
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum NasmDatabaseError {
    #[error("line {line}: {source}\n  {text}")]
    Parse {
        line: usize,
        text: String,
        #[source]
        source: ParseErrorKind,
    },

    #[error("I/O error reading instruction database: {0}")]
    Io(String),
}

impl NasmDatabaseError {
    pub fn parse(line: usize, text: impl Into<String>, source: ParseErrorKind) -> Self {
        NasmDatabaseError::Parse {
            line,
            text: text.into(),
            source,
        }
    }
}

impl From<std::io::Error> for NasmDatabaseError {
    fn from(err: std::io::Error) -> Self {
        NasmDatabaseError::Io(err.to_string())
    }
}
