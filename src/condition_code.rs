//! x86 condition codes: the 4-bit field driving `Jcc`/`SETcc`/`CMOVcc` and,
//! via the `+cc` encoding-token suffix, condition-code instruction families
//! in the NASM table.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// One of the 16 x86 condition codes. Several source-level aliases (e.g.
/// `Below` / `Carry`, `Equal` / `Zero`) share the same underlying nibble; we
/// model that as named constructors rather than duplicate enum variants, so
/// there is exactly one canonical variant per value (spec §9).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ConditionCode {
    Overflow = 0x0,
    NotOverflow = 0x1,
    Below = 0x2,
    AboveOrEqual = 0x3,
    Equal = 0x4,
    NotEqual = 0x5,
    BelowOrEqual = 0x6,
    Above = 0x7,
    Sign = 0x8,
    NotSign = 0x9,
    Parity = 0xA,
    NotParity = 0xB,
    Less = 0xC,
    GreaterOrEqual = 0xD,
    LessOrEqual = 0xE,
    Greater = 0xF,
}

impl ConditionCode {
    // Named aliases for the canonical variants above (spec §9).
    pub const CARRY: ConditionCode = ConditionCode::Below;
    pub const NOT_CARRY: ConditionCode = ConditionCode::AboveOrEqual;
    pub const ZERO: ConditionCode = ConditionCode::Equal;
    pub const NOT_ZERO: ConditionCode = ConditionCode::NotEqual;
    pub const PARITY_EVEN: ConditionCode = ConditionCode::Parity;
    pub const PARITY_ODD: ConditionCode = ConditionCode::NotParity;

    const ALL: [ConditionCode; 16] = [
        ConditionCode::Overflow,
        ConditionCode::NotOverflow,
        ConditionCode::Below,
        ConditionCode::AboveOrEqual,
        ConditionCode::Equal,
        ConditionCode::NotEqual,
        ConditionCode::BelowOrEqual,
        ConditionCode::Above,
        ConditionCode::Sign,
        ConditionCode::NotSign,
        ConditionCode::Parity,
        ConditionCode::NotParity,
        ConditionCode::Less,
        ConditionCode::GreaterOrEqual,
        ConditionCode::LessOrEqual,
        ConditionCode::Greater,
    ];

    /// Builds a condition code from its 4-bit nibble (`main_byte & 0x0F` for
    /// a `Byte_PlusConditionCode` token).
    pub fn from_nibble(nibble: u8) -> ConditionCode {
        Self::ALL[(nibble & 0x0F) as usize]
    }

    pub fn as_nibble(self) -> u8 {
        self as u8
    }

    /// The logical negation of this condition: flips the low bit, so that
    /// e.g. `Below` (2) becomes `AboveOrEqual` (3).
    pub fn negate(self) -> ConditionCode {
        Self::from_nibble(self.as_nibble() ^ 1)
    }

    /// The EFLAGS bits this condition tests, as a human-readable mnemonic
    /// list (e.g. `"ZF"`, `"CF,ZF"`).
    pub fn tested_eflags(self) -> &'static str {
        match self {
            ConditionCode::Overflow | ConditionCode::NotOverflow => "OF",
            ConditionCode::Below | ConditionCode::AboveOrEqual => "CF",
            ConditionCode::Equal | ConditionCode::NotEqual => "ZF",
            ConditionCode::BelowOrEqual | ConditionCode::Above => "CF,ZF",
            ConditionCode::Sign | ConditionCode::NotSign => "SF",
            ConditionCode::Parity | ConditionCode::NotParity => "PF",
            ConditionCode::Less | ConditionCode::GreaterOrEqual => "SF,OF",
            ConditionCode::LessOrEqual | ConditionCode::Greater => "SF,OF,ZF",
        }
    }

    /// True for the four conditions defined in terms of an unsigned
    /// comparison (`cc in {2,3,6,7}`, spec §8 invariant 4).
    pub fn is_unsigned_comparison(self) -> bool {
        matches!(
            self,
            ConditionCode::Below
                | ConditionCode::AboveOrEqual
                | ConditionCode::BelowOrEqual
                | ConditionCode::Above
        )
    }

    /// True for the four conditions defined in terms of a signed comparison
    /// (`cc in {C,D,E,F}`, spec §8 invariant 4).
    pub fn is_signed_comparison(self) -> bool {
        matches!(
            self,
            ConditionCode::Less
                | ConditionCode::GreaterOrEqual
                | ConditionCode::LessOrEqual
                | ConditionCode::Greater
        )
    }

    /// The two-letter (or longer) mnemonic suffix used after `J`/`SET`/`CMOV`.
    pub fn mnemonic_suffix(self) -> &'static str {
        match self {
            ConditionCode::Overflow => "o",
            ConditionCode::NotOverflow => "no",
            ConditionCode::Below => "b",
            ConditionCode::AboveOrEqual => "ae",
            ConditionCode::Equal => "e",
            ConditionCode::NotEqual => "ne",
            ConditionCode::BelowOrEqual => "be",
            ConditionCode::Above => "a",
            ConditionCode::Sign => "s",
            ConditionCode::NotSign => "ns",
            ConditionCode::Parity => "p",
            ConditionCode::NotParity => "np",
            ConditionCode::Less => "l",
            ConditionCode::GreaterOrEqual => "ge",
            ConditionCode::LessOrEqual => "le",
            ConditionCode::Greater => "g",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_is_an_involution_that_flips_the_low_bit() {
        for &cc in ConditionCode::ALL.iter() {
            assert_eq!(cc.negate().negate(), cc);
            assert_eq!(cc.negate().as_nibble() ^ cc.as_nibble(), 1);
        }
    }

    #[test]
    fn signed_and_unsigned_comparisons_are_disjoint_and_cover_exactly_eight_codes() {
        let count = ConditionCode::ALL
            .iter()
            .filter(|cc| cc.is_unsigned_comparison() ^ cc.is_signed_comparison())
            .count();
        assert_eq!(count, 8);
    }

    #[test]
    fn aliases_share_the_underlying_value() {
        assert_eq!(ConditionCode::CARRY, ConditionCode::Below);
        assert_eq!(ConditionCode::ZERO.as_nibble(), ConditionCode::Equal.as_nibble());
    }

    #[test]
    fn from_nibble_round_trips() {
        for &cc in ConditionCode::ALL.iter() {
            assert_eq!(ConditionCode::from_nibble(cc.as_nibble()), cc);
        }
    }
}
