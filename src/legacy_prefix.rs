//! Legacy instruction prefixes and the ordered list that collects them.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A single legacy (pre-REX/VEX) instruction prefix byte.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LegacyPrefix {
    /// `0xF0` LOCK.
    Lock,
    /// `0xF2` REPNE/REPNZ (also the SSE "F2" SIMD prefix).
    RepeatNotEqual,
    /// `0xF3` REP/REPE/REPZ (also the SSE "F3" SIMD prefix).
    RepeatEqual,
    /// `0x2E` CS segment override.
    SegmentCs,
    /// `0x36` SS segment override.
    SegmentSs,
    /// `0x3E` DS segment override.
    SegmentDs,
    /// `0x26` ES segment override.
    SegmentEs,
    /// `0x64` FS segment override.
    SegmentFs,
    /// `0x65` GS segment override.
    SegmentGs,
    /// `0x66` operand-size override (also the SSE "66" SIMD prefix).
    OperandSizeOverride,
    /// `0x67` address-size override.
    AddressSizeOverride,
}

impl LegacyPrefix {
    /// The byte value of this prefix.
    pub fn byte(self) -> u8 {
        match self {
            LegacyPrefix::Lock => 0xF0,
            LegacyPrefix::RepeatNotEqual => 0xF2,
            LegacyPrefix::RepeatEqual => 0xF3,
            LegacyPrefix::SegmentCs => 0x2E,
            LegacyPrefix::SegmentSs => 0x36,
            LegacyPrefix::SegmentDs => 0x3E,
            LegacyPrefix::SegmentEs => 0x26,
            LegacyPrefix::SegmentFs => 0x64,
            LegacyPrefix::SegmentGs => 0x65,
            LegacyPrefix::OperandSizeOverride => 0x66,
            LegacyPrefix::AddressSizeOverride => 0x67,
        }
    }

    /// The disjoint group this prefix belongs to. At most one prefix per
    /// group may appear in a [`LegacyPrefixList`].
    pub fn group(self) -> LegacyPrefixGroup {
        match self {
            LegacyPrefix::Lock | LegacyPrefix::RepeatNotEqual | LegacyPrefix::RepeatEqual => {
                LegacyPrefixGroup::LockOrRepeat
            }
            LegacyPrefix::SegmentCs
            | LegacyPrefix::SegmentSs
            | LegacyPrefix::SegmentDs
            | LegacyPrefix::SegmentEs
            | LegacyPrefix::SegmentFs
            | LegacyPrefix::SegmentGs => LegacyPrefixGroup::Segment,
            LegacyPrefix::OperandSizeOverride => LegacyPrefixGroup::OperandSizeOverride,
            LegacyPrefix::AddressSizeOverride => LegacyPrefixGroup::AddressSizeOverride,
        }
    }
}

/// The four disjoint groups legacy prefixes are partitioned into.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LegacyPrefixGroup {
    LockOrRepeat,
    Segment,
    OperandSizeOverride,
    AddressSizeOverride,
}

/// An ordered sequence of at most four distinct legacy prefixes, in the
/// order they appeared in the instruction byte stream.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LegacyPrefixList {
    prefixes: Vec<LegacyPrefix>,
}

impl LegacyPrefixList {
    /// An empty prefix list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from prefixes in byte-stream order. At most one prefix
    /// per [`LegacyPrefixGroup`] and at most four prefixes total are kept;
    /// callers that need strict validation should check `len()` themselves.
    pub fn from_prefixes(prefixes: impl IntoIterator<Item = LegacyPrefix>) -> Self {
        let mut list = Self::new();
        for p in prefixes {
            list.push(p);
        }
        list
    }

    /// Appends a prefix, preserving order.
    pub fn push(&mut self, prefix: LegacyPrefix) {
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LegacyPrefix> + '_ {
        self.prefixes.iter().copied()
    }

    /// Whether `prefix` appears anywhere in the list.
    pub fn contains(&self, prefix: LegacyPrefix) -> bool {
        self.prefixes.contains(&prefix)
    }

    /// Whether any prefix from `group` appears in the list.
    pub fn contains_from_group(&self, group: LegacyPrefixGroup) -> bool {
        self.prefixes.iter().any(|p| p.group() == group)
    }

    /// Whether the *last* prefix in byte-stream order equals `prefix`. Used
    /// by the matcher's SIMD-prefix state machine, where only the prefix
    /// closest to the opcode counts.
    pub fn ends_with(&self, prefix: LegacyPrefix) -> bool {
        self.prefixes.last() == Some(&prefix)
    }

    /// Shorthand for `contains_from_group(OperandSizeOverride)`.
    pub fn has_operand_size_override(&self) -> bool {
        self.contains(LegacyPrefix::OperandSizeOverride)
    }
}

impl FromIterator<LegacyPrefix> for LegacyPrefixList {
    fn from_iter<T: IntoIterator<Item = LegacyPrefix>>(iter: T) -> Self {
        Self::from_prefixes(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_with_looks_at_the_last_prefix_only() {
        let list = LegacyPrefixList::from_prefixes([
            LegacyPrefix::OperandSizeOverride,
            LegacyPrefix::RepeatNotEqual,
        ]);
        assert!(list.ends_with(LegacyPrefix::RepeatNotEqual));
        assert!(!list.ends_with(LegacyPrefix::OperandSizeOverride));
        assert!(list.has_operand_size_override());
    }

    #[test]
    fn groups_are_disjoint() {
        assert_eq!(LegacyPrefix::Lock.group(), LegacyPrefixGroup::LockOrRepeat);
        assert_eq!(
            LegacyPrefix::RepeatEqual.group(),
            LegacyPrefixGroup::LockOrRepeat
        );
        assert_eq!(LegacyPrefix::SegmentFs.group(), LegacyPrefixGroup::Segment);
    }

    #[test]
    fn contains_from_group_matches_any_member() {
        let list = LegacyPrefixList::from_prefixes([LegacyPrefix::RepeatEqual]);
        assert!(list.contains_from_group(LegacyPrefixGroup::LockOrRepeat));
        assert!(!list.contains_from_group(LegacyPrefixGroup::Segment));
    }
}
