//! Address size, integer operand size, and the SIMD prefix derived from them.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// An address size in bits, either the default for the current mode or the
/// effective size after a `0x67` address-size override.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AddressSize {
    Bits16,
    Bits32,
    Bits64,
}

impl AddressSize {
    pub fn bits(self) -> u32 {
        match self {
            AddressSize::Bits16 => 16,
            AddressSize::Bits32 => 32,
            AddressSize::Bits64 => 64,
        }
    }
}

/// An integer operand size, as derived from default address size, REX.W,
/// and the `0x66` operand-size override by [`integer_operand_size`].
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OperandSize {
    Word,
    Dword,
    Qword,
}

/// The SIMD prefix in effect for an instruction, derived from the legacy
/// prefix list (or, for VEX/XOP/EVEX encodings, from the extended prefix).
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SimdPrefix {
    None,
    /// `66`
    Op66,
    /// `F2`
    RepNe,
    /// `F3`
    Rep,
}

/// Implements the matcher's `integer_operand_size` helper (spec §4.2):
///
/// - if `default_address_size` is 64 bits and `rex_w` is set, the size is
///   always `Qword` (REX.W always wins in long mode);
/// - otherwise the base size is `Word` for a 16-bit default address size or
///   `Dword` otherwise, toggled to the other of the pair by an operand-size
///   override.
pub fn integer_operand_size(
    default_address_size: AddressSize,
    rex_w: bool,
    operand_size_override: bool,
) -> OperandSize {
    if default_address_size == AddressSize::Bits64 && rex_w {
        return OperandSize::Qword;
    }
    let base = if default_address_size == AddressSize::Bits16 {
        OperandSize::Word
    } else {
        OperandSize::Dword
    };
    if operand_size_override {
        match base {
            OperandSize::Word => OperandSize::Dword,
            OperandSize::Dword => OperandSize::Word,
            OperandSize::Qword => OperandSize::Qword,
        }
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rex_w_wins_in_long_mode_regardless_of_override() {
        assert_eq!(
            integer_operand_size(AddressSize::Bits64, true, true),
            OperandSize::Qword
        );
        assert_eq!(
            integer_operand_size(AddressSize::Bits64, true, false),
            OperandSize::Qword
        );
    }

    #[test]
    fn override_toggles_word_and_dword() {
        assert_eq!(
            integer_operand_size(AddressSize::Bits32, false, false),
            OperandSize::Dword
        );
        assert_eq!(
            integer_operand_size(AddressSize::Bits32, false, true),
            OperandSize::Word
        );
        assert_eq!(
            integer_operand_size(AddressSize::Bits16, false, false),
            OperandSize::Word
        );
        assert_eq!(
            integer_operand_size(AddressSize::Bits16, false, true),
            OperandSize::Dword
        );
    }
}
