//! The ModR/M and SIB bytes.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// The `mod` subfield of a ModR/M byte.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Mod {
    /// `mod == 0b00`, no displacement (except the RIP-relative special case).
    Indirect,
    /// `mod == 0b01`, one-byte displacement.
    IndirectDisp8,
    /// `mod == 0b10`, four-byte displacement.
    IndirectDisp32,
    /// `mod == 0b11`, register-direct addressing.
    Direct,
}

impl Mod {
    pub fn from_bits(bits: u8) -> Mod {
        match bits & 0b11 {
            0b00 => Mod::Indirect,
            0b01 => Mod::IndirectDisp8,
            0b10 => Mod::IndirectDisp32,
            0b11 => Mod::Direct,
            _ => unreachable!(),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Mod::Indirect => 0b00,
            Mod::IndirectDisp8 => 0b01,
            Mod::IndirectDisp32 => 0b10,
            Mod::Direct => 0b11,
        }
    }
}

/// A decoded ModR/M byte.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModRm {
    pub modbits: Mod,
    /// The `reg` subfield (bits 5:3), before any REX.R/VEX.R extension.
    pub reg: u8,
    /// The `rm` subfield (bits 2:0), before any REX.B/VEX.B extension.
    pub rm: u8,
}

impl ModRm {
    pub fn from_byte(byte: u8) -> ModRm {
        ModRm {
            modbits: Mod::from_bits(byte >> 6),
            reg: (byte >> 3) & 0b111,
            rm: byte & 0b111,
        }
    }

    pub fn to_byte(self) -> u8 {
        (self.modbits.bits() << 6) | (self.reg << 3) | self.rm
    }

    /// `Mod_Direct` in the spec's terms.
    pub fn is_direct(self) -> bool {
        self.modbits == Mod::Direct
    }
}

/// A decoded SIB (scale-index-base) byte, following certain ModR/M
/// encodings. The matcher only needs its presence, not its subfields.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Sib {
    pub scale: u8,
    pub index: u8,
    pub base: u8,
}

impl Sib {
    pub fn from_byte(byte: u8) -> Sib {
        Sib {
            scale: byte >> 6,
            index: (byte >> 3) & 0b111,
            base: byte & 0b111,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_byte() {
        let modrm = ModRm::from_byte(0xC0);
        assert_eq!(modrm.modbits, Mod::Direct);
        assert_eq!(modrm.reg, 0);
        assert_eq!(modrm.rm, 0);
        assert!(modrm.is_direct());
        assert_eq!(modrm.to_byte(), 0xC0);
    }

    #[test]
    fn indirect_with_disp32_is_not_direct() {
        let modrm = ModRm::from_byte(0b10_000_001);
        assert_eq!(modrm.modbits, Mod::IndirectDisp32);
        assert_eq!(modrm.rm, 0b001);
        assert!(!modrm.is_direct());
    }
}
