//! The archive's one-byte flag field.
//!
//! Flags are read back from the archive on decompress, never assumed from
//! caller intent: an archive compressed with LZ77 decompresses with LZ77
//! no matter what the caller asks for.

/// Bit 0: the cipher stage was applied.
pub const FLAG_CIPHER: u8 = 1 << 0;
/// Bit 1: the LZ77 stage was applied.
pub const FLAG_LZ77: u8 = 1 << 1;

/// The archive flag byte.
///
/// Unknown bits are preserved verbatim so a round-trip through this type
/// never alters the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// Build flags from the requested pipeline options.
    pub fn new(cipher: bool, lz77: bool) -> Self {
        let mut byte = 0;
        if cipher {
            byte |= FLAG_CIPHER;
        }
        if lz77 {
            byte |= FLAG_LZ77;
        }
        Self(byte)
    }

    /// Wrap a flag byte read from an archive.
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw byte as written at archive offset 0.
    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Whether the cipher stage is enabled.
    pub fn cipher(self) -> bool {
        self.0 & FLAG_CIPHER != 0
    }

    /// Whether the LZ77 stage is enabled.
    pub fn lz77(self) -> bool {
        self.0 & FLAG_LZ77 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_assignment() {
        assert_eq!(Flags::new(true, false).to_byte(), 0b01);
        assert_eq!(Flags::new(false, true).to_byte(), 0b10);
        assert_eq!(Flags::new(true, true).to_byte(), 0b11);
        assert_eq!(Flags::new(false, false).to_byte(), 0);
    }

    #[test]
    fn test_byte_roundtrip_preserves_unknown_bits() {
        let flags = Flags::from_byte(0b1010_0011);
        assert!(flags.cipher());
        assert!(flags.lz77());
        assert_eq!(flags.to_byte(), 0b1010_0011);
    }
}
