//! Wire codecs for composite register values.
//!
//! Scalar registers travel as little-endian integers sized by the
//! descriptor; the registers here have multi-field layouts with fixed byte
//! offsets that both directions of the protocol share.

use crate::bytes::{read_uint, write_uint};
use crate::x86::state::{Fp80, X86State};

/// Descriptor-table register on the wire: base, limit, selector, flags, all
/// little-endian at fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableReg {
    /// Table base address.
    pub base: u64,
    /// Table limit.
    pub limit: u32,
    /// Visible selector, meaningful for the local-descriptor-table and task
    /// registers only.
    pub selector: u16,
    /// Descriptor flags, meaningful for the same two registers.
    pub flags: u32,
}

impl TableReg {
    /// Encoded width in bytes.
    pub const WIRE_BYTES: usize = 18;

    /// Decodes a record from a wire buffer of exactly
    /// [`TableReg::WIRE_BYTES`] bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            base: read_uint(&buf[0..8]),
            limit: read_uint(&buf[8..12]) as u32,
            selector: read_uint(&buf[12..14]) as u16,
            flags: read_uint(&buf[14..18]) as u32,
        }
    }

    /// Encodes this record into a wire buffer of exactly
    /// [`TableReg::WIRE_BYTES`] bytes.
    pub fn encode(self, buf: &mut [u8]) {
        write_uint(&mut buf[0..8], self.base);
        write_uint(&mut buf[8..12], u64::from(self.limit));
        write_uint(&mut buf[12..14], u64::from(self.selector));
        write_uint(&mut buf[14..18], u64::from(self.flags));
    }
}

/// Model-specific-register access record: index then value, little-endian.
///
/// Both transfer directions carry the index in the first four bytes; a read
/// fills the value field in place, a write consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MsrRecord {
    /// Register index.
    pub index: u32,
    /// 64-bit value.
    pub value: u64,
}

impl MsrRecord {
    /// Encoded width in bytes.
    pub const WIRE_BYTES: usize = 12;

    /// Decodes a record from a wire buffer of exactly
    /// [`MsrRecord::WIRE_BYTES`] bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            index: read_uint(&buf[0..4]) as u32,
            value: read_uint(&buf[4..12]),
        }
    }

    /// Writes the value field back into a wire buffer, leaving the index
    /// bytes untouched.
    pub fn encode_value(buf: &mut [u8], value: u64) {
        write_uint(&mut buf[4..12], value);
    }
}

impl Fp80 {
    /// Encoded width in bytes: mantissa then sign/exponent.
    pub const WIRE_BYTES: usize = 10;

    /// Decodes a register from a wire buffer of exactly
    /// [`Fp80::WIRE_BYTES`] bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            mantissa: read_uint(&buf[0..8]),
            exponent: read_uint(&buf[8..10]) as u16,
        }
    }

    /// Encodes this register into a wire buffer of exactly
    /// [`Fp80::WIRE_BYTES`] bytes.
    pub fn encode(self, buf: &mut [u8]) {
        write_uint(&mut buf[0..8], self.mantissa);
        write_uint(&mut buf[8..10], u64::from(self.exponent));
    }
}

/// Folds the top-of-stack index into bits 11..14 of the status word.
#[must_use]
pub fn fold_status_word(fpus: u16, fpstt: u8) -> u16 {
    (fpus & !0x3800) | (u16::from(fpstt & 7) << 11)
}

/// Splits a written status word into the stored word and the top-of-stack
/// index carried in bits 11..14.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn split_status_word(value: u16) -> (u16, u8) {
    (value, ((value >> 11) & 7) as u8)
}

/// Derives the packed two-bit-per-register tag word from the bank contents.
///
/// Empty registers tag as 3; for occupied registers the class is derived
/// from the stored value: all-zero tags as 1, denormals, infinities, NaNs
/// and unnormals tag as 2, normal finite values tag as 0.
#[must_use]
pub fn pack_tag_word(state: &X86State) -> u16 {
    let mut tag = 0_u16;
    for i in (0..8).rev() {
        tag <<= 2;
        if state.fptags[i] {
            tag |= 3;
        } else {
            let reg = state.fpregs[i];
            let exponent = reg.exponent & 0x7FFF;
            if exponent == 0 && reg.mantissa == 0 {
                tag |= 1;
            } else if exponent == 0 || exponent == 0x7FFF || reg.mantissa & (1 << 63) == 0 {
                tag |= 2;
            }
        }
    }
    tag
}

/// Unpacks a written tag word into per-register empty markers.
///
/// Only the empty class is stored; the remaining classes are recomputed from
/// register contents on the next read.
#[must_use]
pub fn unpack_tag_word(value: u16) -> [bool; 8] {
    let mut tags = [false; 8];
    for (i, tag) in tags.iter_mut().enumerate() {
        *tag = (value >> (2 * i)) & 3 == 3;
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::{
        fold_status_word, pack_tag_word, split_status_word, unpack_tag_word, Fp80, MsrRecord,
        TableReg,
    };
    use crate::x86::state::X86State;

    #[test]
    fn table_record_round_trips_at_fixed_offsets() {
        let record = TableReg {
            base: 0x0000_7FFF_DEAD_0000,
            limit: 0xFFF,
            selector: 0x28,
            flags: 0x8200,
        };
        let mut buf = [0_u8; TableReg::WIRE_BYTES];
        record.encode(&mut buf);
        assert_eq!(&buf[0..2], &[0x00, 0x00]);
        assert_eq!(buf[8], 0xFF);
        assert_eq!(buf[12], 0x28);
        assert_eq!(TableReg::decode(&buf), record);
    }

    #[test]
    fn msr_read_keeps_the_index_bytes_in_place() {
        let mut buf = [0_u8; MsrRecord::WIRE_BYTES];
        buf[0..4].copy_from_slice(&0xC000_0080_u32.to_le_bytes());
        MsrRecord::encode_value(&mut buf, 0x500);
        let record = MsrRecord::decode(&buf);
        assert_eq!(record.index, 0xC000_0080);
        assert_eq!(record.value, 0x500);
    }

    #[test]
    fn fp80_round_trips_mantissa_and_exponent() {
        let reg = Fp80 {
            mantissa: 0x8000_0000_0000_0000,
            exponent: 0x3FFF,
        };
        let mut buf = [0_u8; Fp80::WIRE_BYTES];
        reg.encode(&mut buf);
        assert_eq!(Fp80::decode(&buf), reg);
    }

    #[test]
    fn status_word_carries_the_stack_top_in_bits_11_to_13() {
        assert_eq!(fold_status_word(0x0041, 5), 0x2841);
        let (fpus, fpstt) = split_status_word(0x2841);
        assert_eq!(fpstt, 5);
        assert_eq!(fpus, 0x2841);
    }

    #[test]
    fn tag_word_classifies_register_contents() {
        let mut state = X86State::new();
        // Register 0: valid normal value.
        state.fptags[0] = false;
        state.fpregs[0] = Fp80 {
            mantissa: 0x8000_0000_0000_0000,
            exponent: 0x3FFF,
        };
        // Register 1: zero.
        state.fptags[1] = false;
        state.fpregs[1] = Fp80::default();
        // Register 2: infinity, a special value.
        state.fptags[2] = false;
        state.fpregs[2] = Fp80 {
            mantissa: 0x8000_0000_0000_0000,
            exponent: 0x7FFF,
        };
        // Registers 3..8 stay empty.
        let tag = pack_tag_word(&state);
        assert_eq!(tag & 0b11, 0b00);
        assert_eq!((tag >> 2) & 0b11, 0b01);
        assert_eq!((tag >> 4) & 0b11, 0b10);
        assert_eq!((tag >> 6) & 0b11, 0b11);
    }

    #[test]
    fn unpacking_keeps_only_the_empty_class() {
        let tags = unpack_tag_word(0b11_10_01_00_11_10_01_00);
        assert_eq!(
            tags,
            [false, false, false, true, false, false, false, true]
        );
    }
}
