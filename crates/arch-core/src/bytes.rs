//! Little-endian integer transport between register storage and caller
//! buffers.
//!
//! Buffer lengths are validated against the register descriptor before these
//! helpers run, so the slice length is the authoritative value width.

/// Reads a little-endian unsigned integer of `buf.len()` bytes (at most 8).
pub(crate) fn read_uint(buf: &[u8]) -> u64 {
    let mut value = 0_u64;
    for (i, byte) in buf.iter().enumerate() {
        value |= u64::from(*byte) << (8 * i);
    }
    value
}

/// Writes `value` as a little-endian unsigned integer of `buf.len()` bytes,
/// truncating to the buffer width.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_uint(buf: &mut [u8], value: u64) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::{read_uint, write_uint};

    #[test]
    fn round_trips_every_supported_width() {
        for width in [1_usize, 2, 4, 8] {
            let mut buf = vec![0_u8; width];
            let value = 0xA1B2_C3D4_E5F6_0718_u64;
            write_uint(&mut buf, value);
            let mask = if width == 8 {
                u64::MAX
            } else {
                (1_u64 << (8 * width)) - 1
            };
            assert_eq!(read_uint(&buf), value & mask);
        }
    }

    #[test]
    fn layout_is_little_endian() {
        let mut buf = [0_u8; 4];
        write_uint(&mut buf, 0x1122_3344);
        assert_eq!(buf, [0x44, 0x33, 0x22, 0x11]);
    }
}
