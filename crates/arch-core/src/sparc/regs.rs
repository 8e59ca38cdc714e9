//! Flat register-identifier namespace for the register-window architecture.
//!
//! The namespace is small and direction-symmetric: eight globals, twenty-four
//! window-relative registers, and the program counter, all four bytes wide in
//! every execution mode.

macro_rules! sparc_registers {
    ($(($variant:ident, $value:literal)),+ $(,)?) => {
        /// Register identifier in the architecture's flat namespace.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[repr(u32)]
        #[allow(missing_docs)]
        pub enum SparcReg {
            $($variant = $value),+
        }

        impl SparcReg {
            /// Every identifier in the namespace, in discriminant order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable raw identifier value.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self as u32
            }

            /// Decodes a raw identifier, rejecting values outside the
            /// namespace.
            #[must_use]
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

sparc_registers! {
    (G0, 0x01), (G1, 0x02), (G2, 0x03), (G3, 0x04),
    (G4, 0x05), (G5, 0x06), (G6, 0x07), (G7, 0x08),
    (O0, 0x09), (O1, 0x0A), (O2, 0x0B), (O3, 0x0C),
    (O4, 0x0D), (O5, 0x0E), (O6, 0x0F), (O7, 0x10),
    (L0, 0x11), (L1, 0x12), (L2, 0x13), (L3, 0x14),
    (L4, 0x15), (L5, 0x16), (L6, 0x17), (L7, 0x18),
    (I0, 0x19), (I1, 0x1A), (I2, 0x1B), (I3, 0x1C),
    (I4, 0x1D), (I5, 0x1E), (I6, 0x1F), (I7, 0x20),
    (Pc, 0x21),
}

/// Storage rule resolved from an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Global register bank slot.
    Global(usize),
    /// Window-relative slot: out registers at 0..8, locals at 8..16, ins at
    /// 16..24, resolved against the current window pointer on access.
    Window(usize),
    /// Program counter.
    Pc,
}

impl SparcReg {
    /// Register value width in bytes; uniform across the namespace.
    pub const WIDTH: usize = 4;

    /// Resolves the storage rule for this identifier.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn storage(self) -> Storage {
        let id = self.raw();
        match id {
            0x01..=0x08 => Storage::Global(id as usize - 0x01),
            0x09..=0x20 => Storage::Window(id as usize - 0x09),
            _ => Storage::Pc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SparcReg, Storage};

    #[test]
    fn raw_values_round_trip_through_from_u32() {
        for reg in SparcReg::ALL {
            assert_eq!(SparcReg::from_u32(reg.raw()), Some(*reg));
        }
        assert_eq!(SparcReg::from_u32(0), None);
        assert_eq!(SparcReg::from_u32(0x22), None);
    }

    #[test]
    fn window_relative_slots_cover_out_local_and_in_banks() {
        assert_eq!(SparcReg::O0.storage(), Storage::Window(0));
        assert_eq!(SparcReg::L0.storage(), Storage::Window(8));
        assert_eq!(SparcReg::I0.storage(), Storage::Window(16));
        assert_eq!(SparcReg::I7.storage(), Storage::Window(23));
        assert_eq!(SparcReg::G3.storage(), Storage::Global(3));
        assert_eq!(SparcReg::Pc.storage(), Storage::Pc);
    }
}
