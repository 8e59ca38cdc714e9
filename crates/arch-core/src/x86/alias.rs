//! Width/aliasing resolver for general-purpose register storage.
//!
//! A canonical general-purpose register is one 64-bit storage word; narrower
//! identifiers name sub-fields of it. Loads and stores go through explicit
//! accessors over that word instead of pointer arithmetic: a store touches
//! only the designated bit-range and leaves every other bit of the shared
//! storage unchanged, which is exactly the aliasing contract the external
//! protocol promises.

/// Sub-field view of a canonical 64-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum GprView {
    /// Full 64-bit canonical storage.
    Qword,
    /// Low 32 bits.
    Dword,
    /// Low 16 bits.
    Word,
    /// Low byte (bits 0..8).
    ByteLow,
    /// High byte of the low word (bits 8..16).
    ByteHigh,
}

impl GprView {
    /// Expected value width in bytes for this view.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Qword => 8,
            Self::Dword => 4,
            Self::Word => 2,
            Self::ByteLow | Self::ByteHigh => 1,
        }
    }

    /// Extracts this view's bits from the canonical storage word.
    #[must_use]
    pub const fn load(self, storage: u64) -> u64 {
        match self {
            Self::Qword => storage,
            Self::Dword => storage & 0xFFFF_FFFF,
            Self::Word => storage & 0xFFFF,
            Self::ByteLow => storage & 0xFF,
            Self::ByteHigh => (storage >> 8) & 0xFF,
        }
    }

    /// Replaces this view's bits in the canonical storage word.
    ///
    /// Bits outside the view are preserved, including the upper 32 bits for
    /// a dword store: the external register protocol exposes plain aliased
    /// storage, not instruction-operand zero-extension.
    pub const fn store(self, storage: &mut u64, value: u64) {
        match self {
            Self::Qword => *storage = value,
            Self::Dword => *storage = (*storage & !0xFFFF_FFFF) | (value & 0xFFFF_FFFF),
            Self::Word => *storage = (*storage & !0xFFFF) | (value & 0xFFFF),
            Self::ByteLow => *storage = (*storage & !0xFF) | (value & 0xFF),
            Self::ByteHigh => *storage = (*storage & !0xFF00) | ((value & 0xFF) << 8),
        }
    }
}
