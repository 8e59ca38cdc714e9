//! Execution modes and the widths they impose.
//!
//! The mode is observed, never set, by this layer: control-register writes
//! elsewhere in the engine drive transitions, and accessors receive the
//! current mode as an argument on every call.

use core::fmt;

/// Execution mode governing which register identifiers exist and the
/// effective width a canonical register exposes.
///
/// The mode is driven externally by control-register writes; this layer only
/// observes it, so every accessor takes the mode as an explicit argument
/// instead of reading ambient engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Mode {
    /// Legacy real-address mode with 16-bit segmented addressing.
    Real16,
    /// 32-bit protected mode.
    #[default]
    Protected32,
    /// 64-bit long mode.
    Long64,
}

impl Mode {
    /// Returns `true` for 64-bit long mode.
    #[must_use]
    pub const fn is_long(self) -> bool {
        matches!(self, Self::Long64)
    }

    /// Byte width of control and debug registers under this mode.
    #[must_use]
    pub const fn control_width(self) -> usize {
        match self {
            Self::Real16 | Self::Protected32 => 4,
            Self::Long64 => 8,
        }
    }

    /// Byte width of a descriptor-table base address under this mode.
    ///
    /// Bases are truncated to 32 bits outside long mode.
    #[must_use]
    pub const fn table_base_width(self) -> usize {
        match self {
            Self::Real16 | Self::Protected32 => 4,
            Self::Long64 => 8,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Real16 => "16-bit real-address",
            Self::Protected32 => "32-bit protected",
            Self::Long64 => "64-bit long",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Mode;

    #[test]
    fn control_register_width_follows_addressing_regime() {
        assert_eq!(Mode::Real16.control_width(), 4);
        assert_eq!(Mode::Protected32.control_width(), 4);
        assert_eq!(Mode::Long64.control_width(), 8);
    }

    #[test]
    fn only_long_mode_reports_long() {
        assert!(!Mode::Real16.is_long());
        assert!(!Mode::Protected32.is_long());
        assert!(Mode::Long64.is_long());
    }

    #[test]
    fn display_names_are_stable() {
        assert_eq!(Mode::Real16.to_string(), "16-bit real-address");
        assert_eq!(Mode::Long64.to_string(), "64-bit long");
    }
}
