//! Error taxonomy for the register-access layer.
//!
//! Every rejection carries a diagnostic variant for the caller but
//! classifies to the single *invalid-argument* kind; the rest of the
//! engine's taxonomy lives with the layers that raise it.

use crate::Mode;
use thiserror::Error;

/// Closed error-kind taxonomy for the register-access layer.
///
/// Every failure this layer can produce classifies as *invalid-argument*;
/// other layers of the engine extend the taxonomy with their own kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorKind {
    /// Caller passed an identifier, width, or selector the layer rejects.
    InvalidArg,
}

/// Failure raised by register descriptor lookup and access validation.
///
/// All variants are detected before any memory is read or written for the
/// offending entry: a rejected read leaves the caller's buffer untouched and
/// a rejected write leaves the CPU state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessError {
    /// No descriptor maps this identifier under the given execution mode.
    #[error("register identifier {regid:#06x} is not addressable in {mode} mode")]
    UnknownRegister {
        /// Raw register identifier presented by the caller.
        regid: u32,
        /// Execution mode the lookup was filtered by.
        mode: Mode,
    },
    /// Caller-declared buffer width does not match the descriptor width.
    #[error("buffer is {got} bytes but the register descriptor expects {expected}")]
    WidthMismatch {
        /// Byte width required by the register descriptor.
        expected: usize,
        /// Byte width the caller declared.
        got: usize,
    },
    /// Segment selector failed descriptor-table validation before load.
    #[error("segment selector {selector:#06x} failed descriptor-table validation")]
    RejectedSelector {
        /// Selector value that was rejected.
        selector: u16,
    },
}

impl AccessError {
    /// Returns the closed taxonomy kind for this failure.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::UnknownRegister { .. }
            | Self::WidthMismatch { .. }
            | Self::RejectedSelector { .. } => ErrorKind::InvalidArg,
        }
    }
}
