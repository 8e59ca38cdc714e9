//! Architecture plug-in surface registered with the generic engine.
//!
//! Each instruction-set backend supplies the same fixed capability set:
//! per-instance state construction, power-on reset, auxiliary-structure
//! release, program-counter access, fatal-trap classification, the two
//! hook-eligibility predicates, and single-register read/write. The generic
//! engine, batch accessor, and context snapshots are written against this
//! trait and never against a concrete backend.

use crate::{AccessError, Mode};

/// Supported instruction-set families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ArchFamily {
    /// Segmented/long-mode architecture.
    X86,
    /// Register-window architecture.
    Sparc,
}

/// Engine-visible side effect reported by a register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteEffect {
    /// Only the addressed register changed.
    Plain,
    /// The program counter was redirected; any cached translation of the
    /// old instruction stream is stale.
    PcRedirected,
}

impl WriteEffect {
    /// Returns `true` when the write redirected the program counter.
    #[must_use]
    pub const fn redirected_pc(self) -> bool {
        matches!(self, Self::PcRedirected)
    }

    /// Folds another entry's effect into this one.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Plain, Self::Plain) => Self::Plain,
            _ => Self::PcRedirected,
        }
    }
}

/// Micro-operation category interceptable at the opcode level.
pub const MICRO_OP_SUB: u32 = 0;

/// Opcode-hook qualifier: the operation feeds a comparison.
pub const MICRO_OP_FLAG_CMP: u32 = 1 << 0;
/// Opcode-hook qualifier: the operation consumes a direct operand.
pub const MICRO_OP_FLAG_DIRECT: u32 = 1 << 1;

/// Fixed callback surface an architecture backend registers with the engine.
///
/// All methods are associated functions over an exclusive `State` reference:
/// one CPU state is owned by one engine instance and mutated only from its
/// owning thread, so the trait carries no interior locking.
pub trait Arch {
    /// Architectural CPU state for one emulated processor instance.
    type State: Clone;

    /// Family tag for registration-time dispatch.
    const FAMILY: ArchFamily;

    /// Constructs per-instance state already reset for the given mode.
    fn new_state(mode: Mode) -> Self::State;

    /// Restores every architectural sub-state to power-on defaults for the
    /// given mode, including the mode-specific fix-ups that make the
    /// configuration valid.
    fn reset(state: &mut Self::State, mode: Mode);

    /// Releases auxiliary lookup structures (translation caches) owned
    /// transitively by the CPU state.
    fn release(state: &mut Self::State);

    /// Externally visible program counter.
    fn get_pc(state: &Self::State, mode: Mode) -> u64;

    /// Redirects the program counter to an externally visible address.
    fn set_pc(state: &mut Self::State, mode: Mode, address: u64);

    /// Classifies an architecture-specific trap number: `true` means the
    /// engine should halt emulation, `false` means continue.
    fn is_fatal_trap(trapno: u32) -> bool;

    /// Returns `true` when the instruction mnemonic may carry an
    /// instruction-level hook. Backends without instruction hooks keep the
    /// default closed predicate.
    #[must_use]
    fn insn_hook_supported(insn: u32) -> bool {
        let _ = insn;
        false
    }

    /// Returns `true` when the micro-operation category may be intercepted
    /// at the opcode level under the given flag combination.
    #[must_use]
    fn opcode_hook_supported(op: u32, flags: u32) -> bool {
        let _ = (op, flags);
        false
    }

    /// Reads one register into `dest` after validating that the buffer
    /// length matches the descriptor width for `(regid, mode)`.
    ///
    /// # Errors
    ///
    /// Returns an *invalid-argument* [`AccessError`] for an unknown
    /// identifier or a width mismatch; `dest` is untouched on failure.
    fn read_register(
        state: &mut Self::State,
        regid: u32,
        dest: &mut [u8],
        mode: Mode,
    ) -> Result<(), AccessError>;

    /// Writes one register from `src` under the same validation contract as
    /// [`Arch::read_register`].
    ///
    /// # Errors
    ///
    /// Returns an *invalid-argument* [`AccessError`] for an unknown
    /// identifier, a width mismatch, or a selector that fails
    /// descriptor-table validation; CPU state is untouched on failure.
    fn write_register(
        state: &mut Self::State,
        regid: u32,
        src: &[u8],
        mode: Mode,
    ) -> Result<WriteEffect, AccessError>;
}

#[cfg(test)]
mod tests {
    use super::WriteEffect;

    #[test]
    fn pc_redirection_is_sticky_under_merge() {
        assert_eq!(
            WriteEffect::Plain.merge(WriteEffect::Plain),
            WriteEffect::Plain
        );
        assert_eq!(
            WriteEffect::Plain.merge(WriteEffect::PcRedirected),
            WriteEffect::PcRedirected
        );
        assert_eq!(
            WriteEffect::PcRedirected.merge(WriteEffect::Plain),
            WriteEffect::PcRedirected
        );
        assert!(WriteEffect::PcRedirected.redirected_pc());
    }
}
