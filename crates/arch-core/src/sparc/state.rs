//! Architectural CPU state for the register-window backend.

use crate::TranslationCache;

/// Number of register windows in the modeled implementation.
pub const NWINDOWS: usize = 8;

/// Flat window file length: sixteen registers per window plus the eight-slot
/// overhang that lets the last window's in registers alias the first
/// window's outs.
pub const WREGS_LEN: usize = NWINDOWS * 16 + 8;

/// Number of per-translation-regime software caches.
pub const NB_MMU_MODES: usize = 3;

/// Full architectural CPU state.
///
/// The windowed registers live in one flat file; a window owns sixteen
/// consecutive slots starting at `cwp * 16`, and its in registers are the
/// next window's outs by construction, so a register save or restore is a
/// window-pointer move with no copying.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SparcState {
    /// Global register bank.
    pub gregs: [u32; 8],
    /// Flat window file.
    #[cfg_attr(feature = "serde", serde(with = "serde_big_array::BigArray"))]
    pub wregs: [u32; WREGS_LEN],
    /// Floating-point register bank.
    pub fpr: [u32; 32],
    /// Current window pointer.
    pub cwp: usize,
    /// Program counter.
    pub pc: u32,
    /// Next program counter, the delay-slot successor.
    pub npc: u32,
    /// Per-translation-regime software caches.
    pub tlb: [TranslationCache; NB_MMU_MODES],
}

impl SparcState {
    /// Zeroed power-on state with the window pointer at window zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gregs: [0; 8],
            wregs: [0; WREGS_LEN],
            fpr: [0; 32],
            cwp: 0,
            pc: 0,
            npc: 0,
            tlb: [
                TranslationCache::default(),
                TranslationCache::default(),
                TranslationCache::default(),
            ],
        }
    }

    /// Flat-file index of window-relative slot `offset` (0..24) under the
    /// current window pointer.
    #[must_use]
    pub const fn window_slot(&self, offset: usize) -> usize {
        self.cwp * 16 + offset
    }

    /// Discards every translation-regime cache.
    pub fn flush_translation_caches(&mut self) {
        for cache in &mut self.tlb {
            cache.release();
        }
    }
}

impl Default for SparcState {
    fn default() -> Self {
        Self::new()
    }
}
