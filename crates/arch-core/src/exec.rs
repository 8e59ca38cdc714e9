//! Execution-interrupt trigger shared between this layer and the execution
//! core.
//!
//! A program-counter write issued from a callback may land mid-instruction,
//! while the core is still inside a cached translation of the *old*
//! instruction stream. The trigger records both facts: the core must stop at
//! its next safe point, and the translation being executed must be discarded
//! because it encodes assumptions about the previous program counter.

/// Two-state machine observed by the execution core at safe points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// The execution core is translating and executing instructions.
    #[default]
    Running,
    /// The core must stop at its next safe point and re-fetch from the
    /// current program counter.
    QuitRequested,
}

/// Signal path from register writes to the execution core.
///
/// The core polls this between translated blocks; nothing in this layer
/// blocks or preempts an in-progress operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecControl {
    run_state: RunState,
    discard_translation: bool,
}

impl ExecControl {
    /// Creates a trigger in the running state with no pending discard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            run_state: RunState::Running,
            discard_translation: false,
        }
    }

    /// Current state as seen by the execution core.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Returns `true` while a translation-discard request is pending.
    #[must_use]
    pub const fn discard_pending(&self) -> bool {
        self.discard_translation
    }

    /// Requests that the core quit its translation loop and discard the
    /// block it was executing when the program counter was redirected.
    pub const fn interrupt(&mut self) {
        self.run_state = RunState::QuitRequested;
        self.discard_translation = true;
    }

    /// Consumes the pending discard request, returning whether one was set.
    ///
    /// Called by the execution core when it reaches a safe point.
    pub const fn take_discard(&mut self) -> bool {
        let pending = self.discard_translation;
        self.discard_translation = false;
        pending
    }

    /// Returns the core to the running state after it honored a quit
    /// request.
    pub const fn resume(&mut self) {
        self.run_state = RunState::Running;
    }
}
