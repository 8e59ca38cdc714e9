//! Detached context snapshots for save/restore workflows.

use crate::{
    batch, AccessError, Arch, Mode, ReadRequest, WriteRequest,
};

/// Independent copy of a CPU state usable for save/restore or
/// transplantation to another engine instance.
///
/// A snapshot is plain data: its lifetime is fully decoupled from the live
/// CPU state once created, and it supports the same batch register protocol.
/// Writing the program counter inside a snapshot never raises the execution
/// interrupt; there is no execution core attached to redirect.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "A::State: serde::Serialize",
        deserialize = "A::State: serde::Deserialize<'de>"
    ))
)]
pub struct Context<A: Arch> {
    state: A::State,
    mode: Mode,
}

impl<A: Arch> Context<A> {
    pub(crate) const fn new(state: A::State, mode: Mode) -> Self {
        Self { state, mode }
    }

    /// Execution mode captured with the snapshot.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Snapshot state, for restoring into an engine instance.
    #[must_use]
    pub const fn state(&self) -> &A::State {
        &self.state
    }

    /// Reads registers from the snapshot in batch order.
    ///
    /// # Errors
    ///
    /// First-failure semantics as in [`batch::read_batch`].
    pub fn reg_read(&mut self, requests: &mut [ReadRequest<'_>]) -> Result<(), AccessError> {
        batch::read_batch::<A>(&mut self.state, self.mode, requests)
    }

    /// Writes registers into the snapshot in batch order.
    ///
    /// The program-counter side effect is discarded: a detached snapshot has
    /// no translation cache to invalidate.
    ///
    /// # Errors
    ///
    /// First-failure semantics as in [`batch::write_batch`].
    pub fn reg_write(&mut self, requests: &[WriteRequest<'_>]) -> Result<(), AccessError> {
        batch::write_batch::<A>(&mut self.state, self.mode, requests).map(|_effect| ())
    }
}
