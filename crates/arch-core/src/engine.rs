//! Generic engine instance over an architecture plug-in.

use core::marker::PhantomData;

use crate::{
    batch, AccessError, Arch, Context, ExecControl, Mode, ReadRequest, WriteRequest,
};

/// Immutable construction-time configuration for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EngineConfig {
    /// Execution mode the instance is created in.
    pub mode: Mode,
}

/// One emulated processor: CPU state, execution mode, and the
/// execution-interrupt trigger, driven through an architecture plug-in.
///
/// The engine exclusively owns its CPU state for the lifetime of the
/// emulated machine. All register access is serialized by the caller with
/// any concurrently running execution core for this instance; independent
/// instances share no mutable state.
#[derive(Debug)]
pub struct Engine<A: Arch> {
    state: A::State,
    mode: Mode,
    exec: ExecControl,
    _arch: PhantomData<A>,
}

impl<A: Arch> Engine<A> {
    /// Constructs an instance with per-arch state reset for the configured
    /// mode.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: A::new_state(config.mode),
            mode: config.mode,
            exec: ExecControl::new(),
            _arch: PhantomData,
        }
    }

    /// Execution mode this instance was configured with.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Architectural CPU state, for the execution core.
    #[must_use]
    pub const fn state(&self) -> &A::State {
        &self.state
    }

    /// Mutable CPU state, for the execution core.
    pub const fn state_mut(&mut self) -> &mut A::State {
        &mut self.state
    }

    /// Execution-interrupt trigger polled by the execution core.
    #[must_use]
    pub const fn exec(&self) -> &ExecControl {
        &self.exec
    }

    /// Mutable trigger handle, for the execution core's safe points.
    pub const fn exec_mut(&mut self) -> &mut ExecControl {
        &mut self.exec
    }

    /// Resets every architectural sub-state to power-on defaults for the
    /// configured mode.
    pub fn reset(&mut self) {
        A::reset(&mut self.state, self.mode);
    }

    /// Externally visible program counter.
    #[must_use]
    pub fn pc(&self) -> u64 {
        A::get_pc(&self.state, self.mode)
    }

    /// Redirects the program counter without signaling the execution core.
    ///
    /// Engine-internal path used before execution starts; redirections while
    /// the core may be running go through [`Engine::reg_write`] so the
    /// interrupt trigger fires.
    pub fn set_pc(&mut self, address: u64) {
        A::set_pc(&mut self.state, self.mode, address);
    }

    /// Reads registers in batch order.
    ///
    /// # Errors
    ///
    /// First-failure semantics as in [`batch::read_batch`].
    pub fn reg_read(&mut self, requests: &mut [ReadRequest<'_>]) -> Result<(), AccessError> {
        batch::read_batch::<A>(&mut self.state, self.mode, requests)
    }

    /// Writes registers in batch order.
    ///
    /// If any entry redirected the program counter, the execution-interrupt
    /// trigger is raised exactly once after the whole batch completes.
    ///
    /// # Errors
    ///
    /// First-failure semantics as in [`batch::write_batch`]; the trigger is
    /// not raised for a failed batch even if earlier entries wrote the
    /// program counter only partially. A failed batch returns before the
    /// post-batch signal, matching the engine's historical contract.
    pub fn reg_write(&mut self, requests: &[WriteRequest<'_>]) -> Result<(), AccessError> {
        let effect = batch::write_batch::<A>(&mut self.state, self.mode, requests)?;
        if effect.redirected_pc() {
            self.exec.interrupt();
        }
        Ok(())
    }

    /// Classifies a trap number raised by the execution core.
    #[must_use]
    pub fn is_fatal_trap(trapno: u32) -> bool {
        A::is_fatal_trap(trapno)
    }

    /// Instruction-level hook eligibility for a mnemonic identifier.
    #[must_use]
    pub fn insn_hook_supported(insn: u32) -> bool {
        A::insn_hook_supported(insn)
    }

    /// Opcode-level hook eligibility for a micro-operation category.
    #[must_use]
    pub fn opcode_hook_supported(op: u32, flags: u32) -> bool {
        A::opcode_hook_supported(op, flags)
    }

    /// Captures an independent context snapshot of the CPU state.
    #[must_use]
    pub fn save_context(&self) -> Context<A> {
        Context::new(self.state.clone(), self.mode)
    }

    /// Restores CPU state from a snapshot, which may have been captured on
    /// another instance.
    pub fn restore_context(&mut self, context: &Context<A>) {
        self.state = context.state().clone();
    }
}

impl<A: Arch> Drop for Engine<A> {
    fn drop(&mut self) {
        A::release(&mut self.state);
    }
}
