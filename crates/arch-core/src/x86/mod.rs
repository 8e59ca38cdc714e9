//! Segmented/long-mode architecture backend.

pub mod access;
pub mod alias;
pub mod codec;
pub mod msr;
pub mod regs;
pub mod state;

pub use codec::{MsrRecord, TableReg};
pub use regs::{Direction, FpField, RegDescriptor, Storage, TableId, X86Reg};
pub use state::{Fp80, Seg, SegmentCache, X86State};

use crate::{AccessError, Arch, ArchFamily, Mode, WriteEffect, MICRO_OP_FLAG_CMP, MICRO_OP_FLAG_DIRECT, MICRO_OP_SUB};

/// Undefined-opcode trap number.
pub const EXCP_INVALID_OPCODE: u32 = 6;

/// Instruction mnemonics addressable by instruction-level hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum X86Insn {
    /// Port input.
    In = 1,
    /// Port output.
    Out = 2,
    /// Fast system call.
    Syscall = 3,
    /// Legacy fast system entry.
    Sysenter = 4,
    /// Feature identification.
    Cpuid = 5,
    /// Halt.
    Hlt = 6,
    /// Time-stamp read.
    Rdtsc = 7,
    /// Interrupt return.
    Iret = 8,
}

impl X86Insn {
    /// Stable raw identifier value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// Segmented/long-mode backend registered with the generic engine.
#[derive(Debug, Clone, Copy)]
pub struct X86;

impl Arch for X86 {
    type State = X86State;

    const FAMILY: ArchFamily = ArchFamily::X86;

    fn new_state(mode: Mode) -> Self::State {
        let mut state = X86State::new();
        Self::reset(&mut state, mode);
        state
    }

    fn reset(state: &mut Self::State, mode: Mode) {
        match mode {
            Mode::Real16 => state.reset_real16(),
            Mode::Protected32 => state.reset_protected32(),
            Mode::Long64 => state.reset_long64(),
        }
    }

    fn release(state: &mut Self::State) {
        state.flush_translation_caches();
    }

    /// Real-address mode reports the linear address formed from the code
    /// segment; the wide modes report the instruction pointer directly.
    fn get_pc(state: &Self::State, mode: Mode) -> u64 {
        match mode {
            Mode::Real16 => {
                u64::from(state.segs[Seg::Cs.index()].selector) * 16 + state.eip
            }
            Mode::Protected32 | Mode::Long64 => state.eip,
        }
    }

    /// Inverts [`Arch::get_pc`]: a real-address target is decomposed against
    /// the current code-segment selector, which is left unchanged.
    fn set_pc(state: &mut Self::State, mode: Mode, address: u64) {
        state.eip = match mode {
            Mode::Real16 => {
                address.wrapping_sub(u64::from(state.segs[Seg::Cs.index()].selector) * 16)
            }
            Mode::Protected32 | Mode::Long64 => address,
        };
    }

    fn is_fatal_trap(trapno: u32) -> bool {
        trapno == EXCP_INVALID_OPCODE
    }

    fn insn_hook_supported(insn: u32) -> bool {
        const HOOKABLE: [X86Insn; 5] = [
            X86Insn::In,
            X86Insn::Out,
            X86Insn::Syscall,
            X86Insn::Sysenter,
            X86Insn::Cpuid,
        ];
        HOOKABLE.iter().any(|candidate| candidate.raw() == insn)
    }

    /// Subtraction micro-operations are interceptable except as a
    /// direct-operand comparison, which the code generator folds away before
    /// any hook could observe it.
    fn opcode_hook_supported(op: u32, flags: u32) -> bool {
        op == MICRO_OP_SUB
            && flags & (MICRO_OP_FLAG_CMP | MICRO_OP_FLAG_DIRECT)
                != MICRO_OP_FLAG_CMP | MICRO_OP_FLAG_DIRECT
    }

    fn read_register(
        state: &mut Self::State,
        regid: u32,
        dest: &mut [u8],
        mode: Mode,
    ) -> Result<(), AccessError> {
        access::read(state, regid, dest, mode)
    }

    fn write_register(
        state: &mut Self::State,
        regid: u32,
        src: &[u8],
        mode: Mode,
    ) -> Result<WriteEffect, AccessError> {
        access::write(state, regid, src, mode)
    }
}
