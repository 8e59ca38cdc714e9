//! Model-specific-register access routed through the `rdmsr`/`wrmsr`
//! microcode paths.
//!
//! External accesses reuse the exact code the emulated instructions run
//! instead of a parallel lookup table: the trampoline saves the three
//! registers the microcode clobbers, stages the index in RCX, invokes the
//! instruction body, and restores the saved registers. Unknown indices read
//! as zero and absorb writes silently, so the access itself always succeeds.

use crate::x86::state::{Seg, X86State};

/// Time-stamp counter.
pub const MSR_TSC: u32 = 0x10;
/// Fast-system-call target code segment.
pub const MSR_SYSENTER_CS: u32 = 0x174;
/// Fast-system-call stack pointer.
pub const MSR_SYSENTER_ESP: u32 = 0x175;
/// Fast-system-call entry point.
pub const MSR_SYSENTER_EIP: u32 = 0x176;
/// Extended-feature-enable register.
pub const MSR_EFER: u32 = 0xC000_0080;
/// Legacy syscall target register.
pub const MSR_STAR: u32 = 0xC000_0081;
/// Long-mode syscall entry point.
pub const MSR_LSTAR: u32 = 0xC000_0082;
/// Compatibility-mode syscall entry point.
pub const MSR_CSTAR: u32 = 0xC000_0083;
/// Syscall flags mask.
pub const MSR_FMASK: u32 = 0xC000_0084;
/// FS segment base.
pub const MSR_FS_BASE: u32 = 0xC000_0100;
/// GS segment base.
pub const MSR_GS_BASE: u32 = 0xC000_0101;
/// Kernel GS base swapped in by `swapgs`.
pub const MSR_KERNEL_GS_BASE: u32 = 0xC000_0102;

const RAX: usize = 0;
const RCX: usize = 1;
const RDX: usize = 2;

/// `rdmsr` instruction body: index in ECX, result in EDX:EAX.
#[allow(clippy::cast_possible_truncation)]
const fn rdmsr(state: &mut X86State) {
    let index = state.regs[RCX] as u32;
    let value = match index {
        MSR_TSC => state.tsc,
        MSR_SYSENTER_CS => state.sysenter_cs,
        MSR_SYSENTER_ESP => state.sysenter_esp,
        MSR_SYSENTER_EIP => state.sysenter_eip,
        MSR_EFER => state.efer,
        MSR_STAR => state.star,
        MSR_LSTAR => state.lstar,
        MSR_CSTAR => state.cstar,
        MSR_FMASK => state.fmask,
        MSR_FS_BASE => state.segs[Seg::Fs.index()].base,
        MSR_GS_BASE => state.segs[Seg::Gs.index()].base,
        MSR_KERNEL_GS_BASE => state.kernel_gs_base,
        _ => 0,
    };
    state.regs[RAX] = value & 0xFFFF_FFFF;
    state.regs[RDX] = value >> 32;
}

/// `wrmsr` instruction body: index in ECX, value in EDX:EAX.
#[allow(clippy::cast_possible_truncation)]
const fn wrmsr(state: &mut X86State) {
    let index = state.regs[RCX] as u32;
    let value = (state.regs[RAX] & 0xFFFF_FFFF) | (state.regs[RDX] << 32);
    match index {
        MSR_TSC => state.tsc = value,
        MSR_SYSENTER_CS => state.sysenter_cs = value,
        MSR_SYSENTER_ESP => state.sysenter_esp = value,
        MSR_SYSENTER_EIP => state.sysenter_eip = value,
        MSR_EFER => state.efer = value,
        MSR_STAR => state.star = value,
        MSR_LSTAR => state.lstar = value,
        MSR_CSTAR => state.cstar = value,
        MSR_FMASK => state.fmask = value,
        MSR_FS_BASE => state.segs[Seg::Fs.index()].base = value,
        MSR_GS_BASE => state.segs[Seg::Gs.index()].base = value,
        MSR_KERNEL_GS_BASE => state.kernel_gs_base = value,
        _ => {}
    }
}

/// Reads one register through the `rdmsr` microcode.
#[must_use]
pub fn read(state: &mut X86State, index: u32) -> u64 {
    let saved = (state.regs[RAX], state.regs[RCX], state.regs[RDX]);
    state.regs[RCX] = u64::from(index);
    rdmsr(state);
    let value = (state.regs[RAX] & 0xFFFF_FFFF) | ((state.regs[RDX] & 0xFFFF_FFFF) << 32);
    (state.regs[RAX], state.regs[RCX], state.regs[RDX]) = saved;
    value
}

/// Writes one register through the `wrmsr` microcode.
pub fn write(state: &mut X86State, index: u32, value: u64) {
    let saved = (state.regs[RAX], state.regs[RCX], state.regs[RDX]);
    state.regs[RCX] = u64::from(index);
    state.regs[RAX] = value & 0xFFFF_FFFF;
    state.regs[RDX] = value >> 32;
    wrmsr(state);
    (state.regs[RAX], state.regs[RCX], state.regs[RDX]) = saved;
}
