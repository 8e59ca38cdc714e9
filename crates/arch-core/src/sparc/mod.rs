//! Register-window architecture backend.
//!
//! A deliberately small backend next to the segmented one: a uniform
//! four-byte register width, no mode gating, no composite registers, and a
//! delay-slot program counter where every redirect also places the successor
//! address.

pub mod regs;
pub mod state;

pub use regs::{SparcReg, Storage};
pub use state::SparcState;

use crate::bytes::{read_uint, write_uint};
use crate::{AccessError, Arch, ArchFamily, Mode, WriteEffect};

/// Illegal-instruction trap type.
pub const TT_ILL_INSN: u32 = 0x02;

fn lookup(regid: u32, mode: Mode, len: usize) -> Result<Storage, AccessError> {
    let reg = SparcReg::from_u32(regid)
        .ok_or(AccessError::UnknownRegister { regid, mode })?;
    if len != SparcReg::WIDTH {
        return Err(AccessError::WidthMismatch {
            expected: SparcReg::WIDTH,
            got: len,
        });
    }
    Ok(reg.storage())
}

/// Register-window backend registered with the generic engine.
#[derive(Debug, Clone, Copy)]
pub struct Sparc;

impl Arch for Sparc {
    type State = SparcState;

    const FAMILY: ArchFamily = ArchFamily::Sparc;

    fn new_state(mode: Mode) -> Self::State {
        let mut state = SparcState::new();
        Self::reset(&mut state, mode);
        state
    }

    fn reset(state: &mut Self::State, _mode: Mode) {
        *state = SparcState::new();
    }

    fn release(state: &mut Self::State) {
        state.flush_translation_caches();
    }

    fn get_pc(state: &Self::State, _mode: Mode) -> u64 {
        u64::from(state.pc)
    }

    /// A redirect also retargets the delay-slot successor: straight-line
    /// fetch resumes at `address` with no stale branch shadow.
    #[allow(clippy::cast_possible_truncation)]
    fn set_pc(state: &mut Self::State, _mode: Mode, address: u64) {
        state.pc = address as u32;
        state.npc = state.pc.wrapping_add(4);
    }

    fn is_fatal_trap(trapno: u32) -> bool {
        trapno == TT_ILL_INSN
    }

    fn read_register(
        state: &mut Self::State,
        regid: u32,
        dest: &mut [u8],
        mode: Mode,
    ) -> Result<(), AccessError> {
        let value = match lookup(regid, mode, dest.len())? {
            Storage::Global(index) => state.gregs[index],
            Storage::Window(offset) => state.wregs[state.window_slot(offset)],
            Storage::Pc => state.pc,
        };
        write_uint(dest, u64::from(value));
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_register(
        state: &mut Self::State,
        regid: u32,
        src: &[u8],
        mode: Mode,
    ) -> Result<WriteEffect, AccessError> {
        let storage = lookup(regid, mode, src.len())?;
        let value = read_uint(src) as u32;
        match storage {
            Storage::Global(index) => state.gregs[index] = value,
            Storage::Window(offset) => {
                let slot = state.window_slot(offset);
                state.wregs[slot] = value;
            }
            Storage::Pc => {
                state.pc = value;
                state.npc = value.wrapping_add(4);
                return Ok(WriteEffect::PcRedirected);
            }
        }
        Ok(WriteEffect::Plain)
    }
}
