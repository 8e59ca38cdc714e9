//! Engine lifecycle coverage: reset fix-ups, program-counter semantics, the
//! execution-interrupt trigger, and context save/restore.

use arch_core::sparc::{Sparc, SparcReg};
use arch_core::x86::{Seg, X86Reg, X86};
use arch_core::{
    Arch, Engine, EngineConfig, Mode, ReadRequest, RunState, TlbEntry, WriteRequest,
};
use rstest::rstest;

use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
#[cfg(feature = "serde")]
use serde_big_array as _;
use thiserror as _;

fn engine(mode: Mode) -> Engine<X86> {
    Engine::new(&EngineConfig { mode })
}

#[rstest]
#[case(Mode::Real16)]
#[case(Mode::Protected32)]
#[case(Mode::Long64)]
fn reset_returns_a_dirty_instance_to_its_power_on_state(#[case] mode: Mode) {
    let pristine = engine(mode);
    let mut dirty = engine(mode);
    dirty
        .reg_write(&[WriteRequest {
            regid: X86Reg::Ebx.raw(),
            src: &0x4242_4242_u32.to_le_bytes(),
        }])
        .expect("write accepted");
    dirty.set_pc(0x7C00);
    dirty.reset();
    assert_eq!(dirty.state(), pristine.state());
}

#[test]
fn protected_mode_reset_enables_protection_but_not_long_mode() {
    let mut engine = engine(Mode::Protected32);
    let mut cr0 = [0_u8; 4];
    engine
        .reg_read(&mut [ReadRequest {
            regid: X86Reg::Cr0.raw(),
            dest: &mut cr0,
        }])
        .expect("read accepted");
    assert_eq!(u32::from_le_bytes(cr0) & 1, 1, "protection enable set");
    assert_eq!(engine.state().efer, 0);
}

#[test]
fn real_mode_reset_starts_with_protection_disabled() {
    let engine = engine(Mode::Real16);
    assert_eq!(engine.state().cr[0], 0);
    assert_eq!(engine.state().hflags, 0);
}

#[test]
fn the_real_mode_pc_is_formed_from_the_code_segment() {
    let mut engine = engine(Mode::Real16);
    engine.state_mut().segs[Seg::Cs.index()].selector = 0x07C0;
    engine.set_pc(0x7C05);
    assert_eq!(engine.state().eip, 0x05);
    assert_eq!(engine.pc(), 0x7C05);
}

#[test]
fn a_pc_write_raises_the_execution_interrupt_exactly_once() {
    let mut engine = engine(Mode::Protected32);
    assert_eq!(engine.exec().run_state(), RunState::Running);

    engine
        .reg_write(&[
            WriteRequest {
                regid: X86Reg::Eip.raw(),
                src: &0x8048_0000_u32.to_le_bytes(),
            },
            WriteRequest {
                regid: X86Reg::Eip.raw(),
                src: &0x8048_1000_u32.to_le_bytes(),
            },
        ])
        .expect("batch accepted");

    assert_eq!(engine.exec().run_state(), RunState::QuitRequested);
    assert!(engine.exec_mut().take_discard());
    // One batch, one discard request, however many entries redirected.
    assert!(!engine.exec_mut().take_discard());
    assert_eq!(engine.pc(), 0x8048_1000);
}

#[test]
fn plain_writes_leave_the_execution_core_running() {
    let mut engine = engine(Mode::Protected32);
    engine
        .reg_write(&[WriteRequest {
            regid: X86Reg::Eax.raw(),
            src: &0x1234_u32.to_le_bytes(),
        }])
        .expect("write accepted");
    assert_eq!(engine.exec().run_state(), RunState::Running);
    assert!(!engine.exec().discard_pending());
}

#[test]
fn set_pc_is_the_quiet_engine_internal_path() {
    let mut engine = engine(Mode::Long64);
    engine.set_pc(0xFFFF_8000_0000_0000);
    assert_eq!(engine.pc(), 0xFFFF_8000_0000_0000);
    assert_eq!(engine.exec().run_state(), RunState::Running);
}

#[test]
fn a_context_snapshot_outlives_changes_to_the_live_state() {
    let mut engine = engine(Mode::Long64);
    engine
        .reg_write(&[WriteRequest {
            regid: X86Reg::Rax.raw(),
            src: &0x1111_u64.to_le_bytes(),
        }])
        .expect("write accepted");

    let snapshot = engine.save_context();
    engine
        .reg_write(&[WriteRequest {
            regid: X86Reg::Rax.raw(),
            src: &0x2222_u64.to_le_bytes(),
        }])
        .expect("write accepted");

    engine.restore_context(&snapshot);
    assert_eq!(engine.state().regs[0], 0x1111);
}

#[test]
fn a_snapshot_supports_the_register_protocol_without_an_execution_core() {
    let engine = engine(Mode::Long64);
    let mut snapshot = engine.save_context();
    snapshot
        .reg_write(&[WriteRequest {
            regid: X86Reg::Rip.raw(),
            src: &0x4000_u64.to_le_bytes(),
        }])
        .expect("snapshot write accepted");

    let mut buf = [0_u8; 8];
    snapshot
        .reg_read(&mut [ReadRequest {
            regid: X86Reg::Rip.raw(),
            dest: &mut buf,
        }])
        .expect("snapshot read accepted");
    assert_eq!(buf, 0x4000_u64.to_le_bytes());
}

#[test]
fn a_snapshot_transplants_state_between_instances() {
    let mut source = engine(Mode::Long64);
    source
        .reg_write(&[WriteRequest {
            regid: X86Reg::R15.raw(),
            src: &0xABCD_u64.to_le_bytes(),
        }])
        .expect("write accepted");

    let mut target = engine(Mode::Long64);
    target.restore_context(&source.save_context());
    assert_eq!(target.state().regs[15], 0xABCD);
}

#[test]
fn release_frees_the_translation_caches() {
    let mut state = X86::new_state(Mode::Protected32);
    state.tlb[1].insert(TlbEntry {
        linear: 0x1000,
        physical: 0x7000,
    });
    X86::release(&mut state);
    assert!(state.tlb.iter().all(|cache| cache.is_empty()));
}

#[test]
fn sparc_reset_zeroes_the_window_file_and_pointer() {
    let mut engine = Engine::<Sparc>::new(&EngineConfig {
        mode: Mode::Protected32,
    });
    engine.state_mut().cwp = 5;
    engine
        .reg_write(&[WriteRequest {
            regid: SparcReg::L0.raw(),
            src: &0xFFFF_u32.to_le_bytes(),
        }])
        .expect("write accepted");
    engine.reset();
    assert_eq!(engine.state().cwp, 0);
    assert!(engine.state().wregs.iter().all(|slot| *slot == 0));
}

#[test]
fn a_sparc_pc_write_redirects_the_delay_slot_and_interrupts() {
    let mut engine = Engine::<Sparc>::new(&EngineConfig {
        mode: Mode::Protected32,
    });
    engine
        .reg_write(&[WriteRequest {
            regid: SparcReg::Pc.raw(),
            src: &0x4000_u32.to_le_bytes(),
        }])
        .expect("write accepted");
    assert_eq!(engine.pc(), 0x4000);
    assert_eq!(engine.state().npc, 0x4004);
    assert_eq!(engine.exec().run_state(), RunState::QuitRequested);
}
