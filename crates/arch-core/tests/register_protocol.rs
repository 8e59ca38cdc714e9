//! End-to-end coverage of the batch register protocol: width validation,
//! aliasing, mode gating, composite codecs, and first-failure ordering.

use arch_core::sparc::{Sparc, SparcReg};
use arch_core::x86::{X86Reg, X86};
use arch_core::{
    AccessError, Engine, EngineConfig, ErrorKind, Mode, ReadRequest, WriteRequest,
};
use proptest::prelude::*;
use rstest::rstest;

#[cfg(feature = "serde")]
use serde as _;
#[cfg(feature = "serde")]
use serde_big_array as _;
use thiserror as _;

fn engine(mode: Mode) -> Engine<X86> {
    Engine::new(&EngineConfig { mode })
}

fn read_reg(engine: &mut Engine<X86>, reg: X86Reg, width: usize) -> Vec<u8> {
    let mut buf = vec![0_u8; width];
    engine
        .reg_read(&mut [ReadRequest {
            regid: reg.raw(),
            dest: &mut buf,
        }])
        .expect("read accepted");
    buf
}

fn write_reg(engine: &mut Engine<X86>, reg: X86Reg, src: &[u8]) {
    engine
        .reg_write(&[WriteRequest {
            regid: reg.raw(),
            src,
        }])
        .expect("write accepted");
}

fn round_trip_pattern(width: usize) -> Vec<u8> {
    (0_u8..)
        .map(|i| i.wrapping_mul(0x11).wrapping_add(0x07))
        .take(width)
        .collect()
}

#[rstest]
#[case(X86Reg::Eax, Mode::Real16, 4)]
#[case(X86Reg::Ax, Mode::Real16, 2)]
#[case(X86Reg::Eax, Mode::Protected32, 4)]
#[case(X86Reg::Rax, Mode::Long64, 8)]
#[case(X86Reg::Cr0, Mode::Protected32, 4)]
#[case(X86Reg::Cr0, Mode::Long64, 8)]
#[case(X86Reg::Dr7, Mode::Protected32, 4)]
#[case(X86Reg::Xmm0, Mode::Protected32, 16)]
#[case(X86Reg::Ymm0, Mode::Real16, 32)]
#[case(X86Reg::Ymm8, Mode::Protected32, 32)]
#[case(X86Reg::St3, Mode::Protected32, 10)]
#[case(X86Reg::Gdtr, Mode::Protected32, 18)]
fn a_correctly_sized_buffer_is_accepted(
    #[case] reg: X86Reg,
    #[case] mode: Mode,
    #[case] width: usize,
) {
    let mut engine = engine(mode);
    let buf = read_reg(&mut engine, reg, width);
    assert_eq!(buf.len(), width);
}

#[rstest]
#[case(X86Reg::Rax, Mode::Long64, 4)]
#[case(X86Reg::Eax, Mode::Protected32, 8)]
#[case(X86Reg::Cr0, Mode::Long64, 4)]
#[case(X86Reg::Cr0, Mode::Protected32, 8)]
#[case(X86Reg::Gdtr, Mode::Long64, 16)]
fn a_mis_sized_buffer_is_rejected_before_any_transfer(
    #[case] reg: X86Reg,
    #[case] mode: Mode,
    #[case] width: usize,
) {
    let mut engine = engine(mode);
    let mut buf = vec![0xEE_u8; width];
    let err = engine
        .reg_read(&mut [ReadRequest {
            regid: reg.raw(),
            dest: &mut buf,
        }])
        .expect_err("mismatched width rejected");
    assert!(matches!(err, AccessError::WidthMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidArg);
    // Rejected reads leave the destination untouched.
    assert!(buf.iter().all(|byte| *byte == 0xEE));
}

#[rstest]
#[case(X86Reg::Rax)]
#[case(X86Reg::R8d)]
#[case(X86Reg::Sil)]
#[case(X86Reg::Rip)]
#[case(X86Reg::Rflags)]
#[case(X86Reg::GsBase)]
#[case(X86Reg::Xmm8)]
fn long_mode_identifiers_do_not_exist_in_the_narrow_modes(#[case] reg: X86Reg) {
    for mode in [Mode::Real16, Mode::Protected32] {
        let mut engine = engine(mode);
        let mut buf = [0_u8; 8];
        let err = engine
            .reg_read(&mut [ReadRequest {
                regid: reg.raw(),
                dest: &mut buf,
            }])
            .expect_err("long-only identifier rejected");
        assert_eq!(
            err,
            AccessError::UnknownRegister {
                regid: reg.raw(),
                mode
            }
        );
    }
}

#[test]
fn the_real_mode_surface_is_a_subset_of_the_protected_one() {
    for reg in X86Reg::ALL {
        for dir in [
            arch_core::x86::Direction::Read,
            arch_core::x86::Direction::Write,
        ] {
            if reg.descriptor(Mode::Real16, dir).is_some() {
                assert!(
                    reg.descriptor(Mode::Protected32, dir).is_some(),
                    "{reg:?} addressable in real mode but not protected mode"
                );
            }
        }
    }
}

#[test]
fn narrow_aliases_expose_the_canonical_storage() {
    let mut engine = engine(Mode::Long64);
    write_reg(&mut engine, X86Reg::Rax, &0x1122_3344_5566_7788_u64.to_le_bytes());
    assert_eq!(read_reg(&mut engine, X86Reg::Eax, 4), 0x5566_7788_u32.to_le_bytes());
    assert_eq!(read_reg(&mut engine, X86Reg::Ax, 2), 0x7788_u16.to_le_bytes());
    assert_eq!(read_reg(&mut engine, X86Reg::Al, 1), [0x88]);
    assert_eq!(read_reg(&mut engine, X86Reg::Ah, 1), [0x77]);
}

#[test]
fn a_high_byte_store_leaves_the_rest_of_the_register_alone() {
    let mut engine = engine(Mode::Long64);
    write_reg(&mut engine, X86Reg::Rbx, &0x1122_3344_5566_7788_u64.to_le_bytes());
    write_reg(&mut engine, X86Reg::Bh, &[0xAB]);
    assert_eq!(
        read_reg(&mut engine, X86Reg::Rbx, 8),
        0x1122_3344_5566_AB88_u64.to_le_bytes()
    );
}

#[test]
fn a_failed_entry_stops_the_batch_without_rolling_back() {
    let mut engine = engine(Mode::Protected32);
    let first = 0x1111_1111_u32.to_le_bytes();
    let third = 0x3333_3333_u32.to_le_bytes();
    let err = engine
        .reg_write(&[
            WriteRequest {
                regid: X86Reg::Eax.raw(),
                src: &first,
            },
            WriteRequest {
                regid: X86Reg::Rax.raw(),
                src: &[0_u8; 8],
            },
            WriteRequest {
                regid: X86Reg::Ebx.raw(),
                src: &third,
            },
        ])
        .expect_err("second entry fails");
    assert!(matches!(err, AccessError::UnknownRegister { .. }));
    // The first entry retains its effect, the third was never processed.
    assert_eq!(read_reg(&mut engine, X86Reg::Eax, 4), first);
    assert_eq!(read_reg(&mut engine, X86Reg::Ebx, 4), [0_u8; 4]);
}

#[rstest]
#[case(Mode::Real16)]
#[case(Mode::Protected32)]
#[case(Mode::Long64)]
fn every_writable_identifier_round_trips_at_its_descriptor_width(#[case] mode: Mode) {
    use arch_core::x86::{Direction, FpField, Storage};

    let mut engine = engine(mode);
    // Open the descriptor tables so any selector passes the bounds check.
    engine.state_mut().gdt.limit = 0xFFFF;
    engine.state_mut().ldt.limit = 0xFFFF;

    for reg in X86Reg::ALL {
        let Some(write_desc) = reg.descriptor(mode, Direction::Write) else {
            continue;
        };
        let read_desc = reg
            .descriptor(mode, Direction::Read)
            .expect("writable identifiers are readable");
        assert_eq!(read_desc.width, write_desc.width, "{reg:?}");

        let width = write_desc.width;
        let value = match write_desc.storage {
            Storage::Table(table) => {
                // Keep the base inside 32 bits and the limit inside 16 so
                // the mode truncation rules cannot alter the record.
                let mut record = vec![0_u8; width];
                record[0..8].copy_from_slice(&0x00AB_C000_u64.to_le_bytes());
                record[8..12].copy_from_slice(&0x0FFF_u32.to_le_bytes());
                if table.has_selector() {
                    record[12..14].copy_from_slice(&0x0028_u16.to_le_bytes());
                    record[14..18].copy_from_slice(&0x8200_u32.to_le_bytes());
                }
                record
            }
            // The tag word is re-derived on read; only all-empty is stable
            // without also staging register contents.
            Storage::FpControl(FpField::TagWord) => 0xFFFF_u16.to_le_bytes().to_vec(),
            Storage::Msr => {
                let mut record = vec![0_u8; width];
                record[0..4].copy_from_slice(&0x10_u32.to_le_bytes());
                record[4..12].copy_from_slice(&0x0123_4567_89AB_CDEF_u64.to_le_bytes());
                record
            }
            _ => round_trip_pattern(width),
        };

        engine
            .reg_write(&[WriteRequest {
                regid: reg.raw(),
                src: &value,
            }])
            .unwrap_or_else(|err| panic!("{reg:?} write rejected in {mode} mode: {err}"));

        let mut out = vec![0_u8; width];
        if write_desc.storage == Storage::Msr {
            out[0..4].copy_from_slice(&value[0..4]);
        }
        engine
            .reg_read(&mut [ReadRequest {
                regid: reg.raw(),
                dest: &mut out,
            }])
            .unwrap_or_else(|err| panic!("{reg:?} read rejected in {mode} mode: {err}"));
        assert_eq!(out, value, "{reg:?} round-trip in {mode} mode");
    }
}

#[test]
fn a_failed_read_entry_stops_the_batch_without_touching_later_buffers() {
    let mut engine = engine(Mode::Protected32);
    write_reg(&mut engine, X86Reg::Eax, &0x1111_1111_u32.to_le_bytes());
    write_reg(&mut engine, X86Reg::Ebx, &0x2222_2222_u32.to_le_bytes());

    let mut first = [0_u8; 4];
    // Wrong width for the second entry; the third is never reached.
    let mut second = [0xEE_u8; 8];
    let mut third = [0xEE_u8; 4];
    let err = engine
        .reg_read(&mut [
            ReadRequest {
                regid: X86Reg::Eax.raw(),
                dest: &mut first,
            },
            ReadRequest {
                regid: X86Reg::Ebx.raw(),
                dest: &mut second,
            },
            ReadRequest {
                regid: X86Reg::Ecx.raw(),
                dest: &mut third,
            },
        ])
        .expect_err("second entry fails");
    assert!(matches!(err, AccessError::WidthMismatch { .. }));
    assert_eq!(first, 0x1111_1111_u32.to_le_bytes());
    assert!(second.iter().all(|byte| *byte == 0xEE));
    assert!(third.iter().all(|byte| *byte == 0xEE));
}

#[test]
fn descriptor_table_records_round_trip_with_mode_limited_bases() {
    let mut engine = engine(Mode::Protected32);
    let mut record = [0_u8; 18];
    record[0..8].copy_from_slice(&0x0000_0001_DEAD_0000_u64.to_le_bytes());
    record[8..12].copy_from_slice(&0xFFF_u32.to_le_bytes());
    write_reg(&mut engine, X86Reg::Gdtr, &record);

    let out = read_reg(&mut engine, X86Reg::Gdtr, 18);
    // The 33rd base bit cannot exist outside long mode.
    assert_eq!(&out[0..8], &0x0000_0000_DEAD_0000_u64.to_le_bytes());
    assert_eq!(&out[8..12], &0xFFF_u32.to_le_bytes());
}

#[test]
fn task_register_records_carry_selector_and_flags() {
    let mut engine = engine(Mode::Long64);
    let mut record = [0_u8; 18];
    record[0..8].copy_from_slice(&0xFFFF_8000_0000_1000_u64.to_le_bytes());
    record[8..12].copy_from_slice(&0x67_u32.to_le_bytes());
    record[12..14].copy_from_slice(&0x40_u16.to_le_bytes());
    record[14..18].copy_from_slice(&0x8B00_u32.to_le_bytes());
    write_reg(&mut engine, X86Reg::Tr, &record);
    assert_eq!(read_reg(&mut engine, X86Reg::Tr, 18), record);
}

#[test]
fn the_floating_point_status_word_carries_the_stack_top() {
    let mut engine = engine(Mode::Protected32);
    write_reg(&mut engine, X86Reg::Fpsw, &0x3800_u16.to_le_bytes());
    // Stack top 7: ST(0) is physical register 7.
    let mut value = [0_u8; 10];
    value[0] = 0x5A;
    value[9] = 0x40;
    write_reg(&mut engine, X86Reg::St0, &value);
    assert_eq!(read_reg(&mut engine, X86Reg::Fp7, 10), value);
}

#[test]
fn msr_access_works_in_every_mode_and_never_fails() {
    for mode in [Mode::Real16, Mode::Protected32, Mode::Long64] {
        let mut engine = engine(mode);
        let mut record = [0_u8; 12];
        record[0..4].copy_from_slice(&0x10_u32.to_le_bytes());
        record[4..12].copy_from_slice(&0x1234_5678_u64.to_le_bytes());
        write_reg(&mut engine, X86Reg::Msr, &record);

        let mut out = [0_u8; 12];
        out[0..4].copy_from_slice(&0x10_u32.to_le_bytes());
        let mut request = [ReadRequest {
            regid: X86Reg::Msr.raw(),
            dest: &mut out,
        }];
        engine.reg_read(&mut request).expect("msr read accepted");
        assert_eq!(&out[4..12], &0x1234_5678_u64.to_le_bytes());
    }
}

#[test]
fn fs_base_is_readable_everywhere_but_writable_only_in_long_mode() {
    let mut narrow = engine(Mode::Protected32);
    let _ = read_reg(&mut narrow, X86Reg::FsBase, 4);
    let err = narrow
        .reg_write(&[WriteRequest {
            regid: X86Reg::FsBase.raw(),
            src: &[0_u8; 4],
        }])
        .expect_err("narrow-mode base write rejected");
    assert!(matches!(err, AccessError::UnknownRegister { .. }));

    let mut long = engine(Mode::Long64);
    write_reg(&mut long, X86Reg::FsBase, &0xFFFF_8000_0000_0000_u64.to_le_bytes());
    assert_eq!(
        read_reg(&mut long, X86Reg::FsBase, 8),
        0xFFFF_8000_0000_0000_u64.to_le_bytes()
    );
}

#[test]
fn window_registers_shift_with_the_window_pointer() {
    let mut engine = Engine::<Sparc>::new(&EngineConfig {
        mode: Mode::Protected32,
    });
    engine.state_mut().cwp = 1;
    engine
        .reg_write(&[WriteRequest {
            regid: SparcReg::I2.raw(),
            src: &0xFEED_u32.to_le_bytes(),
        }])
        .expect("write accepted");

    // The in registers of window 1 are the outs of window 2.
    engine.state_mut().cwp = 2;
    let mut buf = [0_u8; 4];
    engine
        .reg_read(&mut [ReadRequest {
            regid: SparcReg::O2.raw(),
            dest: &mut buf,
        }])
        .expect("read accepted");
    assert_eq!(buf, 0xFEED_u32.to_le_bytes());
}

proptest! {
    #[test]
    fn dword_alias_writes_never_touch_the_upper_half(
        canonical in any::<u64>(),
        replacement in any::<u32>(),
    ) {
        let mut engine = engine(Mode::Long64);
        write_reg(&mut engine, X86Reg::Rcx, &canonical.to_le_bytes());
        write_reg(&mut engine, X86Reg::Ecx, &replacement.to_le_bytes());
        let expected = (canonical & 0xFFFF_FFFF_0000_0000) | u64::from(replacement);
        prop_assert_eq!(read_reg(&mut engine, X86Reg::Rcx, 8), expected.to_le_bytes());
    }

    #[test]
    fn byte_aliases_partition_the_low_word(
        canonical in any::<u64>(),
        low in any::<u8>(),
        high in any::<u8>(),
    ) {
        let mut engine = engine(Mode::Long64);
        write_reg(&mut engine, X86Reg::Rdx, &canonical.to_le_bytes());
        write_reg(&mut engine, X86Reg::Dl, &[low]);
        write_reg(&mut engine, X86Reg::Dh, &[high]);
        let expected = (canonical & !0xFFFF_u64)
            | (u64::from(high) << 8)
            | u64::from(low);
        prop_assert_eq!(read_reg(&mut engine, X86Reg::Rdx, 8), expected.to_le_bytes());
    }
}
