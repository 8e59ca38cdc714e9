//! Single-register read/write dispatch for the segmented/long-mode backend.
//!
//! Access validates identifier and buffer width against the descriptor table
//! before touching any memory, then dispatches on the storage rule. Failures
//! leave both the caller's buffer and the CPU state untouched.

use crate::bytes::{read_uint, write_uint};
use crate::x86::codec::{
    fold_status_word, pack_tag_word, split_status_word, unpack_tag_word, MsrRecord, TableReg,
};
use crate::x86::msr;
use crate::x86::regs::{Direction, FpField, Storage, TableId, X86Reg};
use crate::x86::state::{
    Fp80, Seg, SegmentCache, X86State, CR0_PE, REAL_NON_CS_FLAGS, VM_MASK,
};
use crate::{AccessError, Mode, WriteEffect};

fn lookup(
    regid: u32,
    mode: Mode,
    dir: Direction,
    len: usize,
) -> Result<Storage, AccessError> {
    let descriptor = X86Reg::from_u32(regid)
        .and_then(|reg| reg.descriptor(mode, dir))
        .ok_or(AccessError::UnknownRegister { regid, mode })?;
    if descriptor.width != len {
        return Err(AccessError::WidthMismatch {
            expected: descriptor.width,
            got: len,
        });
    }
    Ok(descriptor.storage)
}

/// Reads one register into `dest`.
///
/// # Errors
///
/// Unknown identifier or width mismatch; `dest` is untouched on failure.
pub fn read(
    state: &mut X86State,
    regid: u32,
    dest: &mut [u8],
    mode: Mode,
) -> Result<(), AccessError> {
    match lookup(regid, mode, Direction::Read, dest.len())? {
        Storage::Gpr { index, view } => write_uint(dest, view.load(state.regs[index])),
        Storage::InstructionPointer => write_uint(dest, state.eip),
        Storage::Flags => write_uint(dest, state.eflags),
        Storage::SegmentSelector(seg) => {
            write_uint(dest, u64::from(state.segs[seg.index()].selector));
        }
        Storage::SegmentBase(seg) => write_uint(dest, state.segs[seg.index()].base),
        Storage::Control(index) => write_uint(dest, state.cr[index]),
        Storage::Debug(index) => write_uint(dest, state.dr[index]),
        Storage::Table(table) => {
            let cache = table_cache(state, table);
            TableReg {
                base: truncate_table_base(cache.base, mode),
                limit: truncate_table_limit(cache.limit, table),
                selector: cache.selector,
                flags: cache.flags,
            }
            .encode(dest);
        }
        Storage::FpPhysical(index) => state.fpregs[index].encode(dest),
        Storage::FpStack(index) => {
            state.fpregs[stack_to_physical(state.fpstt, index)].encode(dest);
        }
        Storage::FpControl(field) => read_fp_field(state, field, dest),
        Storage::Mxcsr => write_uint(dest, u64::from(state.mxcsr)),
        Storage::Xmm(index) => {
            write_uint(&mut dest[0..8], state.xmm_regs[index][0]);
            write_uint(&mut dest[8..16], state.xmm_regs[index][1]);
        }
        Storage::Ymm(index) => {
            write_uint(&mut dest[0..8], state.xmm_regs[index][0]);
            write_uint(&mut dest[8..16], state.xmm_regs[index][1]);
            write_uint(&mut dest[16..24], state.ymmh_regs[index][0]);
            write_uint(&mut dest[24..32], state.ymmh_regs[index][1]);
        }
        Storage::Msr => {
            let index = MsrRecord::decode(dest).index;
            let value = msr::read(state, index);
            MsrRecord::encode_value(dest, value);
        }
    }
    Ok(())
}

/// Writes one register from `src`, reporting whether the program counter was
/// redirected.
///
/// # Errors
///
/// Unknown identifier, width mismatch, or rejected selector; CPU state is
/// untouched on failure.
pub fn write(
    state: &mut X86State,
    regid: u32,
    src: &[u8],
    mode: Mode,
) -> Result<WriteEffect, AccessError> {
    let storage = lookup(regid, mode, Direction::Write, src.len())?;
    match storage {
        Storage::Gpr { index, view } => view.store(&mut state.regs[index], read_uint(src)),
        Storage::InstructionPointer => {
            write_ip(state, read_uint(src), src.len(), mode);
            return Ok(WriteEffect::PcRedirected);
        }
        // Flags loads replace the whole word at every identifier width.
        Storage::Flags => state.eflags = read_uint(src),
        Storage::SegmentSelector(seg) => {
            #[allow(clippy::cast_possible_truncation)]
            let selector = read_uint(src) as u16;
            write_selector(state, seg, selector, mode)?;
        }
        Storage::SegmentBase(seg) => state.segs[seg.index()].base = read_uint(src),
        Storage::Control(index) => {
            state.cr[index] = read_uint(src);
            // Translation configuration may have changed under the caches.
            state.flush_translation_caches();
        }
        Storage::Debug(index) => state.dr[index] = read_uint(src),
        Storage::Table(table) => {
            let record = TableReg::decode(src);
            let cache = table_cache_mut(state, table);
            cache.base = truncate_table_base(record.base, mode);
            cache.limit = truncate_table_limit(record.limit, table);
            if table.has_selector() {
                cache.selector = record.selector;
                cache.flags = record.flags;
            }
        }
        Storage::FpPhysical(index) => state.fpregs[index] = Fp80::decode(src),
        Storage::FpStack(index) => {
            state.fpregs[stack_to_physical(state.fpstt, index)] = Fp80::decode(src);
        }
        Storage::FpControl(field) => write_fp_field(state, field, src),
        Storage::Mxcsr => {
            #[allow(clippy::cast_possible_truncation)]
            {
                state.mxcsr = read_uint(src) as u32;
            }
        }
        Storage::Xmm(index) => {
            state.xmm_regs[index][0] = read_uint(&src[0..8]);
            state.xmm_regs[index][1] = read_uint(&src[8..16]);
        }
        Storage::Ymm(index) => {
            state.xmm_regs[index][0] = read_uint(&src[0..8]);
            state.xmm_regs[index][1] = read_uint(&src[8..16]);
            state.ymmh_regs[index][0] = read_uint(&src[16..24]);
            state.ymmh_regs[index][1] = read_uint(&src[24..32]);
        }
        Storage::Msr => {
            let record = MsrRecord::decode(src);
            msr::write(state, record.index, record.value);
        }
    }
    Ok(WriteEffect::Plain)
}

const fn stack_to_physical(fpstt: u8, offset: usize) -> usize {
    (fpstt as usize + offset) & 7
}

const fn table_cache(state: &X86State, table: TableId) -> &SegmentCache {
    match table {
        TableId::Gdt => &state.gdt,
        TableId::Idt => &state.idt,
        TableId::Ldt => &state.ldt,
        TableId::Tr => &state.tr,
    }
}

const fn table_cache_mut(state: &mut X86State, table: TableId) -> &mut SegmentCache {
    match table {
        TableId::Gdt => &mut state.gdt,
        TableId::Idt => &mut state.idt,
        TableId::Ldt => &mut state.ldt,
        TableId::Tr => &mut state.tr,
    }
}

/// Bases hold only as many bits as the mode can address.
const fn truncate_table_base(base: u64, mode: Mode) -> u64 {
    if mode.table_base_width() == 8 {
        base
    } else {
        base & 0xFFFF_FFFF
    }
}

/// The global and interrupt table limits are 16-bit architectural fields;
/// the full-record registers keep a 32-bit limit.
const fn truncate_table_limit(limit: u32, table: TableId) -> u32 {
    if table.has_selector() {
        limit
    } else {
        limit & 0xFFFF
    }
}

/// Replaces only the low `width` bytes of a stored word.
const fn store_masked(storage: &mut u64, value: u64, width: usize) {
    let mask = if width >= 8 {
        u64::MAX
    } else {
        (1_u64 << (8 * width)) - 1
    };
    *storage = (*storage & !mask) | (value & mask);
}

/// Instruction-pointer store semantics by identifier width.
///
/// The full-width and 32-bit identifiers replace the whole pointer; the
/// 16-bit identifier replaces the whole pointer in the narrow modes but is a
/// partial low-word store in long mode, where the upper pointer bits stay
/// live.
const fn write_ip(state: &mut X86State, value: u64, width: usize, mode: Mode) {
    if width == 2 && mode.is_long() {
        store_masked(&mut state.eip, value, 2);
    } else {
        state.eip = value;
    }
}

fn read_fp_field(state: &X86State, field: FpField, dest: &mut [u8]) {
    let value = match field {
        FpField::ControlWord => u64::from(state.fpuc),
        FpField::StatusWord => u64::from(fold_status_word(state.fpus, state.fpstt)),
        FpField::TagWord => u64::from(pack_tag_word(state)),
        FpField::InstructionPointer => state.fpip,
        FpField::InstructionSelector => u64::from(state.fpcs),
        FpField::DataPointer => state.fpdp,
        FpField::DataSelector => u64::from(state.fpds),
        FpField::LastOpcode => u64::from(state.fpop),
    };
    write_uint(dest, value);
}

#[allow(clippy::cast_possible_truncation)]
fn write_fp_field(state: &mut X86State, field: FpField, src: &[u8]) {
    let value = read_uint(src);
    match field {
        FpField::ControlWord => state.fpuc = value as u16,
        FpField::StatusWord => {
            let (fpus, fpstt) = split_status_word(value as u16);
            state.fpus = fpus;
            state.fpstt = fpstt;
        }
        FpField::TagWord => state.fptags = unpack_tag_word(value as u16),
        FpField::InstructionPointer => state.fpip = value,
        FpField::InstructionSelector => state.fpcs = value as u16,
        FpField::DataPointer => state.fpdp = value,
        FpField::DataSelector => state.fpds = value as u16,
        FpField::LastOpcode => state.fpop = value as u16,
    }
}

/// Validates a selector against the descriptor tables before any load.
///
/// With protection disabled or in virtual-8086 mode every selector is
/// acceptable. A null selector loads anywhere except the stack segment. A
/// non-null selector must fit its descriptor table: the addressed descriptor
/// must end within the table limit.
fn check_load_seg(state: &X86State, seg: Seg, selector: u16) -> Result<(), AccessError> {
    if state.cr[0] & CR0_PE == 0 || state.eflags & VM_MASK != 0 {
        return Ok(());
    }
    if selector & 0xFFFC == 0 {
        if seg == Seg::Ss {
            return Err(AccessError::RejectedSelector { selector });
        }
        return Ok(());
    }
    let table = if selector & 4 == 0 {
        &state.gdt
    } else {
        &state.ldt
    };
    let descriptor_end = u32::from(selector & !7) + 7;
    if descriptor_end > table.limit {
        return Err(AccessError::RejectedSelector { selector });
    }
    Ok(())
}

/// Mirror of the instruction-level segment load. With protection off the
/// base is formed from the selector; under protection a flat cache entry is
/// installed, since resolving descriptor contents from the tables in guest
/// memory belongs to the address-translation layer.
fn load_seg(state: &mut X86State, seg: Seg, selector: u16) {
    if state.cr[0] & CR0_PE == 0 || state.eflags & VM_MASK != 0 {
        state.segs[seg.index()].load(selector, u64::from(selector) << 4, 0xFFFF, 0);
    } else {
        state.segs[seg.index()].load(selector, 0, 0xFFFF_FFFF, REAL_NON_CS_FLAGS);
    }
}

/// Segment-selector store semantics per execution mode.
///
/// Real-address mode reloads data segments with the selector-derived base.
/// Protected mode validates the selector and installs a flat cache entry;
/// resolving the actual descriptor contents belongs to the address
/// translation layer. Long mode stores the wide segments raw and validates
/// only FS and GS, the two segments still used for address formation.
fn write_selector(
    state: &mut X86State,
    seg: Seg,
    selector: u16,
    mode: Mode,
) -> Result<(), AccessError> {
    match mode {
        Mode::Real16 if seg != Seg::Cs => {
            state.segs[seg.index()].load_real(selector, REAL_NON_CS_FLAGS);
            Ok(())
        }
        Mode::Real16 | Mode::Protected32 => {
            check_load_seg(state, seg, selector)?;
            load_seg(state, seg, selector);
            Ok(())
        }
        Mode::Long64 => match seg {
            Seg::Fs | Seg::Gs => {
                check_load_seg(state, seg, selector)?;
                let base = state.segs[seg.index()].base;
                state.segs[seg.index()].load(selector, base, 0xFFFF_FFFF, REAL_NON_CS_FLAGS);
                Ok(())
            }
            _ => {
                state.segs[seg.index()].selector = selector;
                Ok(())
            }
        },
    }
}
