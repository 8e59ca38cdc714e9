//! Flat register-identifier namespace and descriptor table for the
//! segmented/long-mode architecture.
//!
//! Identifiers are pure keys with stable `u32` values partitioned into
//! disjoint ranges per register category. The descriptor table maps an
//! identifier, filtered by execution mode and access direction, to its
//! storage rule and expected byte width; the two dimensions are kept
//! orthogonal so mode gating never leaks into storage dispatch.

use crate::x86::codec::{MsrRecord, TableReg};
use crate::x86::state::{Seg, FP80_BYTES, XMM_BYTES, YMM_BYTES};
use crate::{GprView, Mode};

macro_rules! x86_registers {
    ($(($variant:ident, $value:literal)),+ $(,)?) => {
        /// Register identifier in the architecture's flat namespace.
        ///
        /// Discriminants are stable across engine versions; ranges are
        /// reserved per category so new identifiers extend, never renumber.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[repr(u32)]
        #[allow(missing_docs)]
        pub enum X86Reg {
            $($variant = $value),+
        }

        impl X86Reg {
            /// Every identifier in the namespace, in discriminant order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable raw identifier value.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self as u32
            }

            /// Decodes a raw identifier, rejecting values outside the
            /// namespace.
            #[must_use]
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

x86_registers! {
    // Canonical 64-bit general-purpose registers.
    (Rax, 0x01), (Rcx, 0x02), (Rdx, 0x03), (Rbx, 0x04),
    (Rsp, 0x05), (Rbp, 0x06), (Rsi, 0x07), (Rdi, 0x08),
    (R8, 0x09), (R9, 0x0A), (R10, 0x0B), (R11, 0x0C),
    (R12, 0x0D), (R13, 0x0E), (R14, 0x0F), (R15, 0x10),
    // 32-bit aliases.
    (Eax, 0x11), (Ecx, 0x12), (Edx, 0x13), (Ebx, 0x14),
    (Esp, 0x15), (Ebp, 0x16), (Esi, 0x17), (Edi, 0x18),
    (R8d, 0x19), (R9d, 0x1A), (R10d, 0x1B), (R11d, 0x1C),
    (R12d, 0x1D), (R13d, 0x1E), (R14d, 0x1F), (R15d, 0x20),
    // 16-bit aliases.
    (Ax, 0x21), (Cx, 0x22), (Dx, 0x23), (Bx, 0x24),
    (Sp, 0x25), (Bp, 0x26), (Si, 0x27), (Di, 0x28),
    (R8w, 0x29), (R9w, 0x2A), (R10w, 0x2B), (R11w, 0x2C),
    (R12w, 0x2D), (R13w, 0x2E), (R14w, 0x2F), (R15w, 0x30),
    // Low-byte aliases.
    (Al, 0x31), (Cl, 0x32), (Dl, 0x33), (Bl, 0x34),
    (Spl, 0x35), (Bpl, 0x36), (Sil, 0x37), (Dil, 0x38),
    (R8b, 0x39), (R9b, 0x3A), (R10b, 0x3B), (R11b, 0x3C),
    (R12b, 0x3D), (R13b, 0x3E), (R14b, 0x3F), (R15b, 0x40),
    // High-byte aliases over the first four canonical registers.
    (Ah, 0x41), (Ch, 0x42), (Dh, 0x43), (Bh, 0x44),
    // Instruction pointer.
    (Rip, 0x48), (Eip, 0x49), (Ip, 0x4A),
    // Flags.
    (Rflags, 0x4C), (Eflags, 0x4D), (Flags, 0x4E),
    // Segment selectors and directly addressable segment bases.
    (Es, 0x50), (Cs, 0x51), (Ss, 0x52), (Ds, 0x53), (Fs, 0x54), (Gs, 0x55),
    (FsBase, 0x56), (GsBase, 0x57),
    // Control registers.
    (Cr0, 0x58), (Cr1, 0x59), (Cr2, 0x5A), (Cr3, 0x5B), (Cr4, 0x5C),
    // Debug registers.
    (Dr0, 0x60), (Dr1, 0x61), (Dr2, 0x62), (Dr3, 0x63),
    (Dr4, 0x64), (Dr5, 0x65), (Dr6, 0x66), (Dr7, 0x67),
    // Descriptor-table registers.
    (Gdtr, 0x68), (Idtr, 0x69), (Ldtr, 0x6A), (Tr, 0x6B),
    // x87 bank, physically and top-of-stack indexed.
    (Fp0, 0x70), (Fp1, 0x71), (Fp2, 0x72), (Fp3, 0x73),
    (Fp4, 0x74), (Fp5, 0x75), (Fp6, 0x76), (Fp7, 0x77),
    (St0, 0x78), (St1, 0x79), (St2, 0x7A), (St3, 0x7B),
    (St4, 0x7C), (St5, 0x7D), (St6, 0x7E), (St7, 0x7F),
    // x87 control/status block.
    (Fpcw, 0x80), (Fpsw, 0x81), (Fptag, 0x82), (Fip, 0x83),
    (Fcs, 0x84), (Fdp, 0x85), (Fds, 0x86), (Fop, 0x87),
    (Mxcsr, 0x88),
    // Vector banks.
    (Xmm0, 0x90), (Xmm1, 0x91), (Xmm2, 0x92), (Xmm3, 0x93),
    (Xmm4, 0x94), (Xmm5, 0x95), (Xmm6, 0x96), (Xmm7, 0x97),
    (Xmm8, 0x98), (Xmm9, 0x99), (Xmm10, 0x9A), (Xmm11, 0x9B),
    (Xmm12, 0x9C), (Xmm13, 0x9D), (Xmm14, 0x9E), (Xmm15, 0x9F),
    (Ymm0, 0xA0), (Ymm1, 0xA1), (Ymm2, 0xA2), (Ymm3, 0xA3),
    (Ymm4, 0xA4), (Ymm5, 0xA5), (Ymm6, 0xA6), (Ymm7, 0xA7),
    (Ymm8, 0xA8), (Ymm9, 0xA9), (Ymm10, 0xAA), (Ymm11, 0xAB),
    (Ymm12, 0xAC), (Ymm13, 0xAD), (Ymm14, 0xAE), (Ymm15, 0xAF),
    // Virtual model-specific-register access.
    (Msr, 0xB0),
}

/// Access direction the descriptor lookup is filtered by.
///
/// The namespace is almost direction-symmetric; the exceptions are the
/// directly addressable segment bases, which are readable outside long mode
/// but writable only inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Register-to-buffer transfer.
    Read,
    /// Buffer-to-register transfer.
    Write,
}

/// x87 control/status block field addressed by an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FpField {
    /// Control word.
    ControlWord,
    /// Status word with the top-of-stack index folded into bits 11..14.
    StatusWord,
    /// Tag word derived from per-register validity and contents.
    TagWord,
    /// Last instruction pointer.
    InstructionPointer,
    /// Last instruction code-segment selector.
    InstructionSelector,
    /// Last operand pointer.
    DataPointer,
    /// Last operand segment selector.
    DataSelector,
    /// Last opcode bits.
    LastOpcode,
}

/// Descriptor-table register addressed by an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    /// Global descriptor table (base and limit only).
    Gdt,
    /// Interrupt descriptor table (base and limit only).
    Idt,
    /// Local descriptor table (full four-field record).
    Ldt,
    /// Task register (full four-field record).
    Tr,
}

impl TableId {
    /// Returns `true` when the register carries selector and flags fields
    /// in addition to base and limit.
    #[must_use]
    pub const fn has_selector(self) -> bool {
        matches!(self, Self::Ldt | Self::Tr)
    }
}

/// Storage rule resolved from an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Sub-field view over a canonical general-purpose register.
    Gpr {
        /// Index into the canonical register bank.
        index: usize,
        /// Sub-field view the identifier names.
        view: GprView,
    },
    /// Instruction pointer at the identifier's width.
    InstructionPointer,
    /// Architectural flags at the identifier's width.
    Flags,
    /// Segment selector.
    SegmentSelector(Seg),
    /// Directly addressable segment base.
    SegmentBase(Seg),
    /// Control register bank slot.
    Control(usize),
    /// Debug register bank slot.
    Debug(usize),
    /// Composite descriptor-table register.
    Table(TableId),
    /// x87 register addressed by physical bank position.
    FpPhysical(usize),
    /// x87 register addressed relative to the top-of-stack index.
    FpStack(usize),
    /// x87 control/status block field.
    FpControl(FpField),
    /// SSE control/status register.
    Mxcsr,
    /// Vector register, low 128-bit bank only.
    Xmm(usize),
    /// Vector register spanning the low bank and the high-extension bank.
    Ymm(usize),
    /// Virtual model-specific-register access via the microcode trampoline.
    Msr,
}

/// Resolved descriptor: expected value width plus storage rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegDescriptor {
    /// Expected caller-buffer width in bytes.
    pub width: usize,
    /// Storage rule the access dispatches on.
    pub storage: Storage,
}

const fn desc(width: usize, storage: Storage) -> RegDescriptor {
    RegDescriptor { width, storage }
}

fn gpr(offset: u32, view: GprView, long: bool) -> Option<RegDescriptor> {
    let index = usize::try_from(offset).ok()?;
    // Extended registers exist only in long mode, whatever the view width.
    if index >= 8 && !long {
        return None;
    }
    Some(desc(view.width(), Storage::Gpr { index, view }))
}

impl X86Reg {
    /// Resolves the descriptor for this identifier under a mode and access
    /// direction, or `None` when the identifier is not addressable there.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn descriptor(self, mode: Mode, dir: Direction) -> Option<RegDescriptor> {
        let id = self.raw();
        let long = mode.is_long();
        match id {
            0x01..=0x10 => {
                if !long {
                    return None;
                }
                gpr(id - 0x01, GprView::Qword, long)
            }
            0x11..=0x20 => gpr(id - 0x11, GprView::Dword, long),
            0x21..=0x30 => gpr(id - 0x21, GprView::Word, long),
            0x31..=0x40 => {
                let offset = id - 0x31;
                // SPL/BPL/SIL/DIL are REX-encoded and long-mode only.
                if offset >= 4 && !long {
                    return None;
                }
                gpr(offset, GprView::ByteLow, long)
            }
            0x41..=0x44 => gpr(id - 0x41, GprView::ByteHigh, long),
            0x48 => long.then_some(desc(8, Storage::InstructionPointer)),
            0x49 => Some(desc(4, Storage::InstructionPointer)),
            0x4A => Some(desc(2, Storage::InstructionPointer)),
            0x4C => long.then_some(desc(8, Storage::Flags)),
            0x4D => Some(desc(4, Storage::Flags)),
            0x4E => Some(desc(2, Storage::Flags)),
            0x50..=0x55 => {
                let seg = Seg::from_index(usize::try_from(id - 0x50).ok()?)?;
                Some(desc(2, Storage::SegmentSelector(seg)))
            }
            0x56 => match dir {
                Direction::Read => Some(desc(
                    if long { 8 } else { 4 },
                    Storage::SegmentBase(Seg::Fs),
                )),
                Direction::Write => long.then_some(desc(8, Storage::SegmentBase(Seg::Fs))),
            },
            0x57 => long.then_some(desc(8, Storage::SegmentBase(Seg::Gs))),
            0x58..=0x5C => Some(desc(
                mode.control_width(),
                Storage::Control(usize::try_from(id - 0x58).ok()?),
            )),
            0x60..=0x67 => Some(desc(
                mode.control_width(),
                Storage::Debug(usize::try_from(id - 0x60).ok()?),
            )),
            0x68 => Some(desc(TableReg::WIRE_BYTES, Storage::Table(TableId::Gdt))),
            0x69 => Some(desc(TableReg::WIRE_BYTES, Storage::Table(TableId::Idt))),
            0x6A => Some(desc(TableReg::WIRE_BYTES, Storage::Table(TableId::Ldt))),
            0x6B => Some(desc(TableReg::WIRE_BYTES, Storage::Table(TableId::Tr))),
            0x70..=0x77 => Some(desc(
                FP80_BYTES,
                Storage::FpPhysical(usize::try_from(id - 0x70).ok()?),
            )),
            0x78..=0x7F => Some(desc(
                FP80_BYTES,
                Storage::FpStack(usize::try_from(id - 0x78).ok()?),
            )),
            0x80 => Some(desc(2, Storage::FpControl(FpField::ControlWord))),
            0x81 => Some(desc(2, Storage::FpControl(FpField::StatusWord))),
            0x82 => Some(desc(2, Storage::FpControl(FpField::TagWord))),
            0x83 => Some(desc(8, Storage::FpControl(FpField::InstructionPointer))),
            0x84 => Some(desc(2, Storage::FpControl(FpField::InstructionSelector))),
            0x85 => Some(desc(8, Storage::FpControl(FpField::DataPointer))),
            0x86 => Some(desc(2, Storage::FpControl(FpField::DataSelector))),
            0x87 => Some(desc(2, Storage::FpControl(FpField::LastOpcode))),
            0x88 => Some(desc(4, Storage::Mxcsr)),
            0x90..=0x9F => {
                let index = usize::try_from(id - 0x90).ok()?;
                if index >= 8 && !long {
                    return None;
                }
                Some(desc(XMM_BYTES, Storage::Xmm(index)))
            }
            // The full 256-bit bank is addressable in every mode; only the
            // 128-bit identifiers gate the extended half on long mode.
            0xA0..=0xAF => Some(desc(YMM_BYTES, Storage::Ymm(usize::try_from(id - 0xA0).ok()?))),
            0xB0 => Some(desc(MsrRecord::WIRE_BYTES, Storage::Msr)),
            _ => None,
        }
    }
}
