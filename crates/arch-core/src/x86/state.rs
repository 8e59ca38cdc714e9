//! Architectural CPU state for the segmented/long-mode backend.

use crate::TranslationCache;

/// Wire width of one 80-bit floating-point register.
pub const FP80_BYTES: usize = 10;
/// Wire width of one 128-bit vector register.
pub const XMM_BYTES: usize = 16;
/// Wire width of one 256-bit vector register.
pub const YMM_BYTES: usize = 32;

/// Number of per-translation-regime software caches.
pub const NB_MMU_MODES: usize = 3;

/// Protected-mode enable bit in CR0.
pub const CR0_PE: u64 = 1;
/// Virtual-8086 flag in the architectural flags word.
pub const VM_MASK: u64 = 1 << 17;

/// 32-bit code segment hidden flag.
pub const HF_CS32: u32 = 1 << 4;
/// 32-bit stack segment hidden flag.
pub const HF_SS32: u32 = 1 << 5;
/// Segment-base addition required for address formation.
pub const HF_ADDSEG: u32 = 1 << 6;
/// Long mode active.
pub const HF_LMA: u32 = 1 << 14;
/// 64-bit code segment hidden flag.
pub const HF_CS64: u32 = 1 << 15;
/// SSE context save/restore enabled.
pub const HF_OSFXSR: u32 = 1 << 22;

/// Long-mode enable bit in the extended-feature-enable register.
pub const EFER_LME: u64 = 1 << 8;
/// Long-mode active bit in the extended-feature-enable register.
pub const EFER_LMA: u64 = 1 << 10;

/// Long-mode capability bit in the extended feature word.
pub const CPUID_EXT2_LM: u32 = 1 << 29;

/// Descriptor accessed bit.
pub const DESC_A: u32 = 1 << 8;
/// Descriptor readable (code) / writable (data) bit.
pub const DESC_RW: u32 = 1 << 9;
/// Descriptor code-segment bit.
pub const DESC_CS: u32 = 1 << 11;
/// Descriptor non-system bit.
pub const DESC_S: u32 = 1 << 12;
/// Descriptor present bit.
pub const DESC_P: u32 = 1 << 15;

/// Hidden flags for a real-address-mode data or stack segment.
pub const REAL_NON_CS_FLAGS: u32 = DESC_P | DESC_S | DESC_RW | DESC_A;
/// Hidden flags for a real-address-mode code segment.
pub const REAL_CS_FLAGS: u32 = DESC_P | DESC_S | DESC_CS | DESC_RW | DESC_A;

/// Power-on x87 control word: all exceptions masked, extended precision.
const FPUC_RESET: u16 = 0x037F;
/// Power-on SSE control/status word: all exceptions masked.
const MXCSR_RESET: u32 = 0x1F80;

/// Segment register bank position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Seg {
    /// Extra segment.
    Es,
    /// Code segment.
    Cs,
    /// Stack segment.
    Ss,
    /// Data segment.
    Ds,
    /// FS segment.
    Fs,
    /// GS segment.
    Gs,
}

impl Seg {
    /// All segments in bank order.
    pub const ALL: [Self; 6] = [Self::Es, Self::Cs, Self::Ss, Self::Ds, Self::Fs, Self::Gs];

    /// Bank index of this segment.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Segment at a bank index, if in range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Es),
            1 => Some(Self::Cs),
            2 => Some(Self::Ss),
            3 => Some(Self::Ds),
            4 => Some(Self::Fs),
            5 => Some(Self::Gs),
            _ => None,
        }
    }
}

/// Cached segment register: visible selector plus hidden descriptor fields.
///
/// The same shape backs the descriptor-table registers, where `selector` and
/// `flags` are meaningful only for the local-descriptor-table and task
/// registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SegmentCache {
    /// Visible selector.
    pub selector: u16,
    /// Cached base address.
    pub base: u64,
    /// Cached limit.
    pub limit: u32,
    /// Cached descriptor flags.
    pub flags: u32,
}

impl SegmentCache {
    /// Installs a full cache entry at once.
    pub const fn load(&mut self, selector: u16, base: u64, limit: u32, flags: u32) {
        self.selector = selector;
        self.base = base;
        self.limit = limit;
        self.flags = flags;
    }

    /// Installs a real-address-mode entry: the base is the selector shifted
    /// left by four, the limit spans one 64 KiB segment.
    pub fn load_real(&mut self, selector: u16, flags: u32) {
        self.load(selector, u64::from(selector) << 4, 0xFFFF, flags);
    }
}

/// One 80-bit floating-point register, split into its storage fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Fp80 {
    /// 64-bit mantissa, explicit integer bit included.
    pub mantissa: u64,
    /// Sign and 15-bit biased exponent.
    pub exponent: u16,
}

/// Full architectural CPU state.
///
/// Fields mirror the hardware register file; the accessors in
/// [`crate::x86::access`] are the only external mutation path, while the
/// execution core reaches the fields directly within the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct X86State {
    /// Canonical general-purpose register bank.
    pub regs: [u64; 16],
    /// Instruction pointer (offset within the code segment).
    pub eip: u64,
    /// Architectural flags word.
    pub eflags: u64,
    /// Segment register bank, indexed by [`Seg`].
    pub segs: [SegmentCache; 6],
    /// Control registers CR0..CR4.
    pub cr: [u64; 5],
    /// Debug registers DR0..DR7.
    pub dr: [u64; 8],
    /// Global descriptor table register.
    pub gdt: SegmentCache,
    /// Interrupt descriptor table register.
    pub idt: SegmentCache,
    /// Local descriptor table register.
    pub ldt: SegmentCache,
    /// Task register.
    pub tr: SegmentCache,
    /// x87 bank in physical order.
    pub fpregs: [Fp80; 8],
    /// x87 top-of-stack index.
    pub fpstt: u8,
    /// x87 status word, top-of-stack bits excluded.
    pub fpus: u16,
    /// x87 control word.
    pub fpuc: u16,
    /// Per-register empty markers (`true` means empty).
    pub fptags: [bool; 8],
    /// Last x87 instruction pointer.
    pub fpip: u64,
    /// Last x87 instruction code-segment selector.
    pub fpcs: u16,
    /// Last x87 operand pointer.
    pub fpdp: u64,
    /// Last x87 operand segment selector.
    pub fpds: u16,
    /// Last x87 opcode bits.
    pub fpop: u16,
    /// SSE control/status register.
    pub mxcsr: u32,
    /// Low 128-bit vector bank, two little-endian lanes per register.
    pub xmm_regs: [[u64; 2]; 16],
    /// High 128-bit extension bank for the 256-bit registers.
    pub ymmh_regs: [[u64; 2]; 16],
    /// Hidden execution flags derived from mode and segment state.
    pub hflags: u32,
    /// Extended-feature-enable register.
    pub efer: u64,
    /// Extended feature word advertised by the model.
    pub features_ext2: u32,
    /// Fast-system-call target code segment.
    pub sysenter_cs: u64,
    /// Fast-system-call stack pointer.
    pub sysenter_esp: u64,
    /// Fast-system-call entry point.
    pub sysenter_eip: u64,
    /// Legacy syscall target register.
    pub star: u64,
    /// Long-mode syscall entry point.
    pub lstar: u64,
    /// Compatibility-mode syscall entry point.
    pub cstar: u64,
    /// Syscall flags mask.
    pub fmask: u64,
    /// Kernel GS base swapped in by `swapgs`.
    pub kernel_gs_base: u64,
    /// Time-stamp counter.
    pub tsc: u64,
    /// Per-translation-regime software caches.
    pub tlb: [TranslationCache; NB_MMU_MODES],
}

impl X86State {
    /// Zeroed state; callers follow up with a mode-specific reset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: [0; 16],
            eip: 0,
            eflags: 0,
            segs: [SegmentCache::default(); 6],
            cr: [0; 5],
            dr: [0; 8],
            gdt: SegmentCache::default(),
            idt: SegmentCache::default(),
            ldt: SegmentCache::default(),
            tr: SegmentCache::default(),
            fpregs: [Fp80::default(); 8],
            fpstt: 0,
            fpus: 0,
            fpuc: 0,
            fptags: [true; 8],
            fpip: 0,
            fpcs: 0,
            fpdp: 0,
            fpds: 0,
            fpop: 0,
            mxcsr: 0,
            xmm_regs: [[0; 2]; 16],
            ymmh_regs: [[0; 2]; 16],
            hflags: 0,
            efer: 0,
            features_ext2: 0,
            sysenter_cs: 0,
            sysenter_esp: 0,
            sysenter_eip: 0,
            star: 0,
            lstar: 0,
            cstar: 0,
            fmask: 0,
            kernel_gs_base: 0,
            tsc: 0,
            tlb: [
                TranslationCache::default(),
                TranslationCache::default(),
                TranslationCache::default(),
            ],
        }
    }

    /// Resets to power-on defaults for a 16-bit real-address machine.
    ///
    /// The code segment keeps a flat zero base; every other segment gets the
    /// standard real-mode data flags, and the hidden flags and CR0 drop to
    /// zero so no protected-mode machinery is active.
    pub fn reset_real16(&mut self) {
        *self = Self::new();
        self.fpuc = FPUC_RESET;
        self.mxcsr = MXCSR_RESET;
        self.eflags = 0x2;
        self.segs[Seg::Cs.index()].load(0, 0, 0xFFFF, REAL_CS_FLAGS);
        for seg in [Seg::Es, Seg::Ss, Seg::Ds, Seg::Fs, Seg::Gs] {
            self.segs[seg.index()].load_real(0, REAL_NON_CS_FLAGS);
        }
    }

    /// Resets to power-on defaults for a 32-bit protected-mode machine with
    /// flat segmentation already in effect.
    pub fn reset_protected32(&mut self) {
        self.reset_real16();
        self.hflags |= HF_CS32 | HF_SS32 | HF_OSFXSR;
        self.cr[0] |= CR0_PE;
    }

    /// Resets to power-on defaults for a 64-bit long-mode machine.
    pub fn reset_long64(&mut self) {
        self.reset_protected32();
        self.hflags |= HF_CS64 | HF_LMA;
        self.hflags &= !HF_ADDSEG;
        self.efer |= EFER_LMA | EFER_LME;
        self.features_ext2 |= CPUID_EXT2_LM;
    }

    /// Discards every translation-regime cache.
    ///
    /// Invoked after writes that change address-translation configuration,
    /// such as control-register updates.
    pub fn flush_translation_caches(&mut self) {
        for cache in &mut self.tlb {
            cache.release();
        }
    }
}

impl Default for X86State {
    fn default() -> Self {
        Self::new()
    }
}
