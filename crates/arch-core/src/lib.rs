//! Architecture-abstraction layer for a multi-target CPU emulation engine.
//!
//! One generic [`Engine`] drives any instruction-set backend through the
//! [`Arch`] plug-in trait: per-instance state, power-on reset, program-counter
//! access, trap classification, hook eligibility, and the batch register
//! protocol with its width validation and first-failure semantics. Two
//! backends ship here: [`x86::X86`], the segmented/long-mode architecture
//! with aliased general-purpose registers and composite descriptor-table,
//! floating-point, and model-specific registers, and [`sparc::Sparc`], the
//! register-window architecture.
//!
//! ```
//! use arch_core::{Engine, EngineConfig, Mode, WriteRequest};
//! use arch_core::x86::{X86, X86Reg};
//!
//! let mut engine = Engine::<X86>::new(&EngineConfig { mode: Mode::Long64 });
//! let value = 0xDEAD_BEEF_u64.to_le_bytes();
//! engine
//!     .reg_write(&[WriteRequest {
//!         regid: X86Reg::Rax.raw(),
//!         src: &value,
//!     }])
//!     .unwrap();
//! ```

pub mod arch;
pub mod batch;
mod bytes;
pub mod context;
pub mod engine;
pub mod error;
pub mod exec;
pub mod mode;
pub mod sparc;
pub mod tlb;
pub mod x86;

pub use arch::{
    Arch, ArchFamily, WriteEffect, MICRO_OP_FLAG_CMP, MICRO_OP_FLAG_DIRECT, MICRO_OP_SUB,
};
pub use batch::{read_batch, write_batch, ReadRequest, WriteRequest};
pub use context::Context;
pub use engine::{Engine, EngineConfig};
pub use error::{AccessError, ErrorKind};
pub use exec::{ExecControl, RunState};
pub use mode::Mode;
pub use tlb::{TlbEntry, TranslationCache};
pub use x86::alias::GprView;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
