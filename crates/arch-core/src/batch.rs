//! Batched register accessor.
//!
//! A batch is an ordered list of single-register operations processed
//! strictly in order. The first failing entry aborts the batch and its error
//! is returned; entries already processed retain their effect. Callers must
//! not assume all-or-nothing atomicity, only that failure stops forward
//! progress.

use crate::{AccessError, Arch, Mode, WriteEffect};

/// One read entry: destination buffer length declares the expected width.
#[derive(Debug)]
pub struct ReadRequest<'a> {
    /// Raw register identifier in the architecture's flat namespace.
    pub regid: u32,
    /// Destination buffer; its length must equal the descriptor width.
    pub dest: &'a mut [u8],
}

/// One write entry: source buffer length declares the expected width.
#[derive(Debug)]
pub struct WriteRequest<'a> {
    /// Raw register identifier in the architecture's flat namespace.
    pub regid: u32,
    /// Source buffer; its length must equal the descriptor width.
    pub src: &'a [u8],
}

/// Reads each requested register in order.
///
/// # Errors
///
/// Returns the first entry's [`AccessError`]; earlier entries have already
/// filled their buffers and later entries are untouched.
pub fn read_batch<A: Arch>(
    state: &mut A::State,
    mode: Mode,
    requests: &mut [ReadRequest<'_>],
) -> Result<(), AccessError> {
    for request in requests {
        A::read_register(state, request.regid, request.dest, mode)?;
    }
    Ok(())
}

/// Writes each requested register in order.
///
/// Reports [`WriteEffect::PcRedirected`] when any entry wrote the program
/// counter, so the caller can raise the execution interrupt exactly once
/// after the whole batch, not per entry.
///
/// # Errors
///
/// Returns the first entry's [`AccessError`]; earlier entries remain
/// applied (no rollback).
pub fn write_batch<A: Arch>(
    state: &mut A::State,
    mode: Mode,
    requests: &[WriteRequest<'_>],
) -> Result<WriteEffect, AccessError> {
    let mut effect = WriteEffect::Plain;
    for request in requests {
        effect = effect.merge(A::write_register(state, request.regid, request.src, mode)?);
    }
    Ok(effect)
}
