// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Low-level emit helpers.
//!
//! Builds individual front-end instructions on top of the command stream:
//! LOAD_STATE sequences for one or more contiguous registers, draw commands,
//! and the semaphore/stall sequence used to order pipeline stages.

use ruviv_common::{GpuError, StateAddr};

use crate::cmdstream::CmdStream;
use crate::registers::{
    sync_token, SyncRecipient, FE_OPCODE_DRAW_INDEXED_PRIMITIVES, FE_OPCODE_DRAW_PRIMITIVES,
    FE_OPCODE_END, FE_OPCODE_LOAD_STATE, FE_OPCODE_NOP, FE_OPCODE_STALL, GL_SEMAPHORE_TOKEN,
    GL_STALL_TOKEN, LOAD_STATE_COUNT_MASK, LOAD_STATE_COUNT_SHIFT, LOAD_STATE_FIXP,
    LOAD_STATE_MAX_COUNT, LOAD_STATE_OFFSET_MASK,
};

/// Pack a LOAD_STATE instruction header.
///
/// `offset` is the register address divided by 4; `count` is the number of
/// state words that follow the header and must fit the 10-bit count field.
#[inline]
pub const fn load_state_header(offset: u32, count: u32, fixp: bool) -> u32 {
    debug_assert!(count <= LOAD_STATE_MAX_COUNT);

    FE_OPCODE_LOAD_STATE
        | if fixp { LOAD_STATE_FIXP } else { 0 }
        | (offset & LOAD_STATE_OFFSET_MASK)
        | ((count << LOAD_STATE_COUNT_SHIFT) & LOAD_STATE_COUNT_MASK)
}

/// Emit a LOAD_STATE header covering `count` registers starting at `addr`.
/// The caller must have reserved room for the header and the state words.
#[inline]
pub fn emit_load_state(stream: &mut CmdStream, addr: StateAddr, count: u32, fixp: bool) {
    stream.emit(load_state_header(addr >> 2, count, fixp));
}

/// Write a single state register (2 words).
pub fn set_state(stream: &mut CmdStream, addr: StateAddr, value: u32) {
    stream.reserve(2);
    emit_load_state(stream, addr, 1, false);
    stream.emit(value);
}

/// Write `values.len()` contiguous state registers starting at `base` under
/// one header. Counts beyond the header's count field are rejected, never
/// truncated.
pub fn set_state_multi(
    stream: &mut CmdStream,
    base: StateAddr,
    values: &[u32],
) -> Result<(), GpuError> {
    if values.is_empty() {
        return Ok(());
    }

    let num = values.len() as u32;
    if num > LOAD_STATE_MAX_COUNT {
        return Err(GpuError::StateCountOverflow(num));
    }

    // One extra word of slack for alignment of whatever follows.
    stream.reserve(1 + num + 1);
    emit_load_state(stream, base, num, false);
    for &value in values {
        stream.emit(value);
    }

    Ok(())
}

/// Emit a NOP instruction.
pub fn nop(stream: &mut CmdStream) {
    stream.reserve(1);
    stream.emit(FE_OPCODE_NOP);
}

/// Emit an END instruction, halting front-end fetch.
pub fn end(stream: &mut CmdStream) {
    stream.reserve(1);
    stream.emit(FE_OPCODE_END);
}

/// Emit a DRAW_PRIMITIVES command (4 words).
pub fn draw_primitives(stream: &mut CmdStream, primitive_type: u32, start: u32, count: u32) {
    stream.reserve(4);

    stream.emit(FE_OPCODE_DRAW_PRIMITIVES);
    stream.emit(primitive_type);
    stream.emit(start);
    stream.emit(count);
}

/// Emit a DRAW_INDEXED_PRIMITIVES command (5 words plus alignment pad).
pub fn draw_indexed_primitives(
    stream: &mut CmdStream,
    primitive_type: u32,
    start: u32,
    count: u32,
    offset: u32,
) {
    stream.reserve(6);

    stream.emit(FE_OPCODE_DRAW_INDEXED_PRIMITIVES);
    stream.emit(primitive_type);
    stream.emit(start);
    stream.emit(count);
    stream.emit(offset);
    stream.emit(0);
}

/// Queue a STALL command (2 words).
fn cmd_stall(stream: &mut CmdStream, from: SyncRecipient, to: SyncRecipient) {
    stream.emit(FE_OPCODE_STALL);
    stream.emit(sync_token(from, to));
}

/// Make stage `from` wait until stage `to` has caught up (4 words).
///
/// Always raises the semaphore token. The front-end cannot wait on its own
/// semaphore write the way downstream stages can, so stalling the front-end
/// takes an explicit STALL instruction; every other stage polls the stall
/// token register instead.
pub fn stall(stream: &mut CmdStream, from: SyncRecipient, to: SyncRecipient) {
    stream.reserve(4);

    emit_load_state(stream, GL_SEMAPHORE_TOKEN, 1, false);
    stream.emit(sync_token(from, to));

    if from == SyncRecipient::FrontEnd {
        cmd_stall(stream, from, to);
    } else {
        emit_load_state(stream, GL_STALL_TOKEN, 1, false);
        stream.emit(sync_token(from, to));
    }

    log::trace!("stall: {:?} waits on {:?}", from, to);
}
