// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! State-write coalescing.
//!
//! Merges consecutive writes to adjacent state registers into a single
//! multi-word LOAD_STATE command, so arbitrary call sites can emit state
//! one register at a time without paying one header per register.
//!
//! The tracker keeps the last register written and its fixed-point flag. A
//! write to `last + 4` with the same flag joins the open span; anything else
//! closes the span (back-patching the count field of its header) and opens
//! a new one. Spans are closed on an even word boundary, since headers must
//! be 64-bit aligned, inserting a padding word where needed. Writes are
//! never reordered; only headers are merged.

use ruviv_common::{StateAddr, STATE_ADDR_STRIDE};

use crate::cmdstream::{CmdStream, Reloc};
use crate::emit::load_state_header;
use crate::registers::{
    LOAD_STATE_COUNT_MASK, LOAD_STATE_COUNT_SHIFT, LOAD_STATE_MAX_COUNT, PADDING_WORD,
};

/// An open LOAD_STATE span. The header sits at `start - 1`.
#[derive(Debug, Clone, Copy)]
struct Span {
    /// Word offset of the first state word.
    start: u32,
    /// Register address of the most recent write.
    last_reg: StateAddr,
    last_fixp: bool,
}

/// Coalesces register writes into multi-word LOAD_STATE commands.
///
/// Usage: [`start`](Self::start) with the worst-case word count, any number
/// of `write*` calls, then [`end`](Self::end). Exactly one coalescing or
/// resolve-submission operation may write a given stream at a time.
#[derive(Debug, Default)]
pub struct Coalescer {
    span: Option<Span>,
}

impl Coalescer {
    pub fn new() -> Self {
        Self { span: None }
    }

    /// Reserve room for at most `max_words` upcoming words (headers, values
    /// and padding included) and reset the span tracker.
    pub fn start(&mut self, stream: &mut CmdStream, max_words: u32) {
        stream.reserve(max_words);
        self.span = None;
    }

    /// Write a state register.
    pub fn write(&mut self, stream: &mut CmdStream, reg: StateAddr, value: u32) {
        self.prepare(stream, reg, false);
        stream.emit(value);
    }

    /// Write a state register with fixed-point conversion enabled.
    pub fn write_fixp(&mut self, stream: &mut CmdStream, reg: StateAddr, value: u32) {
        self.prepare(stream, reg, true);
        stream.emit(value);
    }

    /// Write a relocation to a state register.
    pub fn write_reloc(&mut self, stream: &mut CmdStream, reg: StateAddr, reloc: &Reloc) {
        self.prepare(stream, reg, false);
        stream.emit_reloc(reloc);
    }

    /// Close the open span and pad the stream to an even word count.
    /// Must be called before the buffer is inspected or submitted.
    pub fn end(&mut self, stream: &mut CmdStream) {
        self.close_span(stream);
        Self::pad(stream);
    }

    /// Extend the open span for a write to `reg`, or close it and emit a
    /// fresh header with a zero count field to be patched on close.
    fn prepare(&mut self, stream: &mut CmdStream, reg: StateAddr, fixp: bool) {
        let extends = match self.span {
            Some(ref span) => {
                reg == span.last_reg + STATE_ADDR_STRIDE
                    && fixp == span.last_fixp
                    // A span the count field can no longer describe is
                    // split, never truncated.
                    && stream.offset() - span.start < LOAD_STATE_MAX_COUNT
            }
            None => false,
        };

        if extends {
            let span = self.span.as_mut().unwrap();
            span.last_reg = reg;
            return;
        }

        if self.span.is_some() {
            self.close_span(stream);
            Self::pad(stream);
        }

        stream.emit(load_state_header(reg >> 2, 0, fixp));
        self.span = Some(Span {
            start: stream.offset(),
            last_reg: reg,
            last_fixp: fixp,
        });
    }

    /// Patch the open span's header with the number of words it covers.
    fn close_span(&mut self, stream: &mut CmdStream) {
        if let Some(span) = self.span.take() {
            let len = stream.offset() - span.start;
            if len > 0 {
                let header_at = span.start - 1;
                let header = stream.get(header_at)
                    | ((len << LOAD_STATE_COUNT_SHIFT) & LOAD_STATE_COUNT_MASK);
                stream.set(header_at, header);
                log::trace!("coalesce: span of {} at reg 0x{:04X}", len, span.last_reg);
            }
        }
    }

    fn pad(stream: &mut CmdStream) {
        if stream.offset() % 2 == 1 {
            stream.emit(PADDING_WORD);
        }
    }
}
