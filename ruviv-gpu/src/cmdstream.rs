// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! GPU command buffer with a reservation protocol.
//!
//! The stream is an append-only sequence of 32-bit words. Callers must
//! reserve the worst-case number of words an encoding operation can emit
//! before emitting any of them; emitting past the active reservation is a
//! programming defect, caught by a debug assertion. Unused reserved capacity
//! is simply left uncommitted.
//!
//! Relocations (deferred buffer-object addresses) emit a placeholder word and
//! record a pending patch; the external submission step resolves patches to
//! device addresses and consumes them exactly once via [`CmdStream::take_relocs`].

use std::sync::Arc;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

use ruviv_common::WordOffset;

bitflags! {
    /// Access directions the GPU performs on a relocated buffer object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelocFlags: u32 {
        const READ = 1;
        const WRITE = 2;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// An opaque buffer object.
///
/// Allocation, mapping and device-address assignment belong to the
/// submission layer; this core only needs a stable identity to key
/// relocation patches on. Identity is the `Arc` allocation itself.
#[derive(Debug)]
pub struct Bo {
    size: u32,
}

impl Bo {
    pub fn new(size: u32) -> Arc<Self> {
        Arc::new(Self { size })
    }

    /// Size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// A deferred reference to a buffer object's device address.
///
/// A relocation without a buffer object stands for a disabled address slot
/// and is emitted as the literal word 0.
#[derive(Debug, Clone)]
pub struct Reloc {
    pub bo: Option<Arc<Bo>>,
    /// Byte offset within the buffer object.
    pub offset: u32,
    pub flags: RelocFlags,
}

impl Reloc {
    pub fn new(bo: Arc<Bo>, offset: u32, flags: RelocFlags) -> Self {
        Self {
            bo: Some(bo),
            offset,
            flags,
        }
    }

    /// A disabled address slot ("no resource bound").
    pub const fn disabled() -> Self {
        Self {
            bo: None,
            offset: 0,
            flags: RelocFlags::empty(),
        }
    }
}

impl Default for Reloc {
    fn default() -> Self {
        Self::disabled()
    }
}

/// A pending relocation patch, keyed by the placeholder word's offset.
#[derive(Debug, Clone)]
pub struct RelocPatch {
    /// Word offset of the placeholder within the stream.
    pub word_offset: WordOffset,
    pub bo: Arc<Bo>,
    /// Byte offset within the buffer object.
    pub bo_offset: u32,
    pub flags: RelocFlags,
}

/// Append-only command word buffer.
///
/// One stream per execution context; not shared between threads. Words are
/// emitted in exactly call order; the only retroactive mutation is the
/// single-word [`CmdStream::set`] used to back-patch span headers.
#[derive(Debug, Default)]
pub struct CmdStream {
    words: Vec<u32>,
    /// Words still available from the active reservation.
    reserved: u32,
    relocs: Vec<RelocPatch>,
}

impl CmdStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guarantee room for the next `n` words.
    ///
    /// A new reservation supersedes whatever was left of the previous one.
    /// The buffer grows eagerly, so this never fails; a full-buffer flush is
    /// the submission layer's concern.
    pub fn reserve(&mut self, n: u32) {
        self.words.reserve(n as usize);
        self.reserved = n;
    }

    /// Append one word and advance the cursor.
    pub fn emit(&mut self, word: u32) {
        debug_assert!(self.reserved > 0, "cmdstream: emit past reservation");
        self.reserved = self.reserved.saturating_sub(1);
        self.words.push(word);
    }

    /// Emit a relocation: the literal word 0 for a disabled slot, otherwise
    /// a placeholder plus a pending patch entry.
    pub fn emit_reloc(&mut self, reloc: &Reloc) {
        match &reloc.bo {
            None => self.emit(0),
            Some(bo) => {
                let word_offset = self.offset();
                // Placeholder carries the byte offset so inspection tools
                // see the intra-buffer part of the final address.
                self.emit(reloc.offset);
                self.relocs.push(RelocPatch {
                    word_offset,
                    bo: bo.clone(),
                    bo_offset: reloc.offset,
                    flags: reloc.flags,
                });
            }
        }
    }

    /// Current write cursor, in words.
    pub fn offset(&self) -> WordOffset {
        self.words.len() as WordOffset
    }

    /// Read back a previously emitted word.
    pub fn get(&self, offset: WordOffset) -> u32 {
        self.words[offset as usize]
    }

    /// Overwrite a previously emitted word (span header back-patch).
    pub fn set(&mut self, offset: WordOffset, word: u32) {
        self.words[offset as usize] = word;
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All emitted words, in emission order.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Drain the pending relocation patches for the submission step.
    pub fn take_relocs(&mut self) -> Vec<RelocPatch> {
        std::mem::take(&mut self.relocs)
    }

    /// Little-endian byte view of the stream for submission hand-off.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.words.len() * ruviv_common::WORD_SIZE];
        LittleEndian::write_u32_into(&self.words, &mut out);
        out
    }

    /// Discard all words and pending patches. Called after the external
    /// submission step has consumed the stream.
    pub fn reset(&mut self) {
        self.words.clear();
        self.relocs.clear();
        self.reserved = 0;
    }
}
