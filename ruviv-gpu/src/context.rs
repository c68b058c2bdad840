// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Device capabilities and per-context execution state.
//!
//! A [`GpuContext`] owns the command stream being built for one execution
//! context. It is deliberately not shareable: one context owns one stream,
//! and callers serialize all encoding operations on it. Debug behavior is an
//! explicit value passed at construction, not ambient process state.

use ruviv_common::DebugFlags;

use crate::cmdstream::CmdStream;

/// Static capabilities of the probed device, filled in by the screen/probe
/// layer from the chip model and feature words.
#[derive(Debug, Clone)]
pub struct GpuSpecs {
    /// Number of parallel pixel pipes (1 or 2 on known hardware).
    pub pixel_pipes: u32,
    /// Tile status bits per tile (2 or 4).
    pub bits_per_tile: u32,
    /// Pattern a fresh tile status buffer is filled with to mark all tiles
    /// cleared.
    pub ts_clear_value: u32,
    /// Render targets may use the supertiled layout.
    pub can_supertile: bool,
}

impl Default for GpuSpecs {
    fn default() -> Self {
        Self {
            pixel_pipes: 1,
            bits_per_tile: 2,
            ts_clear_value: 0x5555_5555,
            can_supertile: true,
        }
    }
}

/// Per-context owner of one command stream.
pub struct GpuContext {
    specs: GpuSpecs,
    debug: DebugFlags,
    stream: CmdStream,
}

impl GpuContext {
    pub fn new(specs: GpuSpecs, debug: DebugFlags) -> Self {
        Self {
            specs,
            debug,
            stream: CmdStream::new(),
        }
    }

    pub fn specs(&self) -> &GpuSpecs {
        &self.specs
    }

    pub fn debug(&self) -> DebugFlags {
        self.debug
    }

    pub fn stream(&self) -> &CmdStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut CmdStream {
        &mut self.stream
    }

    /// Discard the stream contents after the external submission step has
    /// consumed them.
    pub fn reset(&mut self) {
        if self.debug.contains(DebugFlags::MSGS) {
            log::debug!("context: reset after {} words", self.stream.offset());
        }
        self.stream.reset();
    }
}
