// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Front-end instruction encodings and state register map.
//!
//! The front-end (FE) fetches 64-bit aligned instruction words. Every
//! instruction starts with a header whose top five bits select the opcode;
//! LOAD_STATE additionally packs a register offset and word count into the
//! same header.
//!
//! ## LOAD_STATE header (32 bits)
//!
//! | Bits    | Field                               |
//! |---------|-------------------------------------|
//! | 31:27   | Opcode (1 = LOAD_STATE)             |
//! | 26      | FIXP (fixed-point conversion)       |
//! | 25:16   | Count (state words following)       |
//! | 15:0    | Offset (register address >> 2)      |
//!
//! ## STALL token (32 bits, second word of a STALL instruction and payload
//! of the semaphore/stall token registers)
//!
//! | Bits    | Field                               |
//! |---------|-------------------------------------|
//! | 4:0     | FROM (stage that waits)             |
//! | 12:8    | TO (stage being waited on)          |

use ruviv_common::StateAddr;

// ── Front-end instruction opcodes (bits [31:27]) ────────────────────────────

pub const FE_OPCODE_LOAD_STATE: u32 = 0x1 << 27;
pub const FE_OPCODE_END: u32 = 0x2 << 27;
pub const FE_OPCODE_NOP: u32 = 0x3 << 27;
pub const FE_OPCODE_DRAW_PRIMITIVES: u32 = 0x5 << 27;
pub const FE_OPCODE_DRAW_INDEXED_PRIMITIVES: u32 = 0x6 << 27;
pub const FE_OPCODE_WAIT: u32 = 0x7 << 27;
pub const FE_OPCODE_LINK: u32 = 0x8 << 27;
pub const FE_OPCODE_STALL: u32 = 0x9 << 27;

// ── LOAD_STATE header fields ────────────────────────────────────────────────

pub const LOAD_STATE_FIXP: u32 = 1 << 26;
pub const LOAD_STATE_COUNT_SHIFT: u32 = 16;
pub const LOAD_STATE_COUNT_MASK: u32 = 0x3ff << LOAD_STATE_COUNT_SHIFT;
pub const LOAD_STATE_OFFSET_MASK: u32 = 0xffff;

/// Largest word count a single LOAD_STATE header can carry (10-bit field).
pub const LOAD_STATE_MAX_COUNT: u32 = 0x3ff;

// ── Synchronization ─────────────────────────────────────────────────────────

/// Pipeline stages addressable by semaphore/stall tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SyncRecipient {
    /// Command front-end.
    FrontEnd = 0x01,
    /// Rasterizer.
    RasterEngine = 0x05,
    /// Pixel engine (render back-end).
    PixelEngine = 0x07,
    /// 2D draw engine.
    DrawEngine = 0x0B,
}

/// Pack a FROM/TO stage pair into a semaphore or stall token.
#[inline]
pub const fn sync_token(from: SyncRecipient, to: SyncRecipient) -> u32 {
    (from as u32) | ((to as u32) << 8)
}

/// Semaphore token register; writing it raises a semaphore FROM → TO.
pub const GL_SEMAPHORE_TOKEN: StateAddr = 0x03808;
/// Stall token register; downstream stages poll it to wait on a semaphore.
pub const GL_STALL_TOKEN: StateAddr = 0x0380C;

// ── Resolve (RS) engine registers ───────────────────────────────────────────

pub const RS_CONFIG: StateAddr = 0x01604;
pub const RS_CONFIG_DOWNSAMPLE_X: u32 = 0x20;
pub const RS_CONFIG_DOWNSAMPLE_Y: u32 = 0x40;
pub const RS_CONFIG_SOURCE_TILED: u32 = 0x80;
pub const RS_CONFIG_DEST_TILED: u32 = 0x4000;
pub const RS_CONFIG_FLIP: u32 = 0x0004_0000;
pub const RS_CONFIG_SWAP_RB: u32 = 0x0010_0000;

/// Source pixel format field of RS_CONFIG (bits [4:0]).
#[inline]
pub const fn rs_config_source_format(format: u32) -> u32 {
    format & 0x1f
}

/// Destination pixel format field of RS_CONFIG (bits [12:8]).
#[inline]
pub const fn rs_config_dest_format(format: u32) -> u32 {
    (format & 0x1f) << 8
}

pub const RS_SOURCE_ADDR: StateAddr = 0x01608;
pub const RS_SOURCE_STRIDE: StateAddr = 0x0160C;
pub const RS_DEST_ADDR: StateAddr = 0x01610;
pub const RS_DEST_STRIDE: StateAddr = 0x01614;

/// Stride tiling bit: set when the surface uses a tiled layout.
pub const RS_STRIDE_TILING: u32 = 0x8000_0000;
/// Stride multi bit: surface is split across both pixel pipes.
pub const RS_STRIDE_MULTI: u32 = 0x4000_0000;

pub const RS_WINDOW_SIZE: StateAddr = 0x01618;

/// Pack the resolve window dimensions (width [15:0], height [31:16]).
#[inline]
pub const fn rs_window_size(width: u32, height: u32) -> u32 {
    ((height & 0xffff) << 16) | (width & 0xffff)
}

/// Dither table registers (2 words).
#[inline]
pub const fn rs_dither(index: u32) -> StateAddr {
    0x01620 + 4 * index
}

pub const RS_CLEAR_CONTROL: StateAddr = 0x0162C;
pub const RS_CLEAR_MODE_DISABLED: u32 = 0;
pub const RS_CLEAR_MODE_ENABLED1: u32 = 1;
pub const RS_CLEAR_MODE_ENABLED4: u32 = 3;

/// Pack the clear control register (per-channel bits [31:16], mode [3:0]).
#[inline]
pub const fn rs_clear_control(clear_bits: u32, clear_mode: u32) -> u32 {
    ((clear_bits & 0xffff) << 16) | clear_mode
}

/// Fill value registers (4 words, one per cleared channel group).
#[inline]
pub const fn rs_fill_value(index: u32) -> StateAddr {
    0x01630 + 4 * index
}

/// Kicker register; writing [`RS_KICK`] to it starts the resolve.
pub const RS_KICKER: StateAddr = 0x01640;
/// Sentinel value the kicker register must be written with.
pub const RS_KICK: u32 = 0xbeebbeeb;

pub const RS_EXTRA_CONFIG: StateAddr = 0x016A0;
pub const RS_ENDIAN_NO_SWAP: u32 = 0;
pub const RS_ENDIAN_SWAP_16: u32 = 1;
pub const RS_ENDIAN_SWAP_32: u32 = 2;

/// Pack the extra config register (AA samples [1:0], endian mode [21:20]).
#[inline]
pub const fn rs_extra_config(aa: u32, endian_mode: u32) -> u32 {
    (aa & 0x3) | ((endian_mode & 0x3) << 20)
}

/// Per-pipe source address registers (dual-pipe devices).
#[inline]
pub const fn rs_pipe_source_addr(pipe: u32) -> StateAddr {
    0x01700 + 4 * pipe
}

/// Per-pipe destination address registers (dual-pipe devices).
#[inline]
pub const fn rs_pipe_dest_addr(pipe: u32) -> StateAddr {
    0x01708 + 4 * pipe
}

/// Per-pipe window offset registers.
#[inline]
pub const fn rs_pipe_offset(pipe: u32) -> StateAddr {
    0x01710 + 4 * pipe
}

/// Pack a per-pipe window offset (x [12:0], y [28:16]).
#[inline]
pub const fn rs_pipe_offset_xy(x: u32, y: u32) -> u32 {
    ((y & 0x1fff) << 16) | (x & 0x1fff)
}

// ── Resolve pixel formats (RS_CONFIG format fields) ─────────────────────────

pub const RS_FORMAT_X4R4G4B4: u32 = 0;
pub const RS_FORMAT_A4R4G4B4: u32 = 1;
pub const RS_FORMAT_X1R5G5B5: u32 = 2;
pub const RS_FORMAT_A1R5G5B5: u32 = 3;
pub const RS_FORMAT_R5G6B5: u32 = 4;
pub const RS_FORMAT_X8R8G8B8: u32 = 5;
pub const RS_FORMAT_A8R8G8B8: u32 = 6;

// ── Padding sentinels ───────────────────────────────────────────────────────
// Fixed literals distinct from any valid instruction encoding, so buffer
// inspection tools can tell padding from data.

/// Alignment padding appended by the coalescer.
pub const PADDING_WORD: u32 = 0xdeadbeef;
/// Padding word inside the resolve dither block.
pub const RS_PAD_WORD: u32 = 0x00babb1e;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values() {
        assert_eq!(FE_OPCODE_LOAD_STATE, 0x0800_0000);
        assert_eq!(FE_OPCODE_STALL, 0x4800_0000);
        assert_eq!(FE_OPCODE_DRAW_PRIMITIVES, 0x2800_0000);
    }

    #[test]
    fn test_sync_token_packing() {
        let token = sync_token(SyncRecipient::FrontEnd, SyncRecipient::PixelEngine);
        assert_eq!(token, 0x0701);
        assert_eq!(token & 0x1f, SyncRecipient::FrontEnd as u32);
        assert_eq!((token >> 8) & 0x1f, SyncRecipient::PixelEngine as u32);
    }

    #[test]
    fn test_rs_window_size() {
        assert_eq!(rs_window_size(256, 128), (128 << 16) | 256);
        // Fields saturate at 16 bits.
        assert_eq!(rs_window_size(0x1_0001, 0), 1);
    }

    #[test]
    fn test_rs_register_layout() {
        // CLEAR_CONTROL + 4 fill values are one contiguous 5-register block.
        assert_eq!(rs_fill_value(0), RS_CLEAR_CONTROL + 4);
        assert_eq!(rs_fill_value(3), RS_CLEAR_CONTROL + 16);
        // CONFIG..DEST_STRIDE are one contiguous 5-register block.
        assert_eq!(RS_DEST_STRIDE, RS_CONFIG + 16);
        // Per-pipe address pairs are adjacent.
        assert_eq!(rs_pipe_source_addr(1), rs_pipe_source_addr(0) + 4);
        assert_eq!(rs_pipe_dest_addr(1), rs_pipe_dest_addr(0) + 4);
        assert_eq!(rs_pipe_offset(1), rs_pipe_offset(0) + 4);
    }

    #[test]
    fn test_rs_pipe_offset_xy() {
        assert_eq!(rs_pipe_offset_xy(0, 64), 64 << 16);
        assert_eq!(rs_pipe_offset_xy(5, 0), 5);
    }
}
