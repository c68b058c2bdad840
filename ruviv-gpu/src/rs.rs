// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolve (RS) engine state: compilation and submission.
//!
//! The resolve unit is the fixed-function block that copies and fills
//! surfaces: tiled-to-linear conversion, AA downsampling, fast clears. A
//! logical blit description is first compiled into an immutable register
//! snapshot ([`CompiledRsState`]), which can then be submitted any number of
//! times. Submission emits a hand-optimized fixed instruction sequence per
//! pixel-pipe configuration rather than going through the general coalescer:
//! the RS register layout was arranged for minimum header count, and the
//! dual-pipe path has conditional variable-length address blocks a generic
//! span tracker cannot express.

use ruviv_common::{DebugFlags, GpuError};

use crate::cmdstream::{CmdStream, Reloc};
use crate::context::{GpuContext, GpuSpecs};
use crate::emit::emit_load_state;
use crate::registers::{
    rs_clear_control, rs_config_dest_format, rs_config_source_format, rs_dither, rs_extra_config,
    rs_pipe_dest_addr, rs_pipe_offset, rs_pipe_offset_xy, rs_pipe_source_addr, rs_window_size,
    RS_CLEAR_CONTROL, RS_CONFIG, RS_CONFIG_DEST_TILED, RS_CONFIG_DOWNSAMPLE_X,
    RS_CONFIG_DOWNSAMPLE_Y, RS_CONFIG_FLIP, RS_CONFIG_SOURCE_TILED, RS_CONFIG_SWAP_RB,
    RS_DEST_STRIDE, RS_EXTRA_CONFIG, RS_KICK, RS_KICKER, RS_PAD_WORD, RS_SOURCE_STRIDE,
    RS_STRIDE_MULTI, RS_STRIDE_TILING, RS_WINDOW_SIZE,
};

/// Surface memory layouts.
///
/// Encoded as bit flags: bit 0 = tiled, bit 1 = supertiled, bit 2 = multi
/// (surface split across both pixel pipes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Layout {
    #[default]
    Linear = 0,
    Tiled = 1,
    SuperTiled = 3,
    MultiTiled = 5,
    MultiSuperTiled = 7,
}

impl Layout {
    pub fn is_linear(self) -> bool {
        self == Self::Linear
    }

    pub fn is_tiled(self) -> bool {
        self as u32 & 1 != 0
    }

    pub fn is_supertiled(self) -> bool {
        self as u32 & 2 != 0
    }

    /// Split across both pixel pipes?
    pub fn is_multi(self) -> bool {
        self as u32 & 4 != 0
    }
}

/// Logical description of a resolve operation.
///
/// Formats are raw RS format codes (see the `RS_FORMAT_*` constants); format
/// translation from API formats happens upstream.
#[derive(Debug, Clone, Default)]
pub struct RsState {
    pub source_format: u32,
    pub source_tiling: Layout,
    /// Per-pipe source addresses; index 1 is only used for multi layouts.
    pub source: [Reloc; 2],
    pub source_stride: u32,

    pub dest_format: u32,
    pub dest_tiling: Layout,
    /// Per-pipe destination addresses; index 1 is only used for multi layouts.
    pub dest: [Reloc; 2],
    pub dest_stride: u32,

    pub downsample_x: bool,
    pub downsample_y: bool,
    pub swap_rb: bool,
    pub flip: bool,

    pub width: u32,
    pub height: u32,

    pub dither: [u32; 2],
    pub clear_bits: u32,
    pub clear_mode: u32,
    pub clear_value: [u32; 4],

    /// AA sample field of the extra config register.
    pub aa: u32,
    pub endian_mode: u32,
}

/// Immutable hardware register snapshot of a resolve operation.
///
/// Produced once by [`compile_rs_state`], consumed (possibly repeatedly) by
/// [`submit_rs_state`]. Holds no buffer-object ownership beyond what its
/// relocations reference.
#[derive(Debug, Clone, Default)]
pub struct CompiledRsState {
    pub config: u32,
    pub source_stride: u32,
    pub dest_stride: u32,
    pub window_size: u32,
    pub source: [Reloc; 2],
    pub dest: [Reloc; 2],
    pub pipe_offset: [u32; 2],
    pub dither: [u32; 2],
    pub clear_control: u32,
    pub fill_value: [u32; 4],
    pub extra_config: u32,
}

/// Compile a logical resolve description into a register snapshot.
///
/// Pure translation: no buffer interaction, deterministic for identical
/// inputs. On dual-pipe devices each pipe processes half the image, so the
/// window height is halved and must already be 8-aligned; the hardware
/// hangs on violations, which no later software check can catch.
pub fn compile_rs_state(specs: &GpuSpecs, rs: &RsState) -> Result<CompiledRsState, GpuError> {
    // Tiled and supertiled layouts have their strides multiplied by 4 in RS.
    let source_stride_shift = if rs.source_tiling.is_linear() { 0 } else { 2 };
    let dest_stride_shift = if rs.dest_tiling.is_linear() { 0 } else { 2 };

    let source_multi = rs.source_tiling.is_multi();
    let dest_multi = rs.dest_tiling.is_multi();

    let window_size = match specs.pixel_pipes {
        1 => rs_window_size(rs.width, rs.height),
        2 => {
            debug_assert!(
                rs.height % 8 == 0,
                "dual-pipe resolve height must be 8-aligned"
            );
            rs_window_size(rs.width, rs.height / 2)
        }
        n => return Err(GpuError::UnsupportedPixelPipes(n)),
    };

    let mut config = rs_config_source_format(rs.source_format)
        | rs_config_dest_format(rs.dest_format);
    if rs.downsample_x {
        config |= RS_CONFIG_DOWNSAMPLE_X;
    }
    if rs.downsample_y {
        config |= RS_CONFIG_DOWNSAMPLE_Y;
    }
    if rs.source_tiling.is_tiled() {
        config |= RS_CONFIG_SOURCE_TILED;
    }
    if rs.dest_tiling.is_tiled() {
        config |= RS_CONFIG_DEST_TILED;
    }
    if rs.swap_rb {
        config |= RS_CONFIG_SWAP_RB;
    }
    if rs.flip {
        config |= RS_CONFIG_FLIP;
    }

    let mut source_stride = rs.source_stride << source_stride_shift;
    if !rs.source_tiling.is_linear() {
        source_stride |= RS_STRIDE_TILING;
    }
    if source_multi {
        source_stride |= RS_STRIDE_MULTI;
    }

    let mut dest_stride = rs.dest_stride << dest_stride_shift;
    if !rs.dest_tiling.is_linear() {
        dest_stride |= RS_STRIDE_TILING;
    }
    if dest_multi {
        dest_stride |= RS_STRIDE_MULTI;
    }

    Ok(CompiledRsState {
        config,
        source_stride,
        dest_stride,
        window_size,
        source: [
            rs.source[0].clone(),
            if source_multi {
                rs.source[1].clone()
            } else {
                Reloc::disabled()
            },
        ],
        dest: [
            rs.dest[0].clone(),
            if dest_multi {
                rs.dest[1].clone()
            } else {
                Reloc::disabled()
            },
        ],
        pipe_offset: [
            rs_pipe_offset_xy(0, 0),
            rs_pipe_offset_xy(0, rs.height / 2),
        ],
        dither: rs.dither,
        clear_control: rs_clear_control(rs.clear_bits, rs.clear_mode),
        fill_value: rs.clear_value,
        extra_config: rs_extra_config(rs.aa, rs.endian_mode),
    })
}

/// Worst-case submission size on a single-pipe device.
const SUBMIT_WORDS_ONE_PIPE: u32 = 22;
/// Worst-case submission size on a dual-pipe device (both surfaces multi).
const SUBMIT_WORDS_TWO_PIPES: u32 = 34;

/// Emit a compiled resolve state into the context's stream and kick the
/// resolve unit.
///
/// Reserves the fixed worst-case word budget up front; the dual-pipe path
/// may commit fewer words than reserved. On an unsupported pipe count the
/// stream is left untouched.
pub fn submit_rs_state(ctx: &mut GpuContext, cs: &CompiledRsState) -> Result<(), GpuError> {
    let pixel_pipes = ctx.specs().pixel_pipes;
    let debug = ctx.debug();
    let stream = ctx.stream_mut();
    let begin = stream.offset();

    match pixel_pipes {
        1 => {
            stream.reserve(SUBMIT_WORDS_ONE_PIPE);

            // Config, addresses and strides form one contiguous block.
            emit_load_state(stream, RS_CONFIG, 5, false);
            stream.emit(cs.config);
            stream.emit_reloc(&cs.source[0]);
            stream.emit(cs.source_stride);
            stream.emit_reloc(&cs.dest[0]);
            stream.emit(cs.dest_stride);

            emit_window_and_tail(stream, cs);
        }
        2 => {
            stream.reserve(SUBMIT_WORDS_TWO_PIPES);

            // Config and strides go out as separate single-word states: each
            // is conditionally followed by a variable-length address block.
            emit_load_state(stream, RS_CONFIG, 1, false);
            stream.emit(cs.config);
            emit_load_state(stream, RS_SOURCE_STRIDE, 1, false);
            stream.emit(cs.source_stride);
            emit_load_state(stream, RS_DEST_STRIDE, 1, false);
            stream.emit(cs.dest_stride);

            emit_pipe_addresses(
                stream,
                rs_pipe_source_addr(0),
                &cs.source,
                cs.source_stride & RS_STRIDE_MULTI != 0,
            );
            emit_pipe_addresses(
                stream,
                rs_pipe_dest_addr(0),
                &cs.dest,
                cs.dest_stride & RS_STRIDE_MULTI != 0,
            );

            emit_load_state(stream, rs_pipe_offset(0), 2, false);
            stream.emit(cs.pipe_offset[0]);
            stream.emit(cs.pipe_offset[1]);
            stream.emit(0x0000_0000); // pad

            emit_window_and_tail(stream, cs);
        }
        n => return Err(GpuError::UnsupportedPixelPipes(n)),
    }

    if debug.contains(DebugFlags::RESOLVE) {
        log::debug!(
            "rs: submitted {} words ({} pipes), window 0x{:08X}",
            stream.offset() - begin,
            pixel_pipes,
            cs.window_size
        );
    }
    if debug.contains(DebugFlags::CMDBUF) {
        for (i, word) in stream.words().iter().enumerate().skip(begin as usize) {
            log::trace!("  [{:04}] 0x{:08X}", i, word);
        }
    }

    Ok(())
}

/// Emit one or both per-pipe addresses for a surface, padding the two-pipe
/// form to keep the stream 64-bit aligned.
fn emit_pipe_addresses(stream: &mut CmdStream, base: u32, addrs: &[Reloc; 2], multi: bool) {
    if multi {
        emit_load_state(stream, base, 2, false);
        stream.emit_reloc(&addrs[0]);
        stream.emit_reloc(&addrs[1]);
        stream.emit(0x0000_0000); // pad
    } else {
        emit_load_state(stream, base, 1, false);
        stream.emit_reloc(&addrs[0]);
    }
}

/// Common tail of both submission paths: window size, dither, clear block,
/// extra config, kicker.
fn emit_window_and_tail(stream: &mut CmdStream, cs: &CompiledRsState) {
    emit_load_state(stream, RS_WINDOW_SIZE, 1, false);
    stream.emit(cs.window_size);

    emit_load_state(stream, rs_dither(0), 2, false);
    stream.emit(cs.dither[0]);
    stream.emit(cs.dither[1]);
    stream.emit(RS_PAD_WORD); // pad

    // Clear control and the four fill values are one contiguous block.
    emit_load_state(stream, RS_CLEAR_CONTROL, 5, false);
    stream.emit(cs.clear_control);
    stream.emit(cs.fill_value[0]);
    stream.emit(cs.fill_value[1]);
    stream.emit(cs.fill_value[2]);
    stream.emit(cs.fill_value[3]);

    emit_load_state(stream, RS_EXTRA_CONFIG, 1, false);
    stream.emit(cs.extra_config);

    emit_load_state(stream, RS_KICKER, 1, false);
    stream.emit(RS_KICK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdstream::{Bo, RelocFlags};
    use crate::emit::load_state_header;
    use crate::registers::{RS_FORMAT_A8R8G8B8, RS_FORMAT_R5G6B5};

    fn one_pipe() -> GpuSpecs {
        GpuSpecs {
            pixel_pipes: 1,
            ..GpuSpecs::default()
        }
    }

    fn two_pipes() -> GpuSpecs {
        GpuSpecs {
            pixel_pipes: 2,
            ..GpuSpecs::default()
        }
    }

    fn linear_blit() -> RsState {
        RsState {
            source_format: RS_FORMAT_A8R8G8B8,
            source: [
                Reloc::new(Bo::new(0x80000), 0, RelocFlags::READ),
                Reloc::disabled(),
            ],
            source_stride: 1024,
            dest_format: RS_FORMAT_A8R8G8B8,
            dest: [
                Reloc::new(Bo::new(0x80000), 0, RelocFlags::WRITE),
                Reloc::disabled(),
            ],
            dest_stride: 1024,
            width: 256,
            height: 128,
            ..RsState::default()
        }
    }

    #[test]
    fn test_compile_linear_window_full_height() {
        let cs = compile_rs_state(&one_pipe(), &linear_blit()).unwrap();
        assert_eq!(cs.window_size, rs_window_size(256, 128));
        // Linear layout: no stride shift, no tiling bit.
        assert_eq!(cs.source_stride, 1024);
        assert_eq!(cs.dest_stride, 1024);
    }

    #[test]
    fn test_compile_two_pipes_halves_height() {
        let cs = compile_rs_state(&two_pipes(), &linear_blit()).unwrap();
        assert_eq!(cs.window_size, rs_window_size(256, 64));
        // Second pipe starts at the lower half of the image.
        assert_eq!(cs.pipe_offset[0], rs_pipe_offset_xy(0, 0));
        assert_eq!(cs.pipe_offset[1], rs_pipe_offset_xy(0, 64));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "8-aligned")]
    fn test_compile_two_pipes_rejects_unaligned_height() {
        let mut rs = linear_blit();
        rs.height = 65;
        let _ = compile_rs_state(&two_pipes(), &rs);
    }

    #[test]
    fn test_compile_tiled_stride() {
        let mut rs = linear_blit();
        rs.source_tiling = Layout::Tiled;
        let cs = compile_rs_state(&one_pipe(), &rs).unwrap();

        assert_eq!(cs.source_stride, (1024 << 2) | RS_STRIDE_TILING);
        assert_eq!(cs.config & RS_CONFIG_SOURCE_TILED, RS_CONFIG_SOURCE_TILED);
        // Destination stays linear.
        assert_eq!(cs.dest_stride, 1024);
        assert_eq!(cs.config & RS_CONFIG_DEST_TILED, 0);
    }

    #[test]
    fn test_compile_multi_supertiled() {
        let mut rs = linear_blit();
        rs.source_tiling = Layout::MultiSuperTiled;
        rs.source[1] = Reloc::new(Bo::new(0x80000), 0x4000, RelocFlags::READ);
        let cs = compile_rs_state(&two_pipes(), &rs).unwrap();

        assert_eq!(
            cs.source_stride,
            (1024 << 2) | RS_STRIDE_TILING | RS_STRIDE_MULTI
        );
        assert!(cs.source[1].bo.is_some());
        // Non-multi destination keeps its second pipe slot disabled.
        assert!(cs.dest[1].bo.is_none());
    }

    #[test]
    fn test_compile_config_flags() {
        let mut rs = linear_blit();
        rs.source_format = RS_FORMAT_R5G6B5;
        rs.swap_rb = true;
        rs.downsample_x = true;
        rs.downsample_y = true;
        let cs = compile_rs_state(&one_pipe(), &rs).unwrap();

        assert_eq!(cs.config & 0x1f, RS_FORMAT_R5G6B5);
        assert_eq!((cs.config >> 8) & 0x1f, RS_FORMAT_A8R8G8B8);
        assert_ne!(cs.config & RS_CONFIG_SWAP_RB, 0);
        assert_ne!(cs.config & RS_CONFIG_DOWNSAMPLE_X, 0);
        assert_ne!(cs.config & RS_CONFIG_DOWNSAMPLE_Y, 0);
        assert_eq!(cs.config & RS_CONFIG_FLIP, 0);
    }

    #[test]
    fn test_compile_unsupported_pipe_count() {
        let specs = GpuSpecs {
            pixel_pipes: 3,
            ..GpuSpecs::default()
        };
        assert!(matches!(
            compile_rs_state(&specs, &linear_blit()),
            Err(GpuError::UnsupportedPixelPipes(3))
        ));
    }

    #[test]
    fn test_submit_one_pipe_word_budget() {
        let mut ctx = GpuContext::new(one_pipe(), DebugFlags::empty());
        let cs = compile_rs_state(ctx.specs(), &linear_blit()).unwrap();
        submit_rs_state(&mut ctx, &cs).unwrap();

        let words = ctx.stream().words();
        assert_eq!(words.len(), SUBMIT_WORDS_ONE_PIPE as usize);

        // One 5-word state for config/addresses/strides up front.
        assert_eq!(words[0], load_state_header(RS_CONFIG >> 2, 5, false));
        assert_eq!(words[1], cs.config);
        // Dither block padding.
        assert_eq!(words[11], RS_PAD_WORD);
        // The kicker is the final word.
        assert_eq!(words[20], load_state_header(RS_KICKER >> 2, 1, false));
        assert_eq!(words[21], RS_KICK);

        // Source and dest addresses produced pending patches.
        assert_eq!(ctx.stream_mut().take_relocs().len(), 2);
    }

    #[test]
    fn test_submit_two_pipes_both_multi_uses_full_budget() {
        let mut ctx = GpuContext::new(two_pipes(), DebugFlags::empty());
        let mut rs = linear_blit();
        rs.source_tiling = Layout::MultiSuperTiled;
        rs.dest_tiling = Layout::MultiSuperTiled;
        rs.source[1] = Reloc::new(Bo::new(0x80000), 0x4000, RelocFlags::READ);
        rs.dest[1] = Reloc::new(Bo::new(0x80000), 0x4000, RelocFlags::WRITE);
        let cs = compile_rs_state(ctx.specs(), &rs).unwrap();
        submit_rs_state(&mut ctx, &cs).unwrap();

        let words = ctx.stream().words();
        assert_eq!(words.len(), SUBMIT_WORDS_TWO_PIPES as usize);
        assert_eq!(*words.last().unwrap(), RS_KICK);
        // Two addresses per surface.
        assert_eq!(ctx.stream_mut().take_relocs().len(), 4);
    }

    #[test]
    fn test_submit_two_pipes_single_addresses() {
        let mut ctx = GpuContext::new(two_pipes(), DebugFlags::empty());
        let cs = compile_rs_state(ctx.specs(), &linear_blit()).unwrap();
        submit_rs_state(&mut ctx, &cs).unwrap();

        let words = ctx.stream().words();
        // Non-multi surfaces emit one address each: 4 words fewer than the
        // reserved worst case, left uncommitted.
        assert_eq!(words.len(), 30);
        assert_eq!(*words.last().unwrap(), RS_KICK);
        assert_eq!(
            words[6],
            load_state_header(rs_pipe_source_addr(0) >> 2, 1, false)
        );
        assert_eq!(ctx.stream_mut().take_relocs().len(), 2);
    }

    #[test]
    fn test_submit_unsupported_pipes_leaves_stream_untouched() {
        let specs = GpuSpecs {
            pixel_pipes: 4,
            ..GpuSpecs::default()
        };
        let cs = CompiledRsState::default();
        let mut ctx = GpuContext::new(specs, DebugFlags::empty());

        assert_eq!(
            submit_rs_state(&mut ctx, &cs),
            Err(GpuError::UnsupportedPixelPipes(4))
        );
        assert!(ctx.stream().is_empty());
    }

    #[test]
    fn test_submit_disabled_dest_emits_zero_word() {
        let mut ctx = GpuContext::new(one_pipe(), DebugFlags::empty());
        let mut rs = linear_blit();
        rs.dest = [Reloc::disabled(), Reloc::disabled()];
        let cs = compile_rs_state(ctx.specs(), &rs).unwrap();
        submit_rs_state(&mut ctx, &cs).unwrap();

        // Word 4 is the destination address slot.
        assert_eq!(ctx.stream().words()[4], 0);
        assert_eq!(ctx.stream_mut().take_relocs().len(), 1);
    }
}
