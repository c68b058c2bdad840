// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-stream encoding core for Vivante GC-class GPUs.
//!
//! Translates pipeline state (register writes, draw calls, resolve/blit
//! parameters) into the packed binary instruction stream the GPU front-end
//! consumes. Register writes to adjacent addresses are coalesced under a
//! single LOAD_STATE header; buffer-object addresses are emitted as
//! relocations patched at submission time by the kernel-submission layer,
//! which is not part of this crate.

pub mod cmdstream;
pub mod coalesce;
pub mod context;
pub mod emit;
pub mod registers;
pub mod rs;

pub use cmdstream::{Bo, CmdStream, Reloc, RelocFlags, RelocPatch};
pub use coalesce::Coalescer;
pub use context::{GpuContext, GpuSpecs};
pub use rs::{compile_rs_state, submit_rs_state, CompiledRsState, Layout, RsState};
