// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Errors reported by the command-stream encoding layer.
///
/// These cover unsupported device configurations only. Contract violations
/// (emitting past a reservation, patching an unwritten word) are programming
/// defects and are caught by debug assertions instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GpuError {
    #[error("unsupported pixel pipe count: {0}")]
    UnsupportedPixelPipes(u32),
    #[error("{0} state words exceed the LOAD_STATE count field")]
    StateCountOverflow(u32),
}
