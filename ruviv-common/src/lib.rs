// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod error;
pub mod settings;
pub mod types;

pub use error::GpuError;
pub use settings::DebugFlags;
pub use types::*;
