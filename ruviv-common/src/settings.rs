// SPDX-FileCopyrightText: 2025 ruviv contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Driver debug switches.
//!
//! Debug flags are an explicit value threaded into the GPU context at
//! construction. The caller decides where the flag list comes from (an
//! environment variable, a config file); this module only parses it.

use bitflags::bitflags;

bitflags! {
    /// Debug switches for the command-stream layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugFlags: u32 {
        /// Log submission-level events.
        const MSGS = 1;
        /// Dump command buffer words after each resolve submission.
        const CMDBUF = 2;
        /// Log compiled resolve state on submission.
        const RESOLVE = 4;
    }
}

impl DebugFlags {
    /// Parse a comma-separated flag list, e.g. `"msgs,cmdbuf"`.
    /// Unknown names are ignored with a warning.
    pub fn from_list(list: &str) -> Self {
        let mut flags = Self::empty();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name {
                "msgs" => flags |= Self::MSGS,
                "cmdbuf" => flags |= Self::CMDBUF,
                "resolve" => flags |= Self::RESOLVE,
                _ => log::warn!("ignoring unknown debug flag {:?}", name),
            }
        }
        flags
    }
}

impl Default for DebugFlags {
    fn default() -> Self {
        Self::empty()
    }
}
