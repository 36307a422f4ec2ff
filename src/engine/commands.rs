// src/engine/commands.rs

//! Structured construction of engine command strings.
//!
//! Commands that embed a scratch-file path are always built from typed
//! fields with `format!`, never by patching characters into a template at
//! fixed offsets. Path widths therefore cannot corrupt neighboring text.

use std::path::Path;

/// Dump the current trajectory (positions and velocities) to `path`.
pub fn write_dump(path: &Path, fields: &str) -> String {
    format!("write_dump all custom {} {fields}", path.display())
}

/// Replay a previously dumped trajectory from `path` at step `steps`.
pub fn read_dump(path: &Path, steps: u64, fields: &str) -> String {
    format!("read_dump {} {steps} {fields}", path.display())
}

/// Load a full restart checkpoint from `path`.
pub fn read_restart(path: &Path) -> String {
    format!("read_restart {}", path.display())
}

/// Declare an engine-side string variable naming a Datum's backing file.
pub fn declare_variable(prefix: &str, index: usize, path: &Path) -> String {
    format!("variable {prefix}{index} string {}", path.display())
}
