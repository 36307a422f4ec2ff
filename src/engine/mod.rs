// src/engine/mod.rs

//! The simulation-engine collaborator seam.
//!
//! The engine is an external black box to this layer: commands are handed to
//! it as strings, script files by path, and the only value ever read back is
//! the atom count. Engine-internal failures are not visible here and are
//! assumed not to occur; nothing in this crate inspects command results.
//!
//! Production embedders implement [`Engine`]/[`EngineFactory`] over the real
//! solver's C API. [`MockEngine`] is an in-process stand-in used by the test
//! suite.

pub mod commands;
mod mock;

pub use mock::{MockEngine, MockEngineFactory};

use std::path::Path;

use crate::error::Result;

/// One opaque simulation-engine instance.
///
/// Instances are exclusively owned by a session and released on drop.
pub trait Engine: Send {
    /// Executes one command string. Engine-side errors are not inspected.
    fn command(&mut self, command: &str);

    /// Executes a script file line by line.
    fn run_script(&mut self, path: &Path);

    /// Number of atoms currently in the simulation.
    fn atom_count(&self) -> u64;
}

/// Opens fresh engine instances.
pub trait EngineFactory: Send + Sync {
    /// Opens a new, empty engine instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be constructed.
    fn open(&self) -> Result<Box<dyn Engine>>;
}
