// src/engine/mock.rs

//! In-process mock engine for the test suite.
//!
//! The mock understands just enough of the command surface this crate emits
//! to make round-trip tests observable: `create_atoms` grows the atom count,
//! `write_dump` writes a deterministic trajectory file, `read_dump` ingests
//! one, `read_restart` restores the atom count from a staged blob, and
//! `variable` declarations are recorded. Everything else is logged and
//! ignored, which matches how the real engine is treated: commands are
//! fire-and-forget.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, SessionError};

use super::{Engine, EngineFactory};

/// Observable state of one mock engine instance.
#[derive(Debug, Default)]
pub struct MockState {
    /// Atoms currently in the simulation.
    pub atoms: u64,
    /// Every command string ever issued, in order.
    pub commands: Vec<String>,
    /// Declared string variables (name -> path).
    pub variables: HashMap<String, String>,
    /// Content of the last trajectory buffer ingested via `read_dump`.
    pub last_replay: Option<Vec<u8>>,
    /// Step offset given with the last `read_dump`.
    pub last_replay_steps: Option<u64>,
}

impl MockState {
    fn render_dump(&self, fields: &str) -> String {
        let mut out = format!("dump atoms={} fields={fields}\n", self.atoms);
        for i in 0..self.atoms {
            out.push_str(&format!("{i} 0.0 0.0 0.0\n"));
        }
        out
    }
}

/// Scriptable engine stand-in. See the module docs for supported commands.
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Arc<Mutex<MockState>>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Engine for MockEngine {
    fn command(&mut self, command: &str) {
        let mut state = lock(&self.state);
        state.commands.push(command.to_string());

        let parts: Vec<&str> = command.split_whitespace().collect();
        match parts.first().copied() {
            Some("create_atoms") => {
                if let Some(n) = parts.get(1).and_then(|s| s.parse::<u64>().ok()) {
                    state.atoms += n;
                }
            }
            Some("delete_atoms") => {
                state.atoms = 0;
            }
            // write_dump all custom <path> <fields...>
            Some("write_dump") => {
                if let Some(path) = parts.get(3) {
                    let fields = parts[4..].join(" ");
                    let content = state.render_dump(&fields);
                    // Engine-side failures are invisible to the binding layer.
                    let _ = std::fs::write(path, content);
                }
            }
            // read_dump <path> <steps> <fields...>
            Some("read_dump") => {
                if let Some(path) = parts.get(1) {
                    state.last_replay = std::fs::read(path).ok();
                    state.last_replay_steps = parts.get(2).and_then(|s| s.parse().ok());
                }
            }
            // read_restart <path>
            Some("read_restart") => {
                if let Some(content) = parts.get(1).and_then(|p| std::fs::read_to_string(p).ok())
                {
                    if let Some(atoms) = parse_token(&content, "atoms=") {
                        state.atoms = atoms;
                    }
                }
            }
            // variable <name> string <path>
            Some("variable") => {
                if let (Some(name), Some("string"), Some(path)) =
                    (parts.get(1), parts.get(2).copied(), parts.get(3))
                {
                    state
                        .variables
                        .insert(name.to_string(), path.to_string());
                }
            }
            _ => {}
        }
    }

    fn run_script(&mut self, path: &Path) {
        let Ok(script) = std::fs::read_to_string(path) else {
            return;
        };
        for line in script.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.command(line);
        }
    }

    fn atom_count(&self) -> u64 {
        lock(&self.state).atoms
    }
}

fn parse_token(content: &str, key: &str) -> Option<u64> {
    content
        .split_whitespace()
        .find_map(|tok| tok.strip_prefix(key))
        .and_then(|v| v.parse().ok())
}

/// Factory that opens [`MockEngine`] instances and keeps a handle on every
/// one of them for post-hoc inspection.
#[derive(Default)]
pub struct MockEngineFactory {
    instances: Mutex<Vec<Arc<Mutex<MockState>>>>,
    fail_next_open: Mutex<bool>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `open` call fail, for exercising unwind paths.
    pub fn fail_next_open(&self) {
        *self
            .fail_next_open
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = true;
    }

    /// State of the `n`-th opened instance.
    pub fn instance(&self, n: usize) -> Option<Arc<Mutex<MockState>>> {
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(n)
            .cloned()
    }

    /// Number of instances opened so far.
    pub fn opened(&self) -> usize {
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl EngineFactory for MockEngineFactory {
    fn open(&self) -> Result<Box<dyn Engine>> {
        let mut fail = self
            .fail_next_open
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *fail {
            *fail = false;
            return Err(SessionError::engine("mock engine refused to open"));
        }
        drop(fail);

        let state = Arc::new(Mutex::new(MockState::default()));
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(state.clone());
        Ok(Box::new(MockEngine { state }))
    }
}
