// src/session/mod.rs

//! Session lifecycle: one engine instance plus its scratch data.
//!
//! A [`Session`] exclusively owns one opaque engine instance and one
//! [`DatumList`]. Nothing else may reference either; every relation in this
//! subsystem is a strict single-owner tree, and teardown is RAII (the Datum
//! List is released first, then the engine).
//!
//! Datum conventions for a started session: position 0 holds a command
//! script (uninitialized) or a restart checkpoint (initialized); position 1
//! is the trajectory-dump buffer used to transfer live coordinate/velocity
//! state; positions >= 2 round-trip opaquely for future auxiliary data.

use std::io::Write;

use crate::config::{EngineConfig, SessionConfig};
use crate::engine::{commands, Engine, EngineFactory};
use crate::error::{Result, SessionError};
use crate::scratch::DatumList;

/// Datum position holding the command script or restart checkpoint.
pub const SCRIPT_DATUM: usize = 0;
/// Datum position holding the trajectory-dump buffer.
pub const TRAJECTORY_DATUM: usize = 1;
/// Minimum Datum count for a started session.
pub const MIN_DATUMS: usize = 2;

/// One simulation session: engine instance, scratch data, and state flags.
///
/// `initialized == false` means only a command script or topology has been
/// loaded and Datum 0 (if present) is a plain script. `initialized == true`
/// means dynamics state exists, at least [`MIN_DATUMS`] Datums are present,
/// and `steps` records the total integration steps elapsed.
///
/// No operation may be invoked concurrently on one session; the design
/// assumes single ownership per call site and `&mut self` enforces that for
/// safe callers.
pub struct Session {
    // Field order is teardown order: scratch data before the engine.
    datums: DatumList,
    engine: Box<dyn Engine>,
    initialized: bool,
    steps: u64,
    last_error: Option<String>,
    engine_cfg: EngineConfig,
}

impl Session {
    /// Opens a fresh session: empty engine instance, no Datums, not
    /// initialized.
    ///
    /// # Errors
    ///
    /// Returns an error only if the engine cannot be constructed.
    pub fn open(factory: &dyn EngineFactory, config: &SessionConfig) -> Result<Self> {
        let engine = factory.open()?;
        tracing::debug!("opened fresh session");
        Ok(Self {
            datums: DatumList::new(config.scratch.clone()),
            engine,
            initialized: false,
            steps: 0,
            last_error: None,
            engine_cfg: config.engine.clone(),
        })
    }

    /// Opens a session directly from a raw restart checkpoint blob.
    ///
    /// The bytes are staged into a uniquely named temporary file, the engine
    /// is told to load it, and the staged file is removed afterward on every
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging file cannot be created or fully
    /// written, or if the engine cannot be constructed.
    pub fn open_from_restart(
        factory: &dyn EngineFactory,
        config: &SessionConfig,
        bytes: &[u8],
    ) -> Result<Self> {
        let dir = config.scratch.resolve_scratch_dir();
        let mut staged = tempfile::Builder::new()
            .prefix("restart")
            .suffix(".dat")
            .tempfile_in(&dir)
            .map_err(|e| {
                SessionError::scratch_with_source(&dir, "failed to create staging file", e)
            })?;
        staged.write_all(bytes).map_err(|e| {
            SessionError::scratch_with_source(
                staged.path().to_path_buf(),
                "failed to write restart blob",
                e,
            )
        })?;
        staged.flush().map_err(|e| {
            SessionError::scratch_with_source(
                staged.path().to_path_buf(),
                "failed to flush restart blob",
                e,
            )
        })?;

        let mut session = Self::open(factory, config)?;
        session
            .engine
            .command(&commands::read_restart(staged.path()));
        Ok(session)
        // staged drops here, removing the file whatever happened above
    }

    /// Reconciles a freshly populated Datum List with the engine.
    ///
    /// Invoked once after `parse` (or a copy) has filled the list:
    ///
    /// - With fewer than [`MIN_DATUMS`] Datums, the missing scaffold Datums
    ///   are allocated and declared to the engine as named variables, and
    ///   the session stays uninitialized.
    /// - Otherwise every auxiliary Datum (index >= 1) is declared as a named
    ///   string variable referencing its backing file and Datum 0 is
    ///   executed as a script.
    /// - With `initialized` set, the trajectory buffer at Datum 1 is then
    ///   replayed at the given step offset, `steps` is recorded, Datum 1 is
    ///   cleared (its content has been consumed), and the session becomes
    ///   initialized.
    pub fn startup(&mut self, initialized: bool, steps: u64) -> Result<()> {
        if self.datums.len() < MIN_DATUMS {
            while self.datums.len() < MIN_DATUMS {
                self.datums.create(None)?;
            }
            self.declare_datum_variables(0)?;
            self.initialized = false;
            self.steps = 0;
            return Ok(());
        }

        self.declare_datum_variables(TRAJECTORY_DATUM)?;

        let script = self.datum_path(SCRIPT_DATUM)?;
        self.engine.run_script(&script);

        if initialized {
            let trajectory = self.datum_path(TRAJECTORY_DATUM)?;
            self.engine.command(&commands::read_dump(
                &trajectory,
                steps,
                &self.engine_cfg.replay_fields,
            ));
            self.steps = steps;
            self.datums.overwrite(TRAJECTORY_DATUM, &[])?;
            self.initialized = true;
        }
        tracing::debug!(
            initialized = self.initialized,
            steps = self.steps,
            datums = self.datums.len(),
            "session started"
        );
        Ok(())
    }

    fn declare_datum_variables(&mut self, from: usize) -> Result<()> {
        for index in from..self.datums.len() {
            let path = self.datum_path(index)?;
            self.engine.command(&commands::declare_variable(
                &self.engine_cfg.variable_prefix,
                index,
                &path,
            ));
        }
        Ok(())
    }

    fn datum_path(&self, index: usize) -> Result<std::path::PathBuf> {
        self.datums.path(index).ok_or_else(|| {
            SessionError::snapshot(format!("no datum at index {index}"))
        })
    }

    /// Forces a fresh trajectory snapshot into the Datum 1 buffer.
    ///
    /// A no-op on an uninitialized session. Fails when the session claims to
    /// be initialized but has no trajectory buffer to dump into.
    pub(crate) fn write_trajectory_dump(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        if self.datums.len() < MIN_DATUMS {
            return Err(SessionError::snapshot(
                "initialized session is missing its trajectory buffer",
            ));
        }
        self.datums.overwrite(TRAJECTORY_DATUM, &[])?;
        let path = self.datum_path(TRAJECTORY_DATUM)?;
        self.engine
            .command(&commands::write_dump(&path, &self.engine_cfg.dump_fields));
        Ok(())
    }

    /// Clears the trajectory buffer after its content has been consumed.
    pub(crate) fn clear_trajectory(&mut self) -> Result<()> {
        if self.datums.len() > TRAJECTORY_DATUM {
            self.datums.overwrite(TRAJECTORY_DATUM, &[])?;
        }
        Ok(())
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Total integration steps elapsed; meaningful once initialized.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn atom_count(&self) -> u64 {
        self.engine.atom_count()
    }

    pub fn datums(&self) -> &DatumList {
        &self.datums
    }

    /// Mutable access to the Datum List, for staging data before `startup`.
    pub fn datums_mut(&mut self) -> &mut DatumList {
        &mut self.datums
    }

    pub(crate) fn replace_datums(&mut self, datums: DatumList) {
        self.datums = datums;
    }

    /// Last fatal error recorded against this session, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// One-line human description, for host registration surfaces.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "md session ({} atoms, {} datums)",
            self.engine.atom_count(),
            self.datums.len()
        )
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("initialized", &self.initialized)
            .field("steps", &self.steps)
            .field("datums", &self.datums.len())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::info!(datums = self.datums.len(), "closing session");
    }
}
