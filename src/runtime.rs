// src/runtime.rs

//! Top-level orchestration.
//!
//! The [`SessionRuntime`] ties together configuration, the engine factory,
//! and the wire protocol, and is the surface an embedder drives.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use md_session::{MockEngineFactory, SessionRuntime};
//!
//! let runtime = SessionRuntime::new(Arc::new(MockEngineFactory::new())).unwrap();
//!
//! // Capture a fresh session
//! let mut session = runtime.open_session().unwrap();
//! session.startup(false, 0).unwrap();
//! let snapshot = runtime.snapshot_to_vec(&mut session).unwrap();
//!
//! // Restore it elsewhere
//! let restored = runtime.parse(&snapshot).unwrap();
//! assert_eq!(restored.initialized(), session.initialized());
//! ```

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::engine::EngineFactory;
use crate::error::Result;
use crate::session::Session;
use crate::wire;

/// Orchestrates session lifecycle and the snapshot protocol.
pub struct SessionRuntime {
    config: SessionConfig,
    factory: Arc<dyn EngineFactory>,
}

impl SessionRuntime {
    /// Creates a runtime with default configuration.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Result<Self> {
        Self::from_config(SessionConfig::default(), factory)
    }

    /// Creates a runtime from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: SessionConfig, factory: Arc<dyn EngineFactory>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, factory })
    }

    /// Creates a runtime from a TOML configuration file, with environment
    /// overrides applied after loading.
    pub fn from_config_file(
        path: impl AsRef<Path>,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<Self> {
        let config = SessionConfig::from_file(path)?.with_env_overrides();
        Self::from_config(config, factory)
    }

    /// Opens a fresh, uninitialized session.
    pub fn open_session(&self) -> Result<Session> {
        Session::open(self.factory.as_ref(), &self.config)
    }

    /// Opens a session from a raw restart-checkpoint blob.
    pub fn open_from_restart(&self, bytes: &[u8]) -> Result<Session> {
        Session::open_from_restart(self.factory.as_ref(), &self.config, bytes)
    }

    /// Reconstructs a session from a snapshot (canonical format).
    pub fn parse(&self, bytes: &[u8]) -> Result<Session> {
        wire::parse(self.factory.as_ref(), &self.config, bytes)
    }

    /// Decodes a generation-1 snapshot (`u32 initialized`, no steps).
    pub fn parse_legacy_flagged(&self, bytes: &[u8]) -> Result<Session> {
        wire::legacy::parse_flagged(self.factory.as_ref(), &self.config, bytes)
    }

    /// Decodes a generation-0 snapshot (raw restart blob).
    pub fn parse_legacy_restart(&self, bytes: &[u8]) -> Result<Session> {
        wire::legacy::parse_restart_only(self.factory.as_ref(), &self.config, bytes)
    }

    /// Computes the byte length the next [`write_snapshot`] call will
    /// produce, forcing a fresh trajectory dump first.
    ///
    /// [`write_snapshot`]: Self::write_snapshot
    pub fn measure(&self, session: &mut Session) -> Result<u64> {
        wire::measure(session)
    }

    /// Streams the snapshot into `sink`. Call immediately after
    /// [`measure`](Self::measure); the pair is not atomic (see [`wire`]).
    pub fn write_snapshot(&self, session: &mut Session, sink: &mut dyn Write) -> Result<()> {
        wire::write(session, sink, self.config.scratch.buffer_size)
    }

    /// Convenience: `measure` then `write_snapshot` back to back, into a
    /// pre-sized buffer.
    pub fn snapshot_to_vec(&self, session: &mut Session) -> Result<Vec<u8>> {
        let len = self.measure(session)?;
        let mut out = Vec::with_capacity(len as usize);
        self.write_snapshot(session, &mut out)?;
        Ok(out)
    }

    /// Clones a live session: forces a snapshot on the source, duplicates
    /// its Datum List, and starts a new session around the copy with the
    /// source's flags. The source's trajectory buffer is cleared afterward
    /// (the snapshot has been consumed).
    ///
    /// # Errors
    ///
    /// Any failure releases whatever was partially built, records the error
    /// against the source session, and reports it; the source is otherwise
    /// left intact.
    pub fn duplicate(&self, source: &mut Session) -> Result<Session> {
        let result = self.try_duplicate(source);
        if let Err(e) = &result {
            source.set_error(e.to_string());
            tracing::warn!(error = %e, "session duplicate failed");
        }
        result
    }

    fn try_duplicate(&self, source: &mut Session) -> Result<Session> {
        source.write_trajectory_dump()?;
        let datums = source.datums_mut().duplicate()?;

        let mut copy = Session::open(self.factory.as_ref(), &self.config)?;
        copy.replace_datums(datums);
        copy.startup(source.initialized(), source.steps())?;

        source.clear_trajectory()?;
        Ok(copy)
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngineFactory;
    use tempfile::TempDir;

    fn test_runtime(dir: &TempDir) -> (SessionRuntime, Arc<MockEngineFactory>) {
        let factory = Arc::new(MockEngineFactory::new());
        let mut config = SessionConfig::default();
        config.scratch.scratch_dir = dir.path().to_path_buf();
        let runtime = SessionRuntime::from_config(config, factory.clone()).unwrap();
        (runtime, factory)
    }

    #[test]
    fn test_from_config_validates() {
        let factory = Arc::new(MockEngineFactory::new());
        let mut config = SessionConfig::default();
        config.scratch.buffer_size = 0;
        assert!(SessionRuntime::from_config(config, factory).is_err());
    }

    #[test]
    fn test_open_session() {
        let dir = TempDir::new().unwrap();
        let (runtime, _) = test_runtime(&dir);

        let session = runtime.open_session().unwrap();
        assert!(!session.initialized());
        assert!(session.datums().is_empty());
    }

    #[test]
    fn test_snapshot_to_vec_roundtrip() {
        let dir = TempDir::new().unwrap();
        let (runtime, _) = test_runtime(&dir);

        let mut session = runtime.open_session().unwrap();
        session
            .datums_mut()
            .create(Some(b"create_atoms 9\n".as_slice()))
            .unwrap();
        session.datums_mut().create(None).unwrap();
        session.startup(false, 0).unwrap();

        let snapshot = runtime.snapshot_to_vec(&mut session).unwrap();
        let restored = runtime.parse(&snapshot).unwrap();

        assert_eq!(restored.atom_count(), 9);
        assert_eq!(restored.datums().len(), session.datums().len());
    }

    #[test]
    fn test_duplicate_failure_sets_source_error() {
        let dir = TempDir::new().unwrap();
        let (runtime, factory) = test_runtime(&dir);

        let mut session = runtime.open_session().unwrap();
        session.startup(false, 0).unwrap();
        assert!(session.last_error().is_none());

        factory.fail_next_open();
        let result = runtime.duplicate(&mut session);

        assert!(result.is_err());
        assert!(session.last_error().is_some());
        // Source still usable afterward
        assert_eq!(session.datums().len(), 2);
    }

    #[test]
    fn test_duplicate_preserves_flags() {
        let dir = TempDir::new().unwrap();
        let (runtime, _) = test_runtime(&dir);

        let mut session = runtime.open_session().unwrap();
        session
            .datums_mut()
            .create(Some(b"create_atoms 4\n".as_slice()))
            .unwrap();
        session
            .datums_mut()
            .create(Some(b"traj".as_slice()))
            .unwrap();
        session.startup(true, 123).unwrap();

        let copy = runtime.duplicate(&mut session).unwrap();

        assert!(copy.initialized());
        assert_eq!(copy.steps(), 123);
        assert_eq!(copy.atom_count(), session.atom_count());
    }
}
