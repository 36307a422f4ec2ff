// src/wire/legacy.rs

//! Decode shims for the two older snapshot generations.
//!
//! Generation 0 persisted a single restart-checkpoint blob and nothing else.
//! Generation 1 added the datum list behind a bare `u32 initialized` header,
//! but had no step counter. Both decode into the same in-memory session
//! model as the canonical format; neither can be encoded anymore.

use crate::config::SessionConfig;
use crate::engine::EngineFactory;
use crate::error::{Result, SessionError};
use crate::session::Session;

use super::reader::append_datums;

/// Header size of the generation-1 layout: just `u32 initialized`.
pub const FLAGGED_HEADER_LEN: usize = 4;

/// Decodes a generation-0 snapshot: the bytes are one raw restart blob.
///
/// The whole payload is staged to a temp file and loaded as a checkpoint.
/// Note this format required the entire checkpoint in memory at once; the
/// richer layouts exist precisely to lift that limit.
pub fn parse_restart_only(
    factory: &dyn EngineFactory,
    config: &SessionConfig,
    bytes: &[u8],
) -> Result<Session> {
    if bytes.is_empty() {
        return Err(SessionError::malformed("restart snapshot is empty"));
    }
    Session::open_from_restart(factory, config, bytes)
}

/// Decodes a generation-1 snapshot: `u32 initialized` then the datum list.
///
/// The layout carried no step counter, so a decoded session resumes with
/// `steps == 0`.
pub fn parse_flagged(
    factory: &dyn EngineFactory,
    config: &SessionConfig,
    bytes: &[u8],
) -> Result<Session> {
    if bytes.len() < FLAGGED_HEADER_LEN {
        return Err(SessionError::malformed(format!(
            "flagged snapshot shorter than its {FLAGGED_HEADER_LEN}-byte header ({} bytes)",
            bytes.len()
        )));
    }
    let flag = u32::from_le_bytes(bytes[..4].try_into().expect("sliced to 4 bytes"));
    let payload = &bytes[FLAGGED_HEADER_LEN..];
    if payload.is_empty() {
        return Err(SessionError::malformed("flagged snapshot has no payload"));
    }

    let mut session = Session::open(factory, config)?;
    append_datums(&mut session, payload)?;
    session.startup(flag != 0, 0)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngineFactory;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.scratch.scratch_dir = dir.path().to_path_buf();
        config
    }

    fn record(bytes: &[u8]) -> Vec<u8> {
        let mut out = (bytes.len() as u64).to_le_bytes().to_vec();
        out.extend_from_slice(bytes);
        out
    }

    #[test]
    fn test_restart_only_roundtrip() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();

        let session =
            parse_restart_only(&factory, &test_config(&dir), b"restart atoms=12").unwrap();

        assert_eq!(session.atom_count(), 12);
        assert!(!session.initialized());
    }

    #[test]
    fn test_restart_only_empty_fails() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();

        let result = parse_restart_only(&factory, &test_config(&dir), b"");
        assert!(matches!(result, Err(SessionError::Malformed { .. })));
        assert_eq!(factory.opened(), 0);
    }

    #[test]
    fn test_flagged_decodes_without_steps() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&record(b"create_atoms 3\n"));
        bytes.extend_from_slice(&record(b"dump bytes"));

        let session = parse_flagged(&factory, &test_config(&dir), &bytes).unwrap();

        assert!(session.initialized());
        assert_eq!(session.steps(), 0);
        assert_eq!(session.atom_count(), 3);
    }

    #[test]
    fn test_flagged_short_header_fails() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();

        let result = parse_flagged(&factory, &test_config(&dir), &[1, 0]);
        assert!(matches!(result, Err(SessionError::Malformed { .. })));
        assert_eq!(factory.opened(), 0);
    }
}
