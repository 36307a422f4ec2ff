// src/wire/reader.rs

//! Snapshot parsing.

use crate::config::SessionConfig;
use crate::engine::EngineFactory;
use crate::error::{Result, SessionError};
use crate::session::Session;

use super::format::{SnapshotHeader, HEADER_LEN, LENGTH_PREFIX_LEN};

/// Reconstructs a session from a snapshot byte sequence.
///
/// Truncated input is tolerated per Datum: a length prefix claiming more
/// bytes than remain yields a Datum holding whatever bytes are actually
/// present. Malformed input (header shorter than 12 bytes, or no payload at
/// all after the header) is fatal before any session is allocated. A scratch
/// allocation failure mid-parse tears down the partially built session and
/// reports failure; nothing leaks on any path.
pub fn parse(
    factory: &dyn EngineFactory,
    config: &SessionConfig,
    bytes: &[u8],
) -> Result<Session> {
    if bytes.len() < HEADER_LEN {
        return Err(SessionError::malformed(format!(
            "snapshot shorter than its {HEADER_LEN}-byte header ({} bytes)",
            bytes.len()
        )));
    }
    let header = SnapshotHeader::decode(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    if payload.is_empty() {
        return Err(SessionError::malformed("snapshot has no datum payload"));
    }

    let mut session = Session::open(factory, config)?;
    append_datums(&mut session, payload)?;
    session.startup(header.initialized, header.steps)?;

    tracing::debug!(
        datums = session.datums().len(),
        initialized = header.initialized,
        steps = header.steps,
        "parsed snapshot"
    );
    Ok(session)
}

/// Appends one Datum per length-prefixed record in `payload`.
///
/// Each declared length is clamped to the bytes actually remaining; a
/// truncated final record is a short Datum, not an error.
pub(super) fn append_datums(session: &mut Session, payload: &[u8]) -> Result<()> {
    let mut rest = payload;
    while !rest.is_empty() {
        let take = rest.len().min(LENGTH_PREFIX_LEN);
        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        prefix[..take].copy_from_slice(&rest[..take]);
        rest = &rest[take..];

        let declared = u64::from_le_bytes(prefix);
        let have = (rest.len() as u64).min(declared) as usize;
        session.datums_mut().create(Some(&rest[..have]))?;
        rest = &rest[have..];
    }
    Ok(())
}
