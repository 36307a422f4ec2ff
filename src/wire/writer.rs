// src/wire/writer.rs

//! Snapshot emission: the `measure`/`write` pair.

use std::io::{Read, Write};

use crate::error::{Result, SessionError};
use crate::session::Session;

use super::format::{SnapshotHeader, LENGTH_PREFIX_LEN};

/// Computes the exact byte length the next [`write`] call will produce.
///
/// As a side effect this forces a fresh trajectory snapshot into the Datum 1
/// buffer (a no-op for an uninitialized session), so the measured sizes
/// reflect the state about to be captured. On a fresh session with no Datums
/// this is just the fixed header length.
///
/// # Errors
///
/// Fails when the session claims to be initialized but has no trajectory
/// buffer to dump into.
pub fn measure(session: &mut Session) -> Result<u64> {
    session.write_trajectory_dump()?;

    let mut len = super::HEADER_LEN as u64;
    for index in 0..session.datums().len() {
        len += LENGTH_PREFIX_LEN as u64 + session.datums().size_of(index);
    }
    tracing::debug!(len, datums = session.datums().len(), "measured snapshot");
    Ok(len)
}

/// Streams the snapshot into `sink`.
///
/// Must be called immediately after [`measure`] with no intervening mutation
/// of the session; see the module docs for the non-atomicity caveat. Each
/// Datum is streamed in `buffer_size` chunks. A Datum whose backing storage
/// returns fewer bytes than its recorded size mid-stream is zero-filled to
/// the recorded length rather than failing, so the output length always
/// matches the length prefix already written. The trajectory buffer is
/// cleared afterward: its content has been consumed.
pub fn write(session: &mut Session, sink: &mut dyn Write, buffer_size: usize) -> Result<()> {
    let header = SnapshotHeader {
        steps: session.steps(),
        initialized: session.initialized(),
    };
    sink.write_all(&header.encode())
        .map_err(write_failed)?;

    let mut buf = vec![0u8; buffer_size.max(1)];
    for index in 0..session.datums().len() {
        let total = session.datums().size_of(index);
        sink.write_all(&total.to_le_bytes()).map_err(write_failed)?;

        let datum = session
            .datums_mut()
            .get_mut(index)
            .ok_or_else(|| SessionError::snapshot(format!("datum {index} vanished mid-write")))?;
        let file = datum.reader()?;

        let mut remaining = total;
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let n = file.read(&mut buf[..want]).map_err(|e| {
                SessionError::snapshot(format!("failed to read datum {index}: {e}"))
            })?;
            if n == 0 {
                // Cut short: pad with zeros to the recorded length.
                buf[..want].fill(0);
                sink.write_all(&buf[..want]).map_err(write_failed)?;
                remaining -= want as u64;
                continue;
            }
            sink.write_all(&buf[..n]).map_err(write_failed)?;
            remaining -= n as u64;
        }
    }

    session.clear_trajectory()?;
    Ok(())
}

fn write_failed(e: std::io::Error) -> SessionError {
    SessionError::snapshot(format!("failed to write snapshot: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::engine::MockEngineFactory;
    use crate::session::TRAJECTORY_DATUM;
    use crate::wire::HEADER_LEN;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.scratch.scratch_dir = dir.path().to_path_buf();
        config.scratch.buffer_size = 16; // exercise chunked streaming
        config
    }

    #[test]
    fn test_measure_fresh_session_is_header_only() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let mut session = Session::open(&factory, &test_config(&dir)).unwrap();

        assert_eq!(measure(&mut session).unwrap(), HEADER_LEN as u64);
    }

    #[test]
    fn test_measure_sums_prefixed_datums() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let mut session = Session::open(&factory, &test_config(&dir)).unwrap();

        session
            .datums_mut()
            .create(Some(b"12345".as_slice()))
            .unwrap();
        session
            .datums_mut()
            .create(Some(b"abc".as_slice()))
            .unwrap();

        // Uninitialized, so no dump is forced and sizes stay as written
        let len = measure(&mut session).unwrap();
        assert_eq!(len, (HEADER_LEN + 8 + 5 + 8 + 3) as u64);
    }

    #[test]
    fn test_write_matches_measure() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let config = test_config(&dir);
        let mut session = Session::open(&factory, &config).unwrap();

        session
            .datums_mut()
            .create(Some(b"create_atoms 4\n".as_slice()))
            .unwrap();
        session.datums_mut().create(None).unwrap();

        let len = measure(&mut session).unwrap();
        let mut out = Vec::new();
        write(&mut session, &mut out, config.scratch.buffer_size).unwrap();

        assert_eq!(out.len() as u64, len);
        assert_eq!(&out[..8], &0u64.to_le_bytes());
        assert_eq!(&out[8..12], &0u32.to_le_bytes());
    }

    #[test]
    fn test_write_clears_trajectory_buffer() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let config = test_config(&dir);
        let mut session = Session::open(&factory, &config).unwrap();

        session
            .datums_mut()
            .create(Some(b"create_atoms 2\n".as_slice()))
            .unwrap();
        session
            .datums_mut()
            .create(Some(b"traj".as_slice()))
            .unwrap();
        session.startup(true, 10).unwrap();

        let _ = measure(&mut session).unwrap();
        let mut out = Vec::new();
        write(&mut session, &mut out, config.scratch.buffer_size).unwrap();

        assert_eq!(session.datums().size_of(TRAJECTORY_DATUM), 0);
    }

    #[test]
    fn test_initialized_measure_forces_dump() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let config = test_config(&dir);
        let mut session = Session::open(&factory, &config).unwrap();

        session
            .datums_mut()
            .create(Some(b"create_atoms 3\n".as_slice()))
            .unwrap();
        session
            .datums_mut()
            .create(Some(b"old".as_slice()))
            .unwrap();
        session.startup(true, 5).unwrap();

        // startup consumed the buffer; measure refills it from the engine
        assert_eq!(session.datums().size_of(TRAJECTORY_DATUM), 0);
        let _ = measure(&mut session).unwrap();
        assert!(session.datums().size_of(TRAJECTORY_DATUM) > 0);

        let content = session.datums_mut().read(TRAJECTORY_DATUM).unwrap();
        assert!(content.starts_with(b"dump atoms=3"));
    }

    /// Sink that truncates a backing file out from under the stream as soon
    /// as the first datum length prefix arrives (write 1 is the header,
    /// write 2 the prefix), after the size has been recorded.
    struct TruncatingSink {
        out: Vec<u8>,
        target: std::path::PathBuf,
        writes: usize,
    }

    impl std::io::Write for TruncatingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            if self.writes == 2 {
                std::fs::OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .open(&self.target)?;
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mid_stream_truncation_zero_fills() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let config = test_config(&dir);
        let mut session = Session::open(&factory, &config).unwrap();

        session
            .datums_mut()
            .create(Some(b"0123456789".as_slice()))
            .unwrap();
        session.datums_mut().create(None).unwrap();

        let len = measure(&mut session).unwrap();
        let mut sink = TruncatingSink {
            out: Vec::new(),
            target: session.datums().path(0).unwrap(),
            writes: 0,
        };
        write(&mut session, &mut sink, config.scratch.buffer_size).unwrap();

        // The output still honors the recorded length, padded with zeros
        assert_eq!(sink.out.len() as u64, len);
        assert_eq!(&sink.out[12..20], &10u64.to_le_bytes());
        assert_eq!(&sink.out[20..30], &[0u8; 10]);
    }

    #[test]
    fn test_intervening_mutation_changes_output_length() {
        let dir = TempDir::new().unwrap();
        let factory = MockEngineFactory::new();
        let config = test_config(&dir);
        let mut session = Session::open(&factory, &config).unwrap();

        session
            .datums_mut()
            .create(Some(b"0123456789".as_slice()))
            .unwrap();
        session.datums_mut().create(None).unwrap();

        let len = measure(&mut session).unwrap();

        // Mutating a datum between measure and write is the documented
        // two-pass hazard: write re-reads sizes, so the output no longer
        // matches what measure promised.
        session.datums_mut().overwrite(0, b"01").unwrap();
        let mut out = Vec::new();
        write(&mut session, &mut out, config.scratch.buffer_size).unwrap();

        assert_eq!(out.len() as u64, len - 8);
    }
}
