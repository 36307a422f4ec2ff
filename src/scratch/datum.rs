// src/scratch/datum.rs

//! A single scratch byte-container.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::ScratchConfig;
use crate::error::{Result, SessionError};

/// One scratch byte-container backed by a uniquely named temporary file.
///
/// The backing file is created together with the Datum and removed when the
/// Datum is dropped. The generated file name is process-local and never part
/// of any serialized output; only content travels on the wire.
pub struct Datum {
    file: NamedTempFile,
}

impl Datum {
    /// Creates an empty Datum in the configured scratch directory.
    ///
    /// # Errors
    ///
    /// Returns a scratch-allocation error if the backing file cannot be
    /// created.
    pub fn create(config: &ScratchConfig) -> Result<Self> {
        let dir = config.resolve_scratch_dir();
        let file = tempfile::Builder::new()
            .prefix(&config.datum_prefix)
            .suffix(".dat")
            .tempfile_in(&dir)
            .map_err(|e| {
                SessionError::scratch_with_source(&dir, "failed to create scratch file", e)
            })?;

        tracing::debug!(path = %file.path().display(), "created scratch datum");
        Ok(Self { file })
    }

    /// Path of the backing file, for handing to the engine.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn owned_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Current content length in bytes.
    ///
    /// Inaccessible backing storage reads as 0 rather than an error; callers
    /// must tolerate silently-empty data.
    pub fn size(&self) -> u64 {
        self.file.as_file().metadata().map(|m| m.len()).unwrap_or(0)
    }

    /// Truncates the backing file to empty, then writes `bytes` if non-empty.
    ///
    /// Called with an empty slice this is the "clear" operation and is
    /// idempotent.
    pub fn overwrite(&mut self, bytes: &[u8]) -> Result<()> {
        let path = self.owned_path();
        let file = self.file.as_file_mut();

        file.set_len(0)
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to truncate datum", e))?;
        if bytes.is_empty() {
            return Ok(());
        }
        file.seek(SeekFrom::Start(0))
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to rewind datum", e))?;
        file.write_all(bytes)
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to write datum", e))?;
        Ok(())
    }

    /// Reads the full current content into a buffer.
    pub fn read(&mut self) -> Result<Vec<u8>> {
        let path = self.owned_path();
        let file = self.file.as_file_mut();

        file.seek(SeekFrom::Start(0))
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to rewind datum", e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to read datum", e))?;
        Ok(buf)
    }

    /// Streams this Datum's content into `dest` in bounded-size chunks.
    ///
    /// Neither side is assumed to fit in memory at once. The destination is
    /// truncated first.
    pub fn copy_into(&mut self, dest: &mut Datum, buffer_size: usize) -> Result<()> {
        dest.overwrite(&[])?;

        let src_path = self.owned_path();
        let dst_path = dest.owned_path();
        let src = self.file.as_file_mut();
        let dst = dest.file.as_file_mut();

        src.seek(SeekFrom::Start(0)).map_err(|e| {
            SessionError::scratch_with_source(&src_path, "failed to rewind datum", e)
        })?;
        dst.seek(SeekFrom::Start(0)).map_err(|e| {
            SessionError::scratch_with_source(&dst_path, "failed to rewind datum", e)
        })?;

        let mut buf = vec![0u8; buffer_size.max(1)];
        loop {
            let n = src.read(&mut buf).map_err(|e| {
                SessionError::scratch_with_source(&src_path, "failed to read datum", e)
            })?;
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n]).map_err(|e| {
                SessionError::scratch_with_source(&dst_path, "failed to write datum", e)
            })?;
        }
        Ok(())
    }

    /// Rewinds the backing file and returns a reader over its content.
    pub(crate) fn reader(&mut self) -> Result<&mut std::fs::File> {
        let path = self.owned_path();
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))
            .map_err(|e| SessionError::scratch_with_source(&path, "failed to rewind datum", e))?;
        Ok(file)
    }
}

impl std::fmt::Debug for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datum")
            .field("path", &self.file.path())
            .field("size", &self.size())
            .finish()
    }
}
