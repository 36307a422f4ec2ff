// src/scratch/list.rs

//! The ordered Datum collection owned by one session.

use std::path::PathBuf;

use crate::config::ScratchConfig;
use crate::error::{Result, SessionError};

use super::datum::Datum;

/// Ordered sequence of [`Datum`] scratch containers.
///
/// A Datum's 0-based position is implicit in list order and is never stored
/// explicitly. The list exclusively owns every Datum; dropping the list
/// releases every backing file exactly once.
pub struct DatumList {
    datums: Vec<Datum>,
    config: ScratchConfig,
}

impl DatumList {
    /// Creates an empty list that allocates Datums per `config`.
    pub fn new(config: ScratchConfig) -> Self {
        Self {
            datums: Vec::new(),
            config,
        }
    }

    /// Number of Datums in the list.
    pub fn len(&self) -> usize {
        self.datums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datums.is_empty()
    }

    /// Appends a new Datum, optionally pre-filled with `initial` bytes.
    ///
    /// Returns the new Datum's position.
    ///
    /// # Errors
    ///
    /// Returns a scratch-allocation error if the backing file cannot be
    /// created or the initial bytes cannot be written. The list is left as it
    /// was before the call.
    pub fn create(&mut self, initial: Option<&[u8]>) -> Result<usize> {
        let mut datum = Datum::create(&self.config)?;
        if let Some(bytes) = initial {
            datum.overwrite(bytes)?;
        }
        self.datums.push(datum);
        Ok(self.datums.len() - 1)
    }

    /// Returns the Datum at `index`, or `None` past the end.
    ///
    /// Out-of-range lookup is a normal outcome, not an error.
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.datums.get(index)
    }

    /// Backing-file path of the Datum at `index`.
    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.datums.get(index).map(|d| d.path().to_path_buf())
    }

    /// Current content length of the Datum at `index`.
    ///
    /// Returns 0 for an out-of-range index or inaccessible backing storage
    /// (a soft zero, never an error).
    pub fn size_of(&self, index: usize) -> u64 {
        self.datums.get(index).map(|d| d.size()).unwrap_or(0)
    }

    /// Reads the full content of the Datum at `index`.
    ///
    /// Returns an empty buffer for a missing index.
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>> {
        match self.datums.get_mut(index) {
            Some(datum) => datum.read(),
            None => Ok(Vec::new()),
        }
    }

    /// Truncates the Datum at `index` to empty, then writes `bytes` if
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Fails only if `index` does not exist.
    pub fn overwrite(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        match self.datums.get_mut(index) {
            Some(datum) => datum.overwrite(bytes),
            None => Err(SessionError::snapshot(format!(
                "no datum at index {index} (list has {})",
                self.datums.len()
            ))),
        }
    }

    /// Produces an entirely new list whose every Datum is an independent
    /// byte-for-byte copy of the source content.
    ///
    /// Copies stream through a bounded buffer; no Datum is assumed to fit in
    /// memory at once. On any mid-copy failure the partially built list is
    /// dropped (its backing files removed) and the source is left untouched.
    pub fn duplicate(&mut self) -> Result<DatumList> {
        let mut copy = DatumList::new(self.config.clone());
        let buffer_size = self.config.buffer_size;

        for datum in &mut self.datums {
            let mut dup = Datum::create(&copy.config)?;
            datum.copy_into(&mut dup, buffer_size)?;
            copy.datums.push(dup);
        }
        Ok(copy)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Datum> {
        self.datums.get_mut(index)
    }
}

impl std::fmt::Debug for DatumList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatumList")
            .field("len", &self.datums.len())
            .finish()
    }
}
