// src/scratch/mod.rs

//! File-backed scratch storage for session state.
//!
//! This module provides the Datum Store: an ordered collection of scratch
//! byte-containers, each backed by a uniquely named temporary file. Sessions
//! stage data here before handing it to the engine, and capture data the
//! engine writes out.
//!
//! A backing file exists for exactly as long as its [`Datum`] does. Content
//! may be truncated and rewritten any number of times; the file itself is
//! only removed when the Datum is dropped.

mod datum;
mod list;

pub use datum::Datum;
pub use list::DatumList;
