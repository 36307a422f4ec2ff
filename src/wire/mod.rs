// src/wire/mod.rs

//! The snapshot wire protocol.
//!
//! The canonical persistent format is:
//!
//! ```text
//! +------------------------+
//! | steps (8 bytes)        |  <- u64 little-endian
//! +------------------------+
//! | initialized (4 bytes)  |  <- u32 little-endian, 0 or 1
//! +------------------------+
//! | datum length (8 bytes) |  <- u64 little-endian     \  repeated,
//! +------------------------+                            | one per Datum
//! | datum content          |  <- `length` raw bytes    /  in list order
//! +------------------------+
//! ```
//!
//! Only Datum content travels on the wire; backing-file names are
//! process-local and regenerated on parse.
//!
//! # The two-pass size-then-write protocol
//!
//! Emitting a snapshot is two calls: [`measure`] (which also forces a fresh
//! trajectory dump) followed immediately by [`write`]. The pair is not
//! atomic: any mutation of the session between the two calls produces an
//! under- or overrun output stream. This is an accepted design limitation of
//! the protocol, tolerable under the single-threaded calling convention; it
//! is not a correctness guarantee. Within [`write`] itself, a Datum that
//! shrinks mid-stream is zero-filled to its recorded length so the output
//! always matches what the caller was promised.
//!
//! Two older format generations can still be decoded (see [`legacy`]): the
//! restart-blob-only layout and the flagged layout without a step counter.
//! Both produce the same in-memory session model; encode support is the
//! canonical format only.

mod format;
pub mod legacy;
mod reader;
mod writer;

pub use format::{SnapshotHeader, HEADER_LEN, LENGTH_PREFIX_LEN};
pub use reader::parse;
pub use writer::{measure, write};
