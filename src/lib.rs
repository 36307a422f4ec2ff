// src/lib.rs

//! md-session - Serializable molecular-dynamics session handles
//!
//! This crate lets an embedding script runtime create, serialize, clone,
//! and tear down opaque simulation-engine sessions, persisting their state
//! as self-describing byte blobs and restoring them later. The engine
//! itself and the host runtime's object system are external collaborators,
//! reached only through the [`engine::Engine`] and [`host::HostRuntime`]
//! traits.
//!
//! Everything here is single-threaded, synchronous, and blocking: each
//! operation runs to completion on the caller's thread, and a session must
//! never be driven concurrently from multiple call sites.

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod runtime;
pub mod scratch;
pub mod session;
pub mod wire;

// Re-export commonly used types for convenience
pub use config::{EngineConfig, ScratchConfig, SessionConfig};
pub use engine::{Engine, EngineFactory, MockEngine, MockEngineFactory};
pub use error::{Result, SessionError};
pub use host::{HostRuntime, InProcessHost, SESSION_TYPE_TAG};
pub use runtime::SessionRuntime;
pub use scratch::{Datum, DatumList};
pub use session::{Session, MIN_DATUMS, SCRIPT_DATUM, TRAJECTORY_DATUM};
pub use wire::SnapshotHeader;
