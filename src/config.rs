// src/config.rs

//! Configuration for the session layer.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SessionError};

// Top-level session-layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub scratch: ScratchConfig,
    pub engine: EngineConfig,
}

// Scratch storage configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Directory for Datum backing files. Empty means the process temp dir.
    pub scratch_dir: PathBuf,
    // Buffer size in bytes for streaming copies and snapshot writes.
    pub buffer_size: usize,
    // Filename prefix for Datum backing files.
    pub datum_prefix: String,
}

/// Engine command-construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-atom fields written by a trajectory dump.
    pub dump_fields: String,
    /// Per-atom fields ingested when replaying a trajectory buffer.
    pub replay_fields: String,
    /// Prefix for the engine-side variable names that reference Datum files.
    pub variable_prefix: String,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::new(),
            buffer_size: 64 * 1024, // 64 KB
            datum_prefix: "datum".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dump_fields: "id type x y z vx vy vz".to_string(),
            replay_fields: "x y z vx vy vz".to_string(),
            variable_prefix: "datum".to_string(),
        }
    }
}

impl ScratchConfig {
    /// Resolves the scratch directory, falling back to the process temp dir.
    pub fn resolve_scratch_dir(&self) -> PathBuf {
        if self.scratch_dir.as_os_str().is_empty() {
            std::env::temp_dir()
        } else {
            self.scratch_dir.clone()
        }
    }
}

impl FromStr for SessionConfig {
    type Err = SessionError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| SessionError::config_with_source("failed to parse TOML config", e))
    }
}

impl SessionConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::scratch_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `MDS_` and use underscores
    // to separate nested fields. For example:
    // - `MDS_SCRATCH_DIR` overrides `scratch.scratch_dir`
    // - `MDS_SCRATCH_BUFFER_SIZE` overrides `scratch.buffer_size`
    // - `MDS_ENGINE_DUMP_FIELDS` overrides `engine.dump_fields`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("MDS_SCRATCH_DIR") {
            self.scratch.scratch_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("MDS_SCRATCH_BUFFER_SIZE") {
            if let Ok(v) = val.parse() {
                self.scratch.buffer_size = v;
            }
        }
        if let Ok(val) = std::env::var("MDS_SCRATCH_DATUM_PREFIX") {
            self.scratch.datum_prefix = val;
        }
        if let Ok(val) = std::env::var("MDS_ENGINE_DUMP_FIELDS") {
            self.engine.dump_fields = val;
        }
        if let Ok(val) = std::env::var("MDS_ENGINE_REPLAY_FIELDS") {
            self.engine.replay_fields = val;
        }
        if let Ok(val) = std::env::var("MDS_ENGINE_VARIABLE_PREFIX") {
            self.engine.variable_prefix = val;
        }
        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scratch.buffer_size == 0 {
            return Err(SessionError::config(
                "scratch.buffer_size must be greater than 0",
            ));
        }
        if self.scratch.datum_prefix.is_empty() {
            return Err(SessionError::config(
                "scratch.datum_prefix must not be empty",
            ));
        }
        if self.engine.dump_fields.trim().is_empty() {
            return Err(SessionError::config(
                "engine.dump_fields must not be empty",
            ));
        }
        if self.engine.replay_fields.trim().is_empty() {
            return Err(SessionError::config(
                "engine.replay_fields must not be empty",
            ));
        }
        if self.engine.variable_prefix.is_empty()
            || !self
                .engine
                .variable_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SessionError::config(
                "engine.variable_prefix must be a non-empty alphanumeric identifier",
            ));
        }
        Ok(())
    }
}
