// src/wire/format.rs

//! Snapshot header layout.

use crate::error::{Result, SessionError};

/// Fixed header size: u64 steps + u32 initialized.
pub const HEADER_LEN: usize = 12;

/// Per-Datum length prefix size.
pub const LENGTH_PREFIX_LEN: usize = 8;

/// The fixed snapshot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Total integration steps elapsed in the captured session.
    pub steps: u64,
    /// Whether dynamics state (not just a script) is captured.
    pub initialized: bool,
}

impl SnapshotHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..8].copy_from_slice(&self.steps.to_le_bytes());
        out[8..].copy_from_slice(&u32::from(self.initialized).to_le_bytes());
        out
    }

    /// Decodes a header from the first [`HEADER_LEN`] bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if fewer than [`HEADER_LEN`] bytes
    /// are available.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SessionError::malformed(format!(
                "snapshot header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let steps = u64::from_le_bytes(bytes[..8].try_into().expect("sliced to 8 bytes"));
        let flag = u32::from_le_bytes(bytes[8..12].try_into().expect("sliced to 4 bytes"));
        Ok(Self {
            steps,
            initialized: flag != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let header = SnapshotHeader {
            steps: 0x0102030405060708,
            initialized: true,
        };
        let bytes = header.encode();

        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(&bytes[..8], &0x0102030405060708u64.to_le_bytes());
        assert_eq!(&bytes[8..], &1u32.to_le_bytes());
    }

    #[test]
    fn test_decode_roundtrip() {
        let header = SnapshotHeader {
            steps: 9_000_000,
            initialized: false,
        };
        let decoded = SnapshotHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_decode_nonzero_flag_is_initialized() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[8] = 7; // any nonzero u32 counts as initialized
        let header = SnapshotHeader::decode(&bytes).unwrap();
        assert!(header.initialized);
    }

    #[test]
    fn test_decode_short_input_fails() {
        let result = SnapshotHeader::decode(&[0u8; HEADER_LEN - 1]);
        assert!(matches!(
            result,
            Err(crate::error::SessionError::Malformed { .. })
        ));
    }
}
