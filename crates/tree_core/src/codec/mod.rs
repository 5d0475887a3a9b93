//! Model serialization
//!
//! - [`binary`]: compact versioned layout stored on the device
//! - [`text`]: canonical JSON for review, diffing and tooling
//!
//! Both decoders run the shared validation before handing out a model and
//! report every problem as `CorruptModel`.

pub mod binary;
pub mod text;

use serde::{Deserialize, Serialize};

/// Version tag written by this codec. Any other version is rejected.
pub const FORMAT_VERSION: u16 = 1;

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Write class and feature names when the model has them
    pub include_names: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            include_names: true,
        }
    }
}

/// Encoding detected from the leading bytes of a model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Json,
}

impl Encoding {
    /// Binary artifacts start with the magic marker; anything else is
    /// treated as JSON and validated as such.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&binary::MAGIC) {
            Encoding::Binary
        } else {
            Encoding::Json
        }
    }
}

/// BLAKE3 hex digest of an encoded artifact, as written next to build outputs
pub fn artifact_hash_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(Encoding::sniff(b"ATRM\x01\x00"), Encoding::Binary);
        assert_eq!(Encoding::sniff(b"{\"format_version\":1}"), Encoding::Json);
        assert_eq!(Encoding::sniff(b""), Encoding::Json);
    }

    #[test]
    fn test_artifact_hash() {
        let a = artifact_hash_hex(b"model");
        assert_eq!(a.len(), 64);
        assert_eq!(a, artifact_hash_hex(b"model"));
        assert_ne!(a, artifact_hash_hex(b"model2"));
    }
}
