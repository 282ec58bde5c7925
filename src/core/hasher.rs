//! SHA-256 content addressing.
//!
//! Uploads are identified by the SHA-256 digest of their bytes. The digest
//! is the deduplication key for concurrent scan requests and the quarantine
//! file stem: two uploads with identical content are the same scan subject
//! even if they arrived through different upload sessions.

use crate::core::error::ScanError;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A lowercase-hex SHA-256 digest identifying file content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Wraps an already-computed digest.
    ///
    /// The input must be 64 hex characters; it is normalized to lowercase.
    pub fn from_hex(hex: impl AsRef<str>) -> Result<Self, ScanError> {
        let hex = hex.as_ref();
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ScanError::internal(format!(
                "not a SHA-256 hex digest: {hex:?}"
            )));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Computes the digest of a byte slice.
    pub fn hash_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Computes the digest of a file, streaming its contents.
    pub fn hash_file(path: &Path) -> Result<Self, ScanError> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;
        let mut reader = std::io::BufReader::new(file);
        Self::hash_reader(&mut reader)
    }

    /// Computes the digest from a synchronous reader in a single pass.
    pub fn hash_reader<R: Read>(reader: &mut R) -> Result<Self, ScanError> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Returns the digest as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_known_vector() {
        // SHA-256 of the empty string.
        let digest = Sha256Digest::hash_bytes(b"");
        assert_eq!(
            digest.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_deterministic() {
        let a = Sha256Digest::hash_bytes(b"upload content");
        let b = Sha256Digest::hash_bytes(b"upload content");
        assert_eq!(a, b);

        let c = Sha256Digest::hash_bytes(b"different content");
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_hex_validation() {
        let valid = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
        let digest = Sha256Digest::from_hex(valid).unwrap();
        assert_eq!(digest.as_str(), valid.to_ascii_lowercase());

        assert!(Sha256Digest::from_hex("abc123").is_err());
        assert!(Sha256Digest::from_hex("g".repeat(64)).is_err());
    }

    #[test]
    fn test_hash_file_missing() {
        let err = Sha256Digest::hash_file(Path::new("/nonexistent/file.bin")).unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { .. }));
    }
}
