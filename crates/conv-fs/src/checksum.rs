//! SHA-256 checksum utilities
//!
//! One canonical format (`sha256:<hex>`) is used for backup metadata and for
//! verifying that files a conversion must not touch stayed byte-identical.

use sha2::{Digest, Sha256};

use crate::{Error, NormalizedPath, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
pub fn compute_file_checksum(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    let content = std::fs::read(&native).map_err(|e| Error::io(&native, e))?;
    Ok(compute_checksum(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_has_prefix() {
        assert!(compute_checksum(b"hello world").starts_with("sha256:"));
    }

    #[test]
    fn checksum_known_value() {
        assert_eq!(
            compute_checksum(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn file_checksum_matches_content_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("project.toml"));
        std::fs::write(path.to_native(), "version = 1\n").unwrap();

        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            compute_checksum(b"version = 1\n")
        );
    }

    #[test]
    fn missing_file_checksum_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("absent.toml"));
        assert!(compute_file_checksum(&path).is_err());
    }
}
