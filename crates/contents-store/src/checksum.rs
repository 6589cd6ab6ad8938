//! Blake3 content checksums.
//!
//! Checksums are written as `"blake3:<hex>"` so the algorithm can be told
//! apart if it ever changes.

use crate::error::StoreError;
use std::path::Path;

/// Calculates the checksum of stored content.
///
/// # Examples
///
/// ```
/// use contents_store::checksum::calculate_checksum;
///
/// let checksum = calculate_checksum(b"hello");
/// assert!(checksum.starts_with("blake3:"));
/// assert_eq!(checksum.len(), 71);
/// ```
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}

/// Verifies content read from `path` against its recorded checksum.
///
/// # Errors
///
/// Returns [`StoreError::ChecksumMismatch`] if the checksums differ.
pub fn verify_checksum(data: &[u8], expected: &str, path: &Path) -> Result<(), StoreError> {
    let actual = calculate_checksum(data);
    if constant_time_eq(actual.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        tracing::warn!("Checksum mismatch for {}", path.display());
        Err(StoreError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Compares two byte strings without short-circuiting on the first
/// difference.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let diff = (0..len).fold(0u8, |acc, i| {
        acc | (a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0))
    });
    a.len() == b.len() && diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        assert_eq!(calculate_checksum(b"abc"), calculate_checksum(b"abc"));
        assert_ne!(calculate_checksum(b"abc"), calculate_checksum(b"abd"));
    }

    #[test]
    fn test_verify() {
        let checksum = calculate_checksum(b"content");
        assert!(verify_checksum(b"content", &checksum, Path::new("f")).is_ok());

        let err = verify_checksum(b"tampered", &checksum, Path::new("f")).unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"blake3:ab", b"blake3:ab"));
        assert!(!constant_time_eq(b"blake3:ab", b"blake3:ac"));
        assert!(!constant_time_eq(b"blake3:ab", b"blake3:abc"));
        assert!(constant_time_eq(b"", b""));
    }
}
