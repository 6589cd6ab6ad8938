//! Store-level error types.
//!
//! Stores report failures to the tree as
//! [`ContentsError::UpstreamFailure`], naming the failed operation and
//! carrying a [`StoreError`] as the source.

use crate::memory::FailPoint;
use contents_core::{ContentsError, RecordId};
use std::path::PathBuf;
use thiserror::Error;

/// Low-level failure inside a library store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error while reading or writing store files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store metadata could not be serialized or parsed.
    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored content does not match its recorded checksum.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Content file that failed verification
        path: PathBuf,
        /// Checksum recorded in the bundle metadata
        expected: String,
        /// Checksum of the bytes on disk
        actual: String,
    },

    /// A record refers to content that is not in the store.
    #[error("Content of record {id} is missing")]
    MissingContent {
        /// Record whose content is missing
        id: RecordId,
    },

    /// A failure injected through [`MemoryLibrary::fail_on`](crate::MemoryLibrary::fail_on).
    #[error("Injected failure at {point}")]
    Injected {
        /// The operation that was made to fail
        point: FailPoint,
    },

    /// The shared catalog lock was poisoned by a panicking session.
    #[error("Catalog lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Converts store results into tree results tagged with an operation name.
pub(crate) trait UpstreamExt<T> {
    fn upstream(self, operation: &str) -> contents_core::Result<T>;
}

impl<T, E: Into<StoreError>> UpstreamExt<T> for std::result::Result<T, E> {
    fn upstream(self, operation: &str) -> contents_core::Result<T> {
        self.map_err(|e| ContentsError::upstream(operation, e.into()))
    }
}
