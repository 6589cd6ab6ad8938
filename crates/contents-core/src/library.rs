//! Library adapter capability traits.
//!
//! The content tree never talks to a concrete database. It consumes the
//! [`Library`] trait, which hands out request-scoped [`LibrarySession`]s.
//! A session is opened per operation, used for lookups and staged writes,
//! and either committed or dropped. Dropping a session without calling
//! [`LibrarySession::commit`] discards its staged changes on stores that
//! support transactions.
//!
//! # Examples
//!
//! ```no_run
//! use contents_core::library::{Library, LibrarySession};
//! use contents_core::{BundleKey, Result};
//!
//! fn manifest_size(library: &impl Library) -> Result<Option<u64>> {
//!     let mut session = library.open()?;
//!     let key = BundleKey::new("example.com", "test-0.0.1")?;
//!     let bundle = session.resolve_bundle(&key)?;
//!     let file = session.resolve_file(&bundle, "bundle.yaml")?;
//!     Ok(file.record.size)
//! }
//! ```

use crate::error::Result;
use crate::types::{BundleKey, FileClass, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a bundle returned by a library session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleHandle {
    /// Stable `source/name-version` key the bundle was resolved by
    pub key: BundleKey,
    /// Opaque versioned identifier assigned by the library
    pub vid: Uuid,
    /// Bundle name without version
    pub name: String,
    /// Bundle version string
    pub version: String,
    /// Creation time of the bundle
    pub created: DateTime<Utc>,
}

impl BundleHandle {
    /// Returns the source segment of the bundle key.
    #[must_use]
    pub fn source(&self) -> &str {
        self.key.source()
    }

    /// Returns the versioned display name (`name-version`).
    #[must_use]
    pub fn vname(&self) -> &str {
        self.key.bundle()
    }
}

/// Metadata record of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque record identity, preserved across renames
    pub id: RecordId,
    /// File name within the bundle
    pub name: String,
    /// Storage class of the file
    pub class: FileClass,
    /// Mime type of the stored content
    pub mime_type: String,
    /// Stored content size in bytes, `None` if nothing was ever written
    pub size: Option<u64>,
    /// Time of the last content write
    pub modified: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Creates an empty record that has never been written.
    #[must_use]
    pub fn new(name: impl Into<String>, class: FileClass, mime_type: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.into(),
            class,
            mime_type: mime_type.into(),
            size: None,
            modified: None,
        }
    }

    /// Returns `true` if content of non-zero size was written.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.size.is_some_and(|size| size > 0)
    }
}

/// Handle to a file returned by a library session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// Key of the owning bundle
    pub bundle: BundleKey,
    /// Metadata record of the file
    pub record: FileRecord,
}

impl FileHandle {
    /// Returns the file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns the normalized content path of the file.
    #[must_use]
    pub fn path(&self) -> String {
        self.bundle.file_path(&self.record.name)
    }
}

/// Factory of request-scoped library sessions.
///
/// Implementations must be `Send + Sync` so that one library can serve
/// concurrent requests, each with its own session.
pub trait Library: Send + Sync {
    /// Session type handed out by this library.
    type Session: LibrarySession;

    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::UpstreamFailure`](crate::ContentsError::UpstreamFailure)
    /// if the store cannot be reached.
    fn open(&self) -> Result<Self::Session>;
}

/// Capability surface of an open library session.
///
/// Lookups report absence as [`ContentsError::NotFound`](crate::ContentsError::NotFound);
/// any other store failure is an
/// [`UpstreamFailure`](crate::ContentsError::UpstreamFailure).
#[allow(clippy::missing_errors_doc)]
pub trait LibrarySession {
    /// Resolves a bundle by its compound key.
    fn resolve_bundle(&mut self, key: &BundleKey) -> Result<BundleHandle>;

    /// Lists all bundles in the library.
    fn list_bundles(&mut self) -> Result<Vec<BundleHandle>>;

    /// Resolves a file of a bundle by name.
    fn resolve_file(&mut self, bundle: &BundleHandle, name: &str) -> Result<FileHandle>;

    /// Creates an empty file record in a bundle.
    ///
    /// Fails with [`ContentsError::Conflict`](crate::ContentsError::Conflict)
    /// if the name is taken.
    fn create_file(
        &mut self,
        bundle: &BundleHandle,
        name: &str,
        class: FileClass,
        mime_type: &str,
    ) -> Result<FileHandle>;

    /// Lists the file records of a bundle.
    fn list_files(&mut self, bundle: &BundleHandle) -> Result<Vec<FileHandle>>;

    /// Reads the stored content of a file.
    fn read_content(&mut self, file: &FileHandle) -> Result<Vec<u8>>;

    /// Replaces the stored content of a file and returns the updated handle.
    fn write_content(
        &mut self,
        file: &FileHandle,
        content: &[u8],
        mime_type: &str,
    ) -> Result<FileHandle>;

    /// Removes the stored content of a file, keeping its record.
    fn remove_content(&mut self, file: &FileHandle) -> Result<()>;

    /// Removes the metadata record of a file.
    fn remove_record(&mut self, file: &FileHandle) -> Result<()>;

    /// Changes the stored name of a file, keeping its identity and content.
    fn rename_record(&mut self, file: &FileHandle, new_name: &str) -> Result<FileHandle>;

    /// Flushes staged changes to the store.
    fn commit(&mut self) -> Result<()>;
}
