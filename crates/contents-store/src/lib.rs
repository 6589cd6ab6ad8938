//! Library stores for the bundle content tree.
//!
//! Two implementations of the [`Library`](contents_core::Library) adapter:
//!
//! - [`MemoryLibrary`]: snapshot sessions over an in-memory catalog, with
//!   fault injection for exercising partial failures
//! - [`DirLibrary`]: bundles kept on disk, with staged sessions, atomic
//!   metadata replacement, and Blake3 content checksums
//!
//! # Examples
//!
//! ```
//! use contents_core::{Library, LibrarySession};
//! use contents_store::DirLibrary;
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let library = DirLibrary::new(temp.path()).unwrap();
//! let bundle = library.create_bundle("example.com", "test", "0.0.1").unwrap();
//!
//! let mut session = library.open().unwrap();
//! assert_eq!(session.list_bundles().unwrap(), vec![bundle]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod catalog;
mod dir;
mod error;
mod memory;

pub mod checksum;

pub use catalog::Manifest;
pub use dir::{BUNDLE_FILE, DirLibrary, DirSession, FILES_DIR, LOCK_FILE, RECORDS_FILE};
pub use error::StoreError;
pub use memory::{FailPoint, MemoryLibrary, MemorySession};
