//! Core types, traits, and errors for the bundle content tree.
//!
//! This crate provides the foundational pieces shared by every other crate
//! in the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - The path classifier mapping `source/bundle/file` paths onto node kinds
//! - Strong domain types (`BundleKey`, `RecordId`, `ContentType`)
//! - The library adapter capability traits (`Library`, `LibrarySession`)
//! - The error hierarchy with HTTP-like status classes
//! - Tree configuration

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod types;

pub mod library;
pub mod path;

pub use config::{
    DEFAULT_MANIFEST_FILE, DEFAULT_NOTEBOOK_EXTENSION, TreeConfig, TreeConfigBuilder, TrustConfig,
};
pub use error::{ContentsError, Result};
pub use library::{BundleHandle, FileHandle, FileRecord, Library, LibrarySession};
pub use path::NodeRef;
pub use types::{BundleKey, ContentFormat, ContentType, FileClass, RecordId};
