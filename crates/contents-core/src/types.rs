//! Strong domain types for the content tree.
//!
//! Newtypes and small enums used across all crates: the bundle key that
//! addresses a bundle in the library, the record identifier of a stored
//! file, and the type/format vocabulary of content models.
//!
//! # Examples
//!
//! ```
//! use contents_core::{BundleKey, ContentType};
//!
//! let key = BundleKey::for_bundle("example.com", "test", "0.0.1").unwrap();
//! assert_eq!(key.as_str(), "example.com/test-0.0.1");
//! assert_eq!(key.source(), "example.com");
//! assert_eq!(key.bundle(), "test-0.0.1");
//!
//! assert_eq!(ContentType::Notebook.as_str(), "notebook");
//! ```

use crate::error::{ContentsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Compound `source/name-version` key of a bundle.
///
/// This is the stable, human-readable alias the library resolves bundles
/// by. It is distinct from the bundle's opaque versioned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BundleKey {
    key: String,
    split: usize,
}

impl BundleKey {
    /// Creates a key from a source segment and a bundle segment.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::NotFound`] if either segment is empty or
    /// contains a path separator; such a key can never resolve.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::BundleKey;
    ///
    /// let key = BundleKey::new("src1", "bundle1-1.0").unwrap();
    /// assert_eq!(key.to_string(), "src1/bundle1-1.0");
    ///
    /// assert!(BundleKey::new("", "bundle1-1.0").is_err());
    /// assert!(BundleKey::new("src1", "a/b").is_err());
    /// ```
    pub fn new(source: &str, bundle: &str) -> Result<Self> {
        if !is_segment(source) || !is_segment(bundle) {
            return Err(ContentsError::NotFound {
                path: format!("{source}/{bundle}"),
            });
        }
        Ok(Self {
            key: format!("{source}/{bundle}"),
            split: source.len(),
        })
    }

    /// Creates a key from a source, bundle name, and version.
    ///
    /// # Errors
    ///
    /// Returns an error if any part is empty or contains a separator.
    pub fn for_bundle(source: &str, name: &str, version: &str) -> Result<Self> {
        if name.is_empty() || version.is_empty() {
            return Err(ContentsError::NotFound {
                path: format!("{source}/{name}-{version}"),
            });
        }
        Self::new(source, &format!("{name}-{version}"))
    }

    /// Returns the full key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Returns the source segment.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.key[..self.split]
    }

    /// Returns the `name-version` bundle segment.
    #[must_use]
    pub fn bundle(&self) -> &str {
        &self.key[self.split + 1..]
    }

    /// Returns the path of a file inside this bundle.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::BundleKey;
    ///
    /// let key = BundleKey::new("src1", "bundle1-1.0").unwrap();
    /// assert_eq!(key.file_path("notes.txt"), "src1/bundle1-1.0/notes.txt");
    /// ```
    #[must_use]
    pub fn file_path(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.key)
    }
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for BundleKey {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_matches('/');
        match trimmed.split_once('/') {
            Some((source, bundle)) => Self::new(source, bundle),
            None => Err(ContentsError::NotFound {
                path: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for BundleKey {
    type Error = ContentsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BundleKey> for String {
    fn from(key: BundleKey) -> Self {
        key.key
    }
}

/// Opaque identifier of a stored file record.
///
/// Renaming a file changes its name but never its record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random record id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of a content model as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// A structural node (root, source, bundle)
    Directory,
    /// A plain file
    File,
    /// A notebook document
    Notebook,
}

impl ContentType {
    /// Returns the wire name of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
            Self::Notebook => "notebook",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "directory" => Ok(Self::Directory),
            "file" => Ok(Self::File),
            "notebook" => Ok(Self::Notebook),
            _ => Err(ContentsError::BadType {
                path: String::new(),
                reason: format!("unhandled contents type: '{s}'"),
            }),
        }
    }
}

/// Encoding of a content model's `content` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Structured JSON (directory listings, notebooks)
    Json,
    /// UTF-8 text
    Text,
    /// Base64-encoded bytes
    Base64,
}

impl ContentFormat {
    /// Returns the wire name of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Base64 => "base64",
        }
    }
}

impl FromStr for ContentFormat {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "base64" => Ok(Self::Base64),
            _ => Err(ContentsError::BadType {
                path: String::new(),
                reason: format!("unknown content format: '{s}'"),
            }),
        }
    }
}

/// Storage class of a file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    /// A notebook document
    Notebook,
    /// Any other file
    Plain,
}

impl FileClass {
    /// Returns the content type files of this class are presented as.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::Notebook => ContentType::Notebook,
            Self::Plain => ContentType::File,
        }
    }
}
