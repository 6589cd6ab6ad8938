//! Content models exchanged with the host.
//!
//! A [`ContentModel`] describes one node of the tree. It serializes with
//! the host's field names (`type`, `last_modified`, `mimetype`) so it can
//! be handed to a notebook front end as-is.

use chrono::{DateTime, Utc};
use contents_core::{ContentFormat, ContentType};
use contents_notebook::Notebook;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model of a single content node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentModel {
    /// Last path segment
    pub name: String,
    /// Normalized path, without leading or trailing separators
    pub path: String,
    /// Node type
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// Encoding of `content`, `None` when content is absent
    pub format: Option<ContentFormat>,
    /// Mime type of a plain file
    pub mimetype: Option<String>,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Whether the node accepts writes
    pub writable: bool,
    /// Node content, present only when requested
    pub content: Option<Content>,
}

impl ContentModel {
    /// Returns `true` if this is a directory model.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == ContentType::Directory
    }

    /// Returns the child entries of a directory model with content.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match &self.content {
            Some(Content::Directory(children)) => Some(children),
            _ => None,
        }
    }

    /// Returns the notebook of a notebook model with content.
    #[must_use]
    pub fn notebook(&self) -> Option<&Notebook> {
        match &self.content {
            Some(Content::Notebook(notebook)) => Some(notebook),
            _ => None,
        }
    }

    /// Returns the textual content of a file model.
    ///
    /// Base64 content is returned in its encoded form.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(Content::Text(text) | Content::Base64(text)) => Some(text),
            _ => None,
        }
    }

    /// Drops the content and its format.
    #[must_use]
    pub fn without_content(mut self) -> Self {
        self.content = None;
        self.format = None;
        self
    }
}

/// Content payload of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// Child entries of a directory, each without content
    Directory(Vec<ContentModel>),
    /// A notebook document
    Notebook(Notebook),
    /// UTF-8 text of a plain file
    Text(String),
    /// Base64-encoded bytes of a plain file
    Base64(String),
}

/// Options of [`ContentTree::get`](crate::ContentTree::get).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    /// Include content in the model
    pub content: bool,
    /// Requested node type
    pub kind: Option<ContentType>,
    /// Requested encoding of plain file content
    pub format: Option<ContentFormat>,
}

impl GetOptions {
    /// Options requesting the model with content.
    #[must_use]
    pub const fn with_content() -> Self {
        Self {
            content: true,
            kind: None,
            format: None,
        }
    }

    /// Options requesting the model without content.
    #[must_use]
    pub const fn metadata() -> Self {
        Self {
            content: false,
            kind: None,
            format: None,
        }
    }

    /// Sets the requested node type.
    #[must_use]
    pub const fn kind(mut self, kind: ContentType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the requested content format.
    #[must_use]
    pub const fn format(mut self, format: ContentFormat) -> Self {
        self.format = Some(format);
        self
    }
}

impl Default for GetOptions {
    fn default() -> Self {
        Self::with_content()
    }
}

/// A model submitted by the host for saving.
///
/// Fields are optional because hosts may omit them; the tree reports a
/// missing `type` or `content` as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Declared node type
    #[serde(rename = "type", default)]
    pub kind: Option<ContentType>,
    /// Encoding of a plain file's `content`
    #[serde(default)]
    pub format: Option<ContentFormat>,
    /// Content as JSON: a notebook object or a string
    #[serde(default)]
    pub content: Option<Value>,
}

impl SaveRequest {
    /// Request saving a notebook given as JSON.
    #[must_use]
    pub const fn notebook(content: Value) -> Self {
        Self {
            kind: Some(ContentType::Notebook),
            format: Some(ContentFormat::Json),
            content: Some(content),
        }
    }

    /// Request saving a plain text file.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentType::File),
            format: Some(ContentFormat::Text),
            content: Some(Value::String(content.into())),
        }
    }

    /// Request saving a binary file given as base64.
    #[must_use]
    pub fn base64(encoded: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentType::File),
            format: Some(ContentFormat::Base64),
            content: Some(Value::String(encoded.into())),
        }
    }
}
