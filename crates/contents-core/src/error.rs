//! Error types for the content tree.
//!
//! A single error hierarchy is shared by every crate in the workspace so that
//! the library stores, the notebook codec, and the tree façade all report
//! failures the same way. Each variant maps onto an HTTP-like status class
//! through [`ContentsError::status_code`].
//!
//! # Examples
//!
//! ```
//! use contents_core::{ContentsError, Result};
//!
//! fn lookup(path: &str) -> Result<()> {
//!     Err(ContentsError::NotFound {
//!         path: path.to_string(),
//!     })
//! }
//!
//! let err = lookup("src1/bundle1-1.0/missing.txt").unwrap_err();
//! assert!(err.is_not_found());
//! assert_eq!(err.status_code(), 404);
//! ```

use thiserror::Error;

/// Main error type for content tree operations.
#[derive(Error, Debug)]
pub enum ContentsError {
    /// Path, bundle, or file is absent.
    #[error("Not found: {path}")]
    NotFound {
        /// The path or key that could not be resolved
        path: String,
    },

    /// Caller-declared type does not match the resolved node type.
    #[error("Bad type for {path}: {reason}")]
    BadType {
        /// Path of the node
        path: String,
        /// Why the type does not fit
        reason: String,
    },

    /// Rename or save target collides with an existing file.
    #[error("File already exists: {path}")]
    Conflict {
        /// The colliding path
        path: String,
    },

    /// A stored payload could not be parsed.
    ///
    /// Raised when bytes read back from the library are not a readable
    /// notebook document. This is a fault of the stored data, not of the
    /// caller.
    #[error("Corrupt document: {reason}")]
    CorruptDocument {
        /// Description of the parse failure
        reason: String,
    },

    /// A notebook failed structural validation.
    #[error("Invalid notebook: {message}")]
    InvalidNotebook {
        /// Human-readable validation message
        message: String,
    },

    /// A library store call failed for reasons outside the tree's control.
    #[error("Library operation '{operation}' failed: {source}")]
    UpstreamFailure {
        /// Name of the failed store operation
        operation: String,
        /// Underlying error cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required field is missing from a save request.
    #[error("No {field} provided")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Structural nodes (root, source, bundle) cannot be deleted.
    #[error("Not deletable: {path}")]
    NotDeletable {
        /// The structural path
        path: String,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

impl ContentsError {
    /// Wraps an arbitrary store error as an [`ContentsError::UpstreamFailure`].
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::ContentsError;
    /// use std::io;
    ///
    /// let err = ContentsError::upstream("remove_record", io::Error::other("disk gone"));
    /// assert_eq!(err.status_code(), 500);
    /// assert!(err.to_string().contains("remove_record"));
    /// ```
    pub fn upstream(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::UpstreamFailure {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a type mismatch error.
    #[must_use]
    pub const fn is_bad_type(&self) -> bool {
        matches!(self, Self::BadType { .. })
    }

    /// Returns `true` if this is a conflict error.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is an upstream store failure.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamFailure { .. })
    }

    /// Returns `true` if the fault originates from caller input.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::ContentsError;
    ///
    /// let err = ContentsError::MissingField { field: "type" };
    /// assert!(err.is_client_error());
    ///
    /// let err = ContentsError::CorruptDocument { reason: "eof".into() };
    /// assert!(!err.is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::BadType { .. }
                | Self::Conflict { .. }
                | Self::InvalidNotebook { .. }
                | Self::MissingField { .. }
                | Self::NotDeletable { .. }
        )
    }

    /// Returns the HTTP-equivalent status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::BadType { .. }
            | Self::InvalidNotebook { .. }
            | Self::MissingField { .. }
            | Self::NotDeletable { .. } => 400,
            Self::CorruptDocument { .. } | Self::UpstreamFailure { .. } | Self::Config { .. } => {
                500
            }
        }
    }
}

/// Type alias for content tree results.
pub type Result<T> = std::result::Result<T, ContentsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_display() {
        let error = ContentsError::NotFound {
            path: "src1/bundle1-1.0".to_string(),
        };
        assert_eq!(error.to_string(), "Not found: src1/bundle1-1.0");
        assert!(error.is_not_found());
        assert!(error.is_client_error());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ContentsError::NotFound { path: "a".into() }, 404),
            (
                ContentsError::BadType {
                    path: "a/b/c".into(),
                    reason: "not a directory".into(),
                },
                400,
            ),
            (ContentsError::Conflict { path: "a/b/c".into() }, 409),
            (
                ContentsError::InvalidNotebook {
                    message: "bad".into(),
                },
                400,
            ),
            (
                ContentsError::CorruptDocument {
                    reason: "bad".into(),
                },
                500,
            ),
            (ContentsError::MissingField { field: "content" }, 400),
            (ContentsError::NotDeletable { path: "a".into() }, 400),
            (ContentsError::upstream("commit", io::Error::other("x")), 500),
        ];

        for (error, code) in cases {
            assert_eq!(error.status_code(), code, "{error}");
        }
    }

    #[test]
    fn test_upstream_keeps_source() {
        use std::error::Error as _;

        let error = ContentsError::upstream("read_content", io::Error::other("boom"));
        assert!(error.is_upstream());
        assert!(!error.is_client_error());
        assert_eq!(error.source().map(ToString::to_string).as_deref(), Some("boom"));
    }

    #[test]
    fn test_missing_field_display() {
        let error = ContentsError::MissingField { field: "type" };
        assert_eq!(error.to_string(), "No type provided");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ContentsError>();
        assert_sync::<ContentsError>();
    }
}
