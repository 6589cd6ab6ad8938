//! Notebook documents for the bundle content tree.
//!
//! Provides the nbformat 4 document model, a codec that reads both
//! nbformat 3 and 4 payloads, structural validation, and the trust
//! machinery that decides which code cells may display their outputs.
//!
//! # Examples
//!
//! ```
//! use contents_notebook::NotebookCodec;
//! use serde_json::json;
//!
//! let codec = NotebookCodec::default();
//! let bytes = codec
//!     .prepare(
//!         json!({"cells": [], "metadata": {}, "nbformat": 4, "nbformat_minor": 4}),
//!         "example.com/test-0.0.1/a.ipynb",
//!     )
//!     .unwrap();
//!
//! let nb = codec.read(&bytes, "example.com/test-0.0.1/a.ipynb").unwrap();
//! assert!(nb.cells.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod codec;
mod document;
mod trust;
mod validate;

pub use codec::{MIN_NBFORMAT, NotebookCodec, decode, encode, from_value, to_value};
pub use document::{Cell, CodeCell, NBFORMAT, NBFORMAT_MINOR, Notebook, TRUSTED_KEY, TextCell};
pub use trust::{
    Notary, SECRET_FILE, SIGNATURES_FILE, TrustNone, TrustPolicy, check_and_sign,
    mark_trusted_cells, strip_trust,
};
pub use validate::validate;
