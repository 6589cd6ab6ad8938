//! Content tree adapter for bundle libraries.
//!
//! Presents a library of versioned bundles as a navigable tree that a
//! notebook front end can browse and edit:
//!
//! ```text
//! ""                                   root, lists sources
//! example.com                          source, lists bundles
//! example.com/test-0.0.1               bundle, lists files
//! example.com/test-0.0.1/bundle.yaml   file
//! example.com/test-0.0.1/a.ipynb       notebook
//! ```
//!
//! # Architecture
//!
//! - [`ContentTree`]: the façade (`exists`, `get`, `save`, `delete`,
//!   `rename`, `kernel_path`)
//! - [`builders`]: pure model builders, one per node kind
//! - [`Checkpoints`]: checkpoint capability, stubbed by [`NullCheckpoints`]
//! - [`SaveHook`]: callbacks around saves

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod checkpoints;
mod hooks;
mod model;
mod tree;

pub mod builders;

pub use checkpoints::{CheckpointModel, Checkpoints, NULL_CHECKPOINT_ID, NullCheckpoints};
pub use hooks::{Hooks, SaveHook};
pub use model::{Content, ContentModel, GetOptions, SaveRequest};
pub use tree::ContentTree;
