//! Command implementations for the `contents` CLI.
//!
//! Each command module exposes a function doing the work against a
//! [`ContentTree`](contents_tree::ContentTree) and returning a serializable
//! result, plus a `run` entry point that prints the result in the requested
//! output format.

pub mod cat;
pub mod common;
pub mod config;
pub mod ls;
pub mod mv;
pub mod new_bundle;
pub mod put;
pub mod rm;
