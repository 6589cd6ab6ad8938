//! Library side of the `contents` CLI.
//!
//! Exposes the commands, output formatters, and exit codes so they can be
//! tested without spawning the binary.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod formatters;

pub use actions::ConfigAction;
