//! Action type definitions for CLI commands.

use clap::Subcommand;

/// Configuration actions.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Write a default configuration file if none exists
    Init,

    /// Show the effective configuration
    Show,
}
