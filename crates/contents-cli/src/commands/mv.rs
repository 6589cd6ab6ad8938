//! `mv` command: rename a file within its bundle.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::Result;
use contents_core::path::normalize;
use serde::Serialize;

/// Result of a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renamed {
    /// Previous path
    pub from: String,
    /// New path
    pub to: String,
}

/// Runs the `mv` command.
///
/// # Errors
///
/// Returns an error if the rename is rejected or the library fails.
pub fn run(tree: &DirTree, from: &str, to: &str, output_format: OutputFormat) -> Result<ExitCode> {
    tree.rename(from, to)?;
    let renamed = Renamed {
        from: normalize(from).to_string(),
        to: normalize(to).to_string(),
    };
    println!("{}", format_output(&renamed, output_format)?);
    Ok(ExitCode::SUCCESS)
}
