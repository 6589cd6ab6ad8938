//! `rm` command: delete a file.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::Result;
use contents_core::path::normalize;
use serde::Serialize;

/// Result of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removed {
    /// Deleted path
    pub path: String,
}

/// Runs the `rm` command.
///
/// # Errors
///
/// Returns an error if the path is not a deletable file or the library fails.
pub fn run(tree: &DirTree, path: &str, output_format: OutputFormat) -> Result<ExitCode> {
    tree.delete(path)?;
    let removed = Removed {
        path: normalize(path).to_string(),
    };
    println!("{}", format_output(&removed, output_format)?);
    Ok(ExitCode::SUCCESS)
}
