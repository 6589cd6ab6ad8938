//! `new-bundle` command: create an empty bundle.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::Result;
use contents_tree::{ContentModel, GetOptions};

/// Creates bundle `name` at `version` under `source` and returns its model.
///
/// The new bundle holds only the configured manifest file.
///
/// # Errors
///
/// Returns an error if the bundle already exists, a segment is invalid, or
/// the library fails.
pub fn create(tree: &DirTree, source: &str, name: &str, version: &str) -> Result<ContentModel> {
    let handle = tree.library().create_bundle(source, name, version)?;
    tracing::info!("Created bundle {}", handle.key);
    Ok(tree.get(handle.key.as_str(), GetOptions::default())?)
}

/// Runs the `new-bundle` command.
///
/// # Errors
///
/// Returns an error if creation or formatting fails.
pub fn run(
    tree: &DirTree,
    source: &str,
    name: &str,
    version: &str,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let model = create(tree, source, name, version)?;
    println!("{}", format_output(&model, output_format)?);
    Ok(ExitCode::SUCCESS)
}
