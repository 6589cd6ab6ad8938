//! `cat` command: print the content of a file or notebook.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use clap::ValueEnum;
use contents_core::{ContentFormat, ContentsError};
use contents_tree::{Content, ContentModel, GetOptions};

/// Requested encoding of plain file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    /// UTF-8 text; fails for binary files
    Text,
    /// Base64 of the raw bytes
    Base64,
}

impl From<Encoding> for ContentFormat {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Text => Self::Text,
            Encoding::Base64 => Self::Base64,
        }
    }
}

/// Reads the model of a file with its content.
///
/// # Errors
///
/// Returns [`ContentsError::BadType`] for directory paths, and any error of
/// [`ContentTree::get`](contents_tree::ContentTree::get).
pub fn read(tree: &DirTree, path: &str, encoding: Option<Encoding>) -> Result<ContentModel> {
    if tree.is_directory(path) {
        return Err(ContentsError::BadType {
            path: path.to_string(),
            reason: "is a directory".to_string(),
        }
        .into());
    }

    let mut options = GetOptions::default();
    if let Some(encoding) = encoding {
        options = options.format(encoding.into());
    }
    Ok(tree.get(path, options)?)
}

/// Renders the content of a model the way `cat` prints it.
///
/// Notebooks print as indented nbformat JSON, text prints verbatim, and
/// binary content prints as base64.
///
/// # Errors
///
/// Returns an error if the model has no content or the notebook cannot be
/// serialized.
pub fn render(model: &ContentModel) -> Result<String> {
    match &model.content {
        Some(Content::Notebook(notebook)) => {
            serde_json::to_string_pretty(notebook).context("failed to serialize notebook")
        }
        Some(Content::Text(text) | Content::Base64(text)) => Ok(text.clone()),
        Some(Content::Directory(_)) | None => {
            anyhow::bail!("no file content at '{}'", model.path)
        }
    }
}

/// Runs the `cat` command.
///
/// JSON output prints the full model; other formats print the raw content.
///
/// # Errors
///
/// Returns an error if the file cannot be read or rendered.
pub fn run(
    tree: &DirTree,
    path: &str,
    encoding: Option<Encoding>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let model = read(tree, path, encoding)?;
    let output = match output_format {
        OutputFormat::Json => format_output(&model, output_format)?,
        OutputFormat::Text | OutputFormat::Pretty => render(&model)?,
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}
