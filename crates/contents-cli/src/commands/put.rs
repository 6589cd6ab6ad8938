//! `put` command: upload a local file into a bundle.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::ValueEnum;
use contents_core::ContentsError;
use contents_core::path::is_notebook_name;
use contents_tree::{ContentModel, SaveRequest};
use std::fs;
use std::path::Path;

/// Declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PutKind {
    /// Plain file, stored as text when UTF-8 and as binary otherwise
    File,
    /// Notebook document in nbformat JSON
    Notebook,
}

/// Builds the save request for `bytes`.
///
/// Without an explicit kind, names carrying the notebook extension are
/// uploaded as notebooks.
///
/// # Errors
///
/// Returns [`ContentsError::InvalidNotebook`] if a notebook upload is not
/// valid JSON.
pub fn request_for(
    bytes: Vec<u8>,
    name: &str,
    kind: Option<PutKind>,
    notebook_extension: &str,
) -> Result<SaveRequest> {
    let kind = kind.unwrap_or(if is_notebook_name(name, notebook_extension) {
        PutKind::Notebook
    } else {
        PutKind::File
    });

    match kind {
        PutKind::Notebook => {
            let value = serde_json::from_slice(&bytes).map_err(|e| ContentsError::InvalidNotebook {
                message: format!("not valid JSON: {e}"),
            })?;
            Ok(SaveRequest::notebook(value))
        }
        PutKind::File => Ok(match String::from_utf8(bytes) {
            Ok(text) => SaveRequest::text(text),
            Err(e) => SaveRequest::base64(STANDARD.encode(e.into_bytes())),
        }),
    }
}

/// Uploads the local file `from` to `path`.
///
/// # Errors
///
/// Returns an error if the local file cannot be read or the save fails.
pub fn upload(tree: &DirTree, path: &str, from: &Path, kind: Option<PutKind>) -> Result<ContentModel> {
    let bytes = fs::read(from).with_context(|| format!("failed to read {}", from.display()))?;
    tracing::debug!("Uploading {} bytes from {}", bytes.len(), from.display());

    let request = request_for(bytes, path, kind, &tree.config().notebook_extension)?;
    Ok(tree.save(request, path)?)
}

/// Runs the `put` command.
///
/// # Errors
///
/// Returns an error if the upload or formatting fails.
pub fn run(
    tree: &DirTree,
    path: &str,
    from: &Path,
    kind: Option<PutKind>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let model = upload(tree, path, from, kind)?;
    println!("{}", format_output(&model, output_format)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contents_core::{ContentFormat, ContentType};

    #[test]
    fn test_request_for_text() {
        let request = request_for(b"hello".to_vec(), "a.txt", None, ".ipynb").unwrap();
        assert_eq!(request, SaveRequest::text("hello"));
    }

    #[test]
    fn test_request_for_binary() {
        let request = request_for(vec![0xff, 0x00], "a.bin", None, ".ipynb").unwrap();
        assert_eq!(request.format, Some(ContentFormat::Base64));
        assert_eq!(request.content, Some(serde_json::Value::String("/wA=".to_string())));
    }

    #[test]
    fn test_request_for_notebook_by_extension() {
        let request = request_for(b"{\"cells\": []}".to_vec(), "a.ipynb", None, ".ipynb").unwrap();
        assert_eq!(request.kind, Some(ContentType::Notebook));
    }

    #[test]
    fn test_request_for_explicit_notebook_rejects_garbage() {
        let err = request_for(b"not json".to_vec(), "a.txt", Some(PutKind::Notebook), ".ipynb")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentsError>(),
            Some(ContentsError::InvalidNotebook { .. })
        ));
    }
}
