//! `ls` command: list a directory node or describe a file.

use super::common::DirTree;
use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::format_output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use contents_core::ContentType;
use contents_tree::{ContentModel, GetOptions};
use serde::Serialize;

/// One listed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Last path segment
    pub name: String,
    /// Full content path
    pub path: String,
    /// Node type
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// Mime type of plain files
    pub mimetype: Option<String>,
    /// Whether the node accepts writes
    pub writable: bool,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

impl From<&ContentModel> for Entry {
    fn from(model: &ContentModel) -> Self {
        Self {
            name: model.name.clone(),
            path: model.path.clone(),
            kind: model.kind,
            mimetype: model.mimetype.clone(),
            writable: model.writable,
            last_modified: model.last_modified,
        }
    }
}

/// Lists the children of a directory node, or the file itself.
///
/// # Errors
///
/// Returns an error if the path does not exist or the library fails.
pub fn list(tree: &DirTree, path: &str) -> Result<Vec<Entry>> {
    let model = tree.get(path, GetOptions::default())?;
    Ok(model
        .children()
        .map_or_else(|| vec![Entry::from(&model)], |children| {
            children.iter().map(Entry::from).collect()
        }))
}

/// Runs the `ls` command.
///
/// Text output prints one path per line.
///
/// # Errors
///
/// Returns an error if listing or formatting fails.
pub fn run(tree: &DirTree, path: &str, output_format: OutputFormat) -> Result<ExitCode> {
    let entries = list(tree, path)?;
    tracing::debug!("Listed {} entries under '{path}'", entries.len());

    let output = match output_format {
        OutputFormat::Text => entries
            .iter()
            .map(|e| e.path.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        format => format_output(&entries, format)?,
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::open_tree;
    use contents_core::TreeConfig;
    use tempfile::TempDir;

    #[test]
    fn test_list_bundle_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let tree = open_tree(temp_dir.path(), TreeConfig::default()).unwrap();
        tree.library()
            .create_bundle("example.com", "test", "0.0.1")
            .unwrap();

        let root = list(&tree, "").unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].kind, ContentType::Directory);

        let files = list(&tree, "example.com/test-0.0.1").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "example.com/test-0.0.1/bundle.yaml");

        let file = list(&tree, "example.com/test-0.0.1/bundle.yaml").unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file[0].path, files[0].path);
        assert_eq!(file[0].mimetype.as_deref(), Some("application/x-yaml"));
    }
}
