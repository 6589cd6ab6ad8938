//! Utilities shared across CLI commands.

use anyhow::{Context, Result};
use contents_core::TreeConfig;
use contents_store::{DirLibrary, Manifest};
use contents_tree::ContentTree;
use std::path::Path;

/// Tree over a directory-backed library.
pub type DirTree = ContentTree<DirLibrary>;

/// Directory under the library root holding notebook trust data.
pub const TRUST_DIR: &str = ".trust";

/// Opens the library rooted at `root` and wraps it in a content tree.
///
/// The directory is created if missing. New bundles are seeded with the
/// manifest configured in `config`. Unless the configuration names another
/// trust data directory, notebook signatures are kept in [`TRUST_DIR`] under
/// the library root so they survive between runs.
///
/// # Errors
///
/// Returns an error if the library directory cannot be created.
///
/// # Examples
///
/// ```
/// use contents_cli::commands::common::open_tree;
/// use contents_core::TreeConfig;
///
/// let temp_dir = tempfile::TempDir::new()?;
/// let tree = open_tree(temp_dir.path(), TreeConfig::default())?;
/// assert!(tree.is_directory(""));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn open_tree(root: &Path, mut config: TreeConfig) -> Result<DirTree> {
    if config.trust.data_dir.is_none() {
        config.trust.data_dir = Some(root.join(TRUST_DIR));
    }
    let library = DirLibrary::new(root)
        .with_context(|| format!("failed to open library at {}", root.display()))?
        .with_manifest(Manifest::from_config(&config));
    tracing::debug!("Opened library at {}", root.display());
    Ok(ContentTree::new(library, config))
}
