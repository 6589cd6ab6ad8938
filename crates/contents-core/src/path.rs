//! Path classification for the three-level content namespace.
//!
//! Host paths look like `source/bundle-version/file`. The library has no
//! notion of directories, so every operation starts by classifying the path
//! into a [`NodeRef`] that names the node kind and carries the keys needed
//! to look it up.
//!
//! | depth | example                        | node                |
//! |-------|--------------------------------|---------------------|
//! | 0     | `""`                           | [`NodeRef::Root`]   |
//! | 1     | `example.com`                  | [`NodeRef::Source`] |
//! | 2     | `example.com/test-0.0.1`       | [`NodeRef::Bundle`] |
//! | 3+    | `example.com/test-0.0.1/a.txt` | [`NodeRef::File`] or [`NodeRef::Notebook`] |
//!
//! # Examples
//!
//! ```
//! use contents_core::path::{classify, NodeRef};
//!
//! assert_eq!(classify("/", ".ipynb"), NodeRef::Root);
//! assert!(matches!(classify("src1/bundle1-1.0/a.ipynb", ".ipynb"), NodeRef::Notebook { .. }));
//! assert_eq!(classify("src1//a", ".ipynb"), NodeRef::NotFound);
//! ```

use crate::types::BundleKey;

/// Path separator of the content namespace.
pub const SEPARATOR: char = '/';

/// Classified reference to a node of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// The root directory listing all sources
    Root,
    /// A source grouping of bundles
    Source {
        /// Source name
        source: String,
    },
    /// A bundle directory
    Bundle {
        /// Compound key of the bundle
        key: BundleKey,
    },
    /// A plain file inside a bundle
    File {
        /// Compound key of the owning bundle
        key: BundleKey,
        /// File name within the bundle
        name: String,
    },
    /// A notebook file inside a bundle
    Notebook {
        /// Compound key of the owning bundle
        key: BundleKey,
        /// File name within the bundle
        name: String,
    },
    /// A path that cannot name any node
    NotFound,
}

impl NodeRef {
    /// Returns the depth of the node, or `None` for unparseable paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::path::{classify, NodeRef};
    ///
    /// assert_eq!(classify("", ".ipynb").depth(), Some(0));
    /// assert_eq!(classify("a/b-1/c.txt", ".ipynb").depth(), Some(3));
    /// assert_eq!(NodeRef::NotFound.depth(), None);
    /// ```
    #[must_use]
    pub const fn depth(&self) -> Option<usize> {
        match self {
            Self::Root => Some(0),
            Self::Source { .. } => Some(1),
            Self::Bundle { .. } => Some(2),
            Self::File { .. } | Self::Notebook { .. } => Some(3),
            Self::NotFound => None,
        }
    }

    /// Returns `true` for root, source, and bundle nodes.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Root | Self::Source { .. } | Self::Bundle { .. })
    }

    /// Returns the bundle key and file name of a file or notebook node.
    #[must_use]
    pub fn file_keys(&self) -> Option<(&BundleKey, &str)> {
        match self {
            Self::File { key, name } | Self::Notebook { key, name } => Some((key, name)),
            _ => None,
        }
    }
}

/// Strips surrounding separators from a host path.
///
/// # Examples
///
/// ```
/// use contents_core::path::normalize;
///
/// assert_eq!(normalize("/src1/bundle1-1.0/"), "src1/bundle1-1.0");
/// assert_eq!(normalize("///"), "");
/// ```
#[must_use]
pub fn normalize(path: &str) -> &str {
    path.trim_matches(SEPARATOR)
}

/// Classifies a host path into a node reference.
///
/// Never fails: paths with empty internal segments classify as
/// [`NodeRef::NotFound`]. For paths deeper than three segments the bundle
/// key comes from the first two segments and the file name from the last
/// one.
#[must_use]
pub fn classify(path: &str, notebook_extension: &str) -> NodeRef {
    let path = normalize(path);
    if path.is_empty() {
        return NodeRef::Root;
    }

    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return NodeRef::NotFound;
    }

    match segments.as_slice() {
        [source] => NodeRef::Source {
            source: (*source).to_string(),
        },
        [source, bundle] => BundleKey::new(source, bundle)
            .map_or(NodeRef::NotFound, |key| NodeRef::Bundle { key }),
        [source, bundle, .., name] => {
            let Ok(key) = BundleKey::new(source, bundle) else {
                return NodeRef::NotFound;
            };
            let name = (*name).to_string();
            if is_notebook_name(&name, notebook_extension) {
                NodeRef::Notebook { key, name }
            } else {
                NodeRef::File { key, name }
            }
        }
        [] => NodeRef::Root,
    }
}

/// Returns `true` if the file name carries the notebook extension.
#[must_use]
pub fn is_notebook_name(name: &str, notebook_extension: &str) -> bool {
    !notebook_extension.is_empty() && name.ends_with(notebook_extension)
}

/// Returns the parent directory of a path, used as a kernel's working path.
///
/// # Examples
///
/// ```
/// use contents_core::path::kernel_path;
///
/// assert_eq!(kernel_path("src1/bundle1-1.0/a.ipynb"), "src1/bundle1-1.0");
/// assert_eq!(kernel_path("a.ipynb"), "");
/// ```
#[must_use]
pub fn kernel_path(path: &str) -> String {
    path.rsplit_once(SEPARATOR)
        .map_or_else(String::new, |(parent, _)| parent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXT: &str = ".ipynb";

    fn key(source: &str, bundle: &str) -> BundleKey {
        BundleKey::new(source, bundle).unwrap()
    }

    #[test]
    fn test_classify_root() {
        assert_eq!(classify("", EXT), NodeRef::Root);
        assert_eq!(classify("/", EXT), NodeRef::Root);
        assert_eq!(classify("//", EXT), NodeRef::Root);
    }

    #[test]
    fn test_classify_source() {
        assert_eq!(
            classify("/example.com/", EXT),
            NodeRef::Source {
                source: "example.com".to_string()
            }
        );
    }

    #[test]
    fn test_classify_bundle() {
        assert_eq!(
            classify("src1/bundle1-1.0", EXT),
            NodeRef::Bundle {
                key: key("src1", "bundle1-1.0")
            }
        );
    }

    #[test]
    fn test_classify_file_and_notebook() {
        assert_eq!(
            classify("src1/bundle1-1.0/notes.txt", EXT),
            NodeRef::File {
                key: key("src1", "bundle1-1.0"),
                name: "notes.txt".to_string()
            }
        );
        assert_eq!(
            classify("/src1/bundle1-1.0/analysis.ipynb", EXT),
            NodeRef::Notebook {
                key: key("src1", "bundle1-1.0"),
                name: "analysis.ipynb".to_string()
            }
        );
    }

    #[test]
    fn test_classify_deep_path_uses_first_two_and_last() {
        let node = classify("src1/bundle1-1.0/extra/deeper/notes.txt", EXT);
        assert_eq!(
            node,
            NodeRef::File {
                key: key("src1", "bundle1-1.0"),
                name: "notes.txt".to_string()
            }
        );
        assert_eq!(node.depth(), Some(3));
    }

    #[test]
    fn test_classify_empty_segment_is_not_found() {
        assert_eq!(classify("src1//notes.txt", EXT), NodeRef::NotFound);
        assert_eq!(classify("a/b//c", EXT), NodeRef::NotFound);
    }

    #[test]
    fn test_classify_custom_extension() {
        assert!(matches!(classify("a/b-1/c.nb", ".nb"), NodeRef::Notebook { .. }));
        assert!(matches!(classify("a/b-1/c.ipynb", ".nb"), NodeRef::File { .. }));
        assert!(matches!(classify("a/b-1/c.ipynb", ""), NodeRef::File { .. }));
    }

    #[test]
    fn test_is_directory_by_depth() {
        assert!(classify("", EXT).is_directory());
        assert!(classify("a", EXT).is_directory());
        assert!(classify("a/b-1", EXT).is_directory());
        assert!(!classify("a/b-1/c", EXT).is_directory());
        assert!(!NodeRef::NotFound.is_directory());
    }

    #[test]
    fn test_file_keys() {
        let node = classify("a/b-1/c.txt", EXT);
        let (k, name) = node.file_keys().unwrap();
        assert_eq!(k.as_str(), "a/b-1");
        assert_eq!(name, "c.txt");
        assert!(classify("a/b-1", EXT).file_keys().is_none());
    }

    #[test]
    fn test_kernel_path() {
        assert_eq!(kernel_path("a/b-1/c.ipynb"), "a/b-1");
        assert_eq!(kernel_path("a/b-1"), "a");
        assert_eq!(kernel_path("c.ipynb"), "");
        assert_eq!(kernel_path(""), "");
    }
}
