//! The content tree façade.
//!
//! [`ContentTree`] presents a bundle library as a three-level tree of
//! sources, bundles, and files. Every operation classifies its path, opens
//! one library session, and commits it only when it mutates.

use crate::builders::{self, class_for};
use crate::checkpoints::{Checkpoints, NullCheckpoints};
use crate::hooks::{Hooks, SaveHook};
use crate::model::{ContentModel, GetOptions, SaveRequest};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use contents_core::path::{self, NodeRef};
use contents_core::{
    BundleKey, ContentFormat, ContentType, ContentsError, FileHandle, Library, LibrarySession,
    Result, TreeConfig,
};
use contents_notebook::NotebookCodec;
use serde_json::Value;
use std::sync::Arc;

/// Content tree over a bundle library.
///
/// # Examples
///
/// ```
/// use contents_core::TreeConfig;
/// use contents_store::MemoryLibrary;
/// use contents_tree::{ContentTree, GetOptions, SaveRequest};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let library = MemoryLibrary::new();
/// library.create_bundle("example.com", "test", "0.0.1")?;
/// let tree = ContentTree::new(library, TreeConfig::default());
///
/// tree.save(SaveRequest::text("hello"), "example.com/test-0.0.1/notes.txt")?;
/// let model = tree.get("example.com/test-0.0.1/notes.txt", GetOptions::default())?;
/// assert_eq!(model.text(), Some("hello"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ContentTree<L> {
    library: L,
    config: TreeConfig,
    codec: NotebookCodec,
    checkpoints: Arc<dyn Checkpoints>,
    hooks: Hooks,
}

impl<L: Library> ContentTree<L> {
    /// Creates a tree over `library`.
    ///
    /// Notebooks are signed by a notary built from the trust settings of
    /// `config`; checkpoints are not stored.
    #[must_use]
    pub fn new(library: L, config: TreeConfig) -> Self {
        let codec = NotebookCodec::from_config(&config.trust);
        Self {
            library,
            config,
            codec,
            checkpoints: Arc::new(NullCheckpoints),
            hooks: Hooks::default(),
        }
    }

    /// Replaces the notebook codec.
    #[must_use]
    pub fn with_codec(mut self, codec: NotebookCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the checkpoint store.
    #[must_use]
    pub fn with_checkpoints(mut self, checkpoints: Arc<dyn Checkpoints>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    /// Registers a save hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn SaveHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Returns the underlying library.
    #[must_use]
    pub const fn library(&self) -> &L {
        &self.library
    }

    /// Returns the tree configuration.
    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns the notebook codec.
    #[must_use]
    pub const fn codec(&self) -> &NotebookCodec {
        &self.codec
    }

    /// Returns the checkpoint store.
    #[must_use]
    pub fn checkpoints(&self) -> &dyn Checkpoints {
        self.checkpoints.as_ref()
    }

    /// Classifies a path with the configured notebook extension.
    #[must_use]
    pub fn classify(&self, path: &str) -> NodeRef {
        path::classify(path, &self.config.notebook_extension)
    }

    /// Returns `true` if `path` names an existing file.
    ///
    /// Structural paths and unparseable paths never exist as files.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::UpstreamFailure`] if the library fails;
    /// absence is reported as `Ok(false)`.
    pub fn exists(&self, path: &str) -> Result<bool> {
        let node = self.classify(path);
        let Some((key, name)) = node.file_keys() else {
            return Ok(false);
        };

        let mut session = self.library.open()?;
        match resolve(&mut session, key, name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Returns `true` for root, source, and bundle paths.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        self.classify(path).is_directory()
    }

    /// Returns `false`: the tree hides nothing.
    #[must_use]
    pub const fn is_hidden(&self, _path: &str) -> bool {
        false
    }

    /// Returns the model of the node at `path`.
    ///
    /// Files are rendered as notebooks when a notebook is requested or the
    /// name carries the notebook extension.
    ///
    /// # Errors
    ///
    /// - [`ContentsError::NotFound`] if the path is unparseable or the
    ///   bundle or file does not exist
    /// - [`ContentsError::BadType`] if a directory is requested for a file,
    ///   or the content cannot be rendered in the requested format
    /// - [`ContentsError::CorruptDocument`] if a stored notebook cannot be
    ///   decoded
    /// - [`ContentsError::InvalidNotebook`] if a stored notebook decodes but
    ///   fails validation
    /// - [`ContentsError::UpstreamFailure`] if the library fails
    pub fn get(&self, path: &str, options: GetOptions) -> Result<ContentModel> {
        let normalized = path::normalize(path);
        let node = self.classify(normalized);
        let now = Utc::now();

        match node {
            NodeRef::NotFound => Err(not_found(normalized)),
            NodeRef::Root => {
                let mut session = self.library.open()?;
                let bundles = session.list_bundles()?;
                Ok(builders::root_model(&bundles, options.content, now))
            }
            NodeRef::Source { source } => {
                let mut session = self.library.open()?;
                let bundles = session.list_bundles()?;
                Ok(builders::source_model(&source, &bundles, options.content, now))
            }
            NodeRef::Bundle { key } => {
                let mut session = self.library.open()?;
                let bundle = session.resolve_bundle(&key)?;
                let files = if options.content {
                    Some(session.list_files(&bundle)?)
                } else {
                    None
                };
                tracing::debug!("Resolved bundle {key}");
                Ok(builders::bundle_model(&bundle, files.as_deref(), now))
            }
            NodeRef::File { key, name } | NodeRef::Notebook { key, name } => {
                if options.kind == Some(ContentType::Directory) {
                    return Err(ContentsError::BadType {
                        path: normalized.to_string(),
                        reason: "is not a directory".to_string(),
                    });
                }
                let as_notebook = options.kind == Some(ContentType::Notebook)
                    || path::is_notebook_name(&name, &self.config.notebook_extension);

                let mut session = self.library.open()?;
                let file = resolve(&mut session, &key, &name)?;
                tracing::debug!("Resolved file {}", file.path());

                if as_notebook {
                    let notebook = if options.content {
                        let bytes = session.read_content(&file)?;
                        Some(self.codec.read(&bytes, normalized)?)
                    } else {
                        None
                    };
                    Ok(builders::notebook_model(&file, notebook, now))
                } else {
                    let content = if options.content {
                        let bytes = session.read_content(&file)?;
                        Some(builders::file_content(bytes, options.format, normalized)?)
                    } else {
                        None
                    };
                    Ok(builders::file_model(&file, content, now))
                }
            }
        }
    }

    /// Saves a model at `path` and returns the saved model without content.
    ///
    /// The file record is created if it does not exist. A record that has
    /// never held content is first written with an empty payload of its
    /// class, then overwritten with the submitted content.
    ///
    /// Names carrying the notebook extension are saved through the notebook
    /// codec even when `type` is `file`, so that every stored `.ipynb` can be
    /// read back as a notebook. Text that is not notebook JSON is rejected
    /// for such names.
    ///
    /// # Errors
    ///
    /// - [`ContentsError::MissingField`] if `type` or `content` is missing
    /// - [`ContentsError::BadType`] if a directory is saved or the path is
    ///   structural, or the content does not match its format
    /// - [`ContentsError::NotFound`] if the bundle does not exist
    /// - [`ContentsError::InvalidNotebook`] if notebook content is invalid
    /// - [`ContentsError::UpstreamFailure`] if the library fails
    /// - any error returned by a pre-save hook
    pub fn save(&self, request: SaveRequest, path: &str) -> Result<ContentModel> {
        let normalized = path::normalize(path);
        let kind = request.kind.ok_or(ContentsError::MissingField { field: "type" })?;
        if kind != ContentType::Directory && request.content.is_none() {
            return Err(ContentsError::MissingField { field: "content" });
        }

        let node = self.classify(normalized);
        if kind == ContentType::Directory || node.is_directory() {
            return Err(ContentsError::BadType {
                path: normalized.to_string(),
                reason: "directories cannot be saved".to_string(),
            });
        }
        let Some((key, name)) = node.file_keys() else {
            return Err(not_found(normalized));
        };
        let as_notebook = kind == ContentType::Notebook
            || path::is_notebook_name(name, &self.config.notebook_extension);
        let stored_kind = if as_notebook {
            ContentType::Notebook
        } else {
            ContentType::File
        };

        let mut session = self.library.open()?;
        let bundle = session.resolve_bundle(key)?;
        let file = match session.resolve_file(&bundle, name) {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                let mime = self.default_mime(stored_kind, request.format);
                tracing::debug!("Creating record {name} in {key}");
                session.create_file(&bundle, name, class_for(stored_kind), mime)?
            }
            Err(e) => return Err(e),
        };

        self.hooks.run_pre_save(&request, normalized)?;

        let payload = self.encode_payload(as_notebook, &request, normalized)?;
        // Existing plain files keep the mime type they were created with.
        let mime = if !as_notebook && file.record.has_content() {
            file.record.mime_type.clone()
        } else {
            self.default_mime(stored_kind, request.format).to_string()
        };

        let file = if file.record.has_content() {
            file
        } else {
            let seed = if as_notebook {
                self.codec.empty()?
            } else {
                Vec::new()
            };
            session.write_content(&file, &seed, &mime)?
        };
        let file = session.write_content(&file, &payload, &mime)?;
        session.commit()?;
        tracing::info!("Saved {} ({} bytes)", file.path(), payload.len());

        if as_notebook && self.checkpoints.list(normalized)?.is_empty() {
            self.checkpoints.create(normalized)?;
        }

        let model = self.get(normalized, GetOptions::metadata().kind(stored_kind))?;
        self.hooks.run_post_save(&model, normalized);
        Ok(model)
    }

    /// Deletes the file at `path`.
    ///
    /// The content and the record are removed in one session. If removing
    /// the record or committing fails, the session is dropped uncommitted
    /// and the file keeps both its record and its content.
    ///
    /// # Errors
    ///
    /// - [`ContentsError::NotDeletable`] for root, source, and bundle paths
    /// - [`ContentsError::NotFound`] if the file does not exist
    /// - [`ContentsError::UpstreamFailure`] if the library fails
    pub fn delete(&self, path: &str) -> Result<()> {
        let normalized = path::normalize(path);
        let node = self.classify(normalized);
        if node.is_directory() {
            return Err(ContentsError::NotDeletable {
                path: normalized.to_string(),
            });
        }
        let Some((key, name)) = node.file_keys() else {
            return Err(not_found(normalized));
        };

        let mut session = self.library.open()?;
        let file = resolve(&mut session, key, name)?;

        let removed = session
            .remove_content(&file)
            .and_then(|()| session.remove_record(&file))
            .and_then(|()| session.commit());
        if let Err(e) = removed {
            tracing::warn!("Deleting {normalized} failed, nothing was removed: {e}");
            return Err(if e.is_upstream() {
                e
            } else {
                ContentsError::upstream("delete", e)
            });
        }

        if let Err(e) = self.checkpoints.delete_all(normalized) {
            tracing::warn!("Failed to delete checkpoints of {normalized}: {e}");
        }
        tracing::info!("Deleted {normalized}");
        Ok(())
    }

    /// Renames a file within its bundle.
    ///
    /// Only the stored name changes; record identity and content are kept.
    ///
    /// # Errors
    ///
    /// - [`ContentsError::BadType`] unless both paths name files in the same
    ///   bundle
    /// - [`ContentsError::NotFound`] if the old file does not exist
    /// - [`ContentsError::Conflict`] if a file already exists at `new_path`
    /// - [`ContentsError::UpstreamFailure`] if the library fails
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let old_normalized = path::normalize(old_path);
        let new_normalized = path::normalize(new_path);
        if old_normalized == new_normalized {
            return Ok(());
        }

        let old_node = self.classify(old_normalized);
        let new_node = self.classify(new_normalized);
        if old_node == NodeRef::NotFound {
            return Err(not_found(old_normalized));
        }
        let (Some((old_key, old_name)), Some((new_key, new_name))) =
            (old_node.file_keys(), new_node.file_keys())
        else {
            return Err(ContentsError::BadType {
                path: new_normalized.to_string(),
                reason: "only files can be renamed".to_string(),
            });
        };
        if old_key != new_key {
            return Err(ContentsError::BadType {
                path: new_normalized.to_string(),
                reason: format!("cannot move files out of bundle {old_key}"),
            });
        }

        let mut session = self.library.open()?;
        let bundle = session.resolve_bundle(old_key)?;
        let file = session.resolve_file(&bundle, old_name)?;
        match session.resolve_file(&bundle, new_name) {
            Ok(_) => {
                return Err(ContentsError::Conflict {
                    path: new_normalized.to_string(),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        session.rename_record(&file, new_name)?;
        self.checkpoints.rename_all(old_normalized, new_normalized)?;
        session.commit()?;
        tracing::info!("Renamed {old_normalized} to {new_normalized}");
        Ok(())
    }

    /// Returns the directory a kernel for the notebook at `path` starts in.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::TreeConfig;
    /// use contents_store::MemoryLibrary;
    /// use contents_tree::ContentTree;
    ///
    /// let tree = ContentTree::new(MemoryLibrary::new(), TreeConfig::default());
    /// assert_eq!(tree.kernel_path("/src/b-1/a.ipynb"), "src/b-1");
    /// assert_eq!(tree.kernel_path("a.ipynb"), "");
    /// ```
    #[must_use]
    pub fn kernel_path(&self, path: &str) -> String {
        path::kernel_path(path::normalize(path))
    }

    fn default_mime(&self, kind: ContentType, format: Option<ContentFormat>) -> &str {
        match (kind, format) {
            (ContentType::Notebook, _) => &self.config.notebook_mime_type,
            (_, Some(ContentFormat::Base64)) => &self.config.binary_mime_type,
            _ => &self.config.text_mime_type,
        }
    }

    fn encode_payload(&self, as_notebook: bool, request: &SaveRequest, path: &str) -> Result<Vec<u8>> {
        let content = request.content.clone().unwrap_or(Value::Null);
        if as_notebook {
            return self.codec.prepare(content, path);
        }

        let Value::String(text) = content else {
            return Err(ContentsError::BadType {
                path: path.to_string(),
                reason: "file content must be a string".to_string(),
            });
        };
        match request.format {
            Some(ContentFormat::Base64) => {
                STANDARD
                    .decode(text.as_bytes())
                    .map_err(|e| ContentsError::BadType {
                        path: path.to_string(),
                        reason: format!("invalid base64 content: {e}"),
                    })
            }
            Some(ContentFormat::Json) => Err(ContentsError::BadType {
                path: path.to_string(),
                reason: "plain files cannot be saved as json".to_string(),
            }),
            Some(ContentFormat::Text) | None => Ok(text.into_bytes()),
        }
    }
}

fn resolve<S: LibrarySession>(session: &mut S, key: &BundleKey, name: &str) -> Result<FileHandle> {
    let bundle = session.resolve_bundle(key)?;
    session.resolve_file(&bundle, name)
}

fn not_found(path: &str) -> ContentsError {
    ContentsError::NotFound {
        path: path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contents_store::MemoryLibrary;

    fn tree() -> ContentTree<MemoryLibrary> {
        let library = MemoryLibrary::new();
        library.create_bundle("example.com", "test", "0.0.1").unwrap();
        ContentTree::new(library, TreeConfig::default())
    }

    #[test]
    fn test_default_mime() {
        let tree = tree();
        assert_eq!(tree.default_mime(ContentType::File, None), "text/plain");
        assert_eq!(
            tree.default_mime(ContentType::File, Some(ContentFormat::Base64)),
            "application/octet-stream"
        );
        assert_eq!(
            tree.default_mime(ContentType::Notebook, Some(ContentFormat::Json)),
            "application/json"
        );
    }

    #[test]
    fn test_encode_payload_rejects_non_string_file_content() {
        let tree = tree();
        let request = SaveRequest {
            kind: Some(ContentType::File),
            format: None,
            content: Some(Value::Bool(true)),
        };
        let err = tree.encode_payload(false, &request, "p").unwrap_err();
        assert!(err.is_bad_type());
    }

    #[test]
    fn test_encode_payload_base64() {
        let tree = tree();
        let bytes = tree
            .encode_payload(false, &SaveRequest::base64("AAEC"), "p")
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 2]);

        let err = tree
            .encode_payload(false, &SaveRequest::base64("!!"), "p")
            .unwrap_err();
        assert!(err.is_bad_type());
    }

    #[test]
    fn test_is_hidden() {
        assert!(!tree().is_hidden("example.com/test-0.0.1/bundle.yaml"));
    }
}
