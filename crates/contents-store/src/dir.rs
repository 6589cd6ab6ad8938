//! Directory-backed library store.
//!
//! Provides [`DirLibrary`], which keeps bundles on disk, and its session
//! type [`DirSession`], which stages changes in memory until commit.
//!
//! Commits take an exclusive lock on the bundle, re-read `records.json`,
//! and merge only the records the session touched, so concurrent sessions
//! follow last-committed-wins per file record. Content files are written
//! before `records.json` and removed after it; a failed commit can leave an
//! orphaned content file but never a record without its content.

use crate::catalog::{BundleState, Manifest, StoredFile, new_bundle_handle};
use fs2::FileExt;
use crate::checksum::verify_checksum;
use crate::error::{StoreError, UpstreamExt};
use contents_core::{
    BundleHandle, BundleKey, ContentsError, FileClass, FileHandle, Library, LibrarySession,
    RecordId, Result,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bundle metadata file.
pub const BUNDLE_FILE: &str = "bundle.json";

/// File record list of a bundle.
pub const RECORDS_FILE: &str = "records.json";

/// Directory holding content files named by record id.
pub const FILES_DIR: &str = "files";

/// Lock file serializing commits to a bundle.
pub const LOCK_FILE: &str = ".commit.lock";

/// RAII guard removing a half-created bundle directory.
///
/// The directory is removed on drop unless [`commit`](Self::commit) is
/// called.
struct BundleDirGuard {
    path: PathBuf,
    cleanup: bool,
}

impl BundleDirGuard {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup: true,
        }
    }

    fn commit(mut self) {
        self.cleanup = false;
    }
}

/// Exclusive lock on a bundle's records, released on drop.
struct CommitLock {
    file: File,
    path: PathBuf,
}

impl CommitLock {
    fn acquire(bundle_dir: &Path) -> Result<Self> {
        let path = bundle_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .upstream("commit")?;
        file.lock_exclusive().upstream("commit")?;
        Ok(Self { file, path })
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for BundleDirGuard {
    fn drop(&mut self) {
        if self.cleanup {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                tracing::warn!(
                    "Failed to clean up bundle directory {}: {}",
                    self.path.display(),
                    e
                );
            } else {
                tracing::debug!("Cleaned up incomplete bundle directory: {}", self.path.display());
            }
        }
    }
}

/// Library store kept in a directory tree.
///
/// # Directory Structure
///
/// ```text
/// root/
/// └── example.com/
///     └── test-0.0.1/
///         ├── bundle.json
///         ├── records.json
///         └── files/
///             └── 6f1c...-record-id
/// ```
///
/// Content files are named by record id, so renaming a file only rewrites
/// `records.json`.
///
/// # Examples
///
/// ```no_run
/// use contents_core::{Library, LibrarySession};
/// use contents_store::DirLibrary;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let library = DirLibrary::new("./library")?;
/// let bundle = library.create_bundle("example.com", "test", "0.0.1")?;
///
/// let mut session = library.open()?;
/// let manifest = session.resolve_file(&bundle, "bundle.yaml")?;
/// println!("{} bytes", session.read_content(&manifest)?.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirLibrary {
    root: PathBuf,
    manifest: Manifest,
}

impl DirLibrary {
    /// Opens a library rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::UpstreamFailure`] if the directory cannot be
    /// created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).upstream("open")?;
            tracing::debug!("Created library directory: {}", root.display());
        }
        Ok(Self {
            root,
            manifest: Manifest::default(),
        })
    }

    /// Sets the manifest seeded into new bundles.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Returns the library root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a bundle on disk and seeds its manifest record.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::Conflict`] if the bundle directory exists,
    /// [`ContentsError::NotFound`] for an invalid key, and
    /// [`ContentsError::UpstreamFailure`] on I/O errors.
    pub fn create_bundle(&self, source: &str, name: &str, version: &str) -> Result<BundleHandle> {
        let handle = new_bundle_handle(source, name, version)?;
        let dir = bundle_dir(&self.root, &handle.key);

        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).upstream("create_bundle")?;
        }
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ContentsError::Conflict {
                    path: handle.key.to_string(),
                });
            }
            Err(e) => return Err(ContentsError::upstream("create_bundle", e)),
        }
        let guard = BundleDirGuard::new(dir.clone());

        let mut state = BundleState::new(handle.clone(), Vec::new());
        let manifest = state.create(
            &self.manifest.file_name,
            FileClass::Plain,
            &self.manifest.mime_type,
        )?;
        let content = Manifest::render(&handle);
        state.record_written(manifest.record.id, &content, &self.manifest.mime_type)?;

        fs::create_dir(dir.join(FILES_DIR)).upstream("create_bundle")?;
        write_atomic(&content_path(&dir, manifest.record.id), &content).upstream("create_bundle")?;
        write_json(&dir.join(RECORDS_FILE), &state.files).upstream("create_bundle")?;
        write_json(&dir.join(BUNDLE_FILE), &handle).upstream("create_bundle")?;

        guard.commit();
        tracing::info!("Created bundle {} at {}", handle.key, dir.display());
        Ok(handle)
    }
}

impl Library for DirLibrary {
    type Session = DirSession;

    fn open(&self) -> Result<DirSession> {
        if !self.root.is_dir() {
            return Err(ContentsError::upstream(
                "open",
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("library root {} is not a directory", self.root.display()),
                ),
            ));
        }
        Ok(DirSession {
            root: self.root.clone(),
            bundles: BTreeMap::new(),
            touched: BTreeSet::new(),
            staged: HashMap::new(),
        })
    }
}

#[derive(Debug)]
enum Staged {
    Write(Vec<u8>),
    Remove,
}

/// Session over a [`DirLibrary`].
///
/// Bundles are loaded on first use. Record changes and content writes are
/// held in memory until [`commit`](LibrarySession::commit); dropping the
/// session discards them.
#[derive(Debug)]
pub struct DirSession {
    root: PathBuf,
    bundles: BTreeMap<BundleKey, BundleState>,
    touched: BTreeSet<(BundleKey, RecordId)>,
    staged: HashMap<RecordId, (BundleKey, Staged)>,
}

impl DirSession {
    fn load(&mut self, key: &BundleKey) -> Result<&mut BundleState> {
        if !self.bundles.contains_key(key) {
            let dir = bundle_dir(&self.root, key);
            let bundle_file = dir.join(BUNDLE_FILE);
            if !bundle_file.is_file() {
                return Err(ContentsError::NotFound {
                    path: key.to_string(),
                });
            }
            let handle: BundleHandle = read_json(&bundle_file).upstream("resolve_bundle")?;
            let files: Vec<StoredFile> =
                read_json(&dir.join(RECORDS_FILE)).upstream("resolve_bundle")?;
            tracing::debug!("Loaded bundle {} ({} records)", key, files.len());
            self.bundles
                .insert(key.clone(), BundleState::new(handle, files));
        }
        self.bundles.get_mut(key).ok_or_else(|| ContentsError::NotFound {
            path: key.to_string(),
        })
    }

    fn touch(&mut self, file: &FileHandle) {
        self.touched.insert((file.bundle.clone(), file.record.id));
    }

    fn stage(&mut self, file: &FileHandle, change: Staged) {
        self.touch(file);
        self.staged
            .insert(file.record.id, (file.bundle.clone(), change));
    }

    /// Merges this session's changes to one bundle into the stored records.
    fn commit_bundle(
        &mut self,
        key: &BundleKey,
        touched: &[RecordId],
        staged: &HashMap<RecordId, (BundleKey, Staged)>,
    ) -> Result<()> {
        let Some(state) = self.bundles.get(key) else {
            return Ok(());
        };
        let dir = bundle_dir(&self.root, key);
        let _lock = CommitLock::acquire(&dir)?;

        let mut removals = Vec::new();
        for (id, (bundle, change)) in staged {
            if bundle != key {
                continue;
            }
            match change {
                Staged::Write(content) => {
                    fs::create_dir_all(dir.join(FILES_DIR)).upstream("commit")?;
                    write_atomic(&content_path(&dir, *id), content).upstream("commit")?;
                }
                Staged::Remove => removals.push(*id),
            }
        }

        let stored: Vec<StoredFile> = read_json(&dir.join(RECORDS_FILE)).upstream("commit")?;
        let mut merged = BundleState::new(state.handle.clone(), stored);
        for id in touched {
            let content_changed = staged.contains_key(id) || merged.find(*id).is_none();
            if let Some(displaced) = merged.apply(*id, state.find(*id), content_changed) {
                removals.push(displaced);
            }
        }
        write_json(&dir.join(RECORDS_FILE), &merged.files).upstream("commit")?;
        self.bundles.insert(key.clone(), merged);

        for id in removals {
            match fs::remove_file(content_path(&dir, id)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Left orphaned content of record {id} in {key}: {e}"),
            }
        }
        Ok(())
    }
}

impl LibrarySession for DirSession {
    fn resolve_bundle(&mut self, key: &BundleKey) -> Result<BundleHandle> {
        Ok(self.load(key)?.handle.clone())
    }

    fn list_bundles(&mut self) -> Result<Vec<BundleHandle>> {
        let mut handles = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(3).max_depth(3) {
            let entry = entry.map_err(io::Error::from).upstream("list_bundles")?;
            if entry.file_type().is_file() && entry.file_name() == BUNDLE_FILE {
                let handle: BundleHandle = read_json(entry.path()).upstream("list_bundles")?;
                handles.push(handle);
            }
        }
        handles.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(handles)
    }

    fn resolve_file(&mut self, bundle: &BundleHandle, name: &str) -> Result<FileHandle> {
        self.load(&bundle.key)?.resolve(name)
    }

    fn create_file(
        &mut self,
        bundle: &BundleHandle,
        name: &str,
        class: FileClass,
        mime_type: &str,
    ) -> Result<FileHandle> {
        let file = self.load(&bundle.key)?.create(name, class, mime_type)?;
        self.touch(&file);
        Ok(file)
    }

    fn list_files(&mut self, bundle: &BundleHandle) -> Result<Vec<FileHandle>> {
        Ok(self.load(&bundle.key)?.list())
    }

    fn read_content(&mut self, file: &FileHandle) -> Result<Vec<u8>> {
        let id = file.record.id;
        match self.staged.get(&id) {
            Some((_, Staged::Write(content))) => return Ok(content.clone()),
            Some((_, Staged::Remove)) => return Ok(Vec::new()),
            None => {}
        }

        let stored = self.load(&file.bundle)?.stored(id)?.clone();
        let path = content_path(&bundle_dir(&self.root, &file.bundle), id);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && stored.record.size.is_none() => {
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentsError::upstream(
                    "read_content",
                    StoreError::MissingContent { id },
                ));
            }
            Err(e) => return Err(ContentsError::upstream("read_content", e)),
        };

        if let Some(expected) = &stored.checksum {
            verify_checksum(&content, expected, &path).upstream("read_content")?;
        }
        Ok(content)
    }

    fn write_content(
        &mut self,
        file: &FileHandle,
        content: &[u8],
        mime_type: &str,
    ) -> Result<FileHandle> {
        let updated = self
            .load(&file.bundle)?
            .record_written(file.record.id, content, mime_type)?;
        self.stage(file, Staged::Write(content.to_vec()));
        Ok(updated)
    }

    fn remove_content(&mut self, file: &FileHandle) -> Result<()> {
        self.load(&file.bundle)?.record_cleared(file.record.id)?;
        self.stage(file, Staged::Remove);
        Ok(())
    }

    fn remove_record(&mut self, file: &FileHandle) -> Result<()> {
        self.load(&file.bundle)?.remove(file.record.id)?;
        self.stage(file, Staged::Remove);
        Ok(())
    }

    fn rename_record(&mut self, file: &FileHandle, new_name: &str) -> Result<FileHandle> {
        let renamed = self
            .load(&file.bundle)?
            .rename(file.record.id, new_name)?;
        self.touch(file);
        Ok(renamed)
    }

    fn commit(&mut self) -> Result<()> {
        let touched = std::mem::take(&mut self.touched);
        let staged = std::mem::take(&mut self.staged);

        let mut by_bundle: BTreeMap<BundleKey, Vec<RecordId>> = BTreeMap::new();
        for (key, id) in touched {
            by_bundle.entry(key).or_default().push(id);
        }
        for (key, ids) in &by_bundle {
            self.commit_bundle(key, ids, &staged)?;
        }

        if !by_bundle.is_empty() {
            tracing::info!(
                "Committed {} content changes across {} bundles",
                staged.len(),
                by_bundle.len()
            );
        }
        Ok(())
    }
}

fn bundle_dir(root: &Path, key: &BundleKey) -> PathBuf {
    root.join(key.source()).join(key.bundle())
}

fn content_path(bundle_dir: &Path, id: RecordId) -> PathBuf {
    bundle_dir.join(FILES_DIR).join(id.to_string())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> std::result::Result<T, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_json<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> std::result::Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Replaces `path` with `bytes` through a temporary file in the same
/// directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::result::Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
