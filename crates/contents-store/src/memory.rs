//! In-memory library store.
//!
//! [`MemoryLibrary`] keeps the whole catalog behind a mutex. Each session
//! works on its own snapshot of the catalog and [`commit`] merges the
//! records the session touched back into the shared catalog, so a session
//! that is dropped uncommitted changes nothing. Concurrent sessions follow
//! last-committed-wins per file record.
//!
//! The library also supports fault injection through
//! [`MemoryLibrary::fail_on`], which makes a chosen session operation fail
//! with an upstream error.
//!
//! [`commit`]: contents_core::LibrarySession::commit
//!
//! # Examples
//!
//! ```
//! use contents_core::{BundleKey, Library, LibrarySession};
//! use contents_store::MemoryLibrary;
//!
//! let library = MemoryLibrary::new();
//! library.create_bundle("example.com", "test", "0.0.1").unwrap();
//!
//! let mut session = library.open().unwrap();
//! let key: BundleKey = "example.com/test-0.0.1".parse().unwrap();
//! let bundle = session.resolve_bundle(&key).unwrap();
//! let files = session.list_files(&bundle).unwrap();
//! assert_eq!(files[0].name(), "bundle.yaml");
//! ```

use crate::catalog::{BundleState, Manifest, new_bundle_handle};
use crate::error::{StoreError, UpstreamExt};
use contents_core::{
    BundleHandle, BundleKey, ContentsError, FileClass, FileHandle, Library, LibrarySession,
    RecordId, Result,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Session operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// [`Library::open`]
    Open,
    /// [`LibrarySession::resolve_bundle`]
    ResolveBundle,
    /// [`LibrarySession::list_bundles`]
    ListBundles,
    /// [`LibrarySession::resolve_file`]
    ResolveFile,
    /// [`LibrarySession::create_file`]
    CreateFile,
    /// [`LibrarySession::list_files`]
    ListFiles,
    /// [`LibrarySession::read_content`]
    ReadContent,
    /// [`LibrarySession::write_content`]
    WriteContent,
    /// [`LibrarySession::remove_content`]
    RemoveContent,
    /// [`LibrarySession::remove_record`]
    RemoveRecord,
    /// [`LibrarySession::rename_record`]
    RenameRecord,
    /// [`LibrarySession::commit`]
    Commit,
}

impl FailPoint {
    /// Returns the operation name used in upstream errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::ResolveBundle => "resolve_bundle",
            Self::ListBundles => "list_bundles",
            Self::ResolveFile => "resolve_file",
            Self::CreateFile => "create_file",
            Self::ListFiles => "list_files",
            Self::ReadContent => "read_content",
            Self::WriteContent => "write_content",
            Self::RemoveContent => "remove_content",
            Self::RemoveRecord => "remove_record",
            Self::RenameRecord => "rename_record",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct Catalog {
    bundles: BTreeMap<BundleKey, BundleState>,
    contents: HashMap<RecordId, Vec<u8>>,
}

impl Catalog {
    fn bundle(&self, key: &BundleKey) -> Result<&BundleState> {
        self.bundles.get(key).ok_or_else(|| ContentsError::NotFound {
            path: key.to_string(),
        })
    }

    fn bundle_mut(&mut self, key: &BundleKey) -> Result<&mut BundleState> {
        self.bundles
            .get_mut(key)
            .ok_or_else(|| ContentsError::NotFound {
                path: key.to_string(),
            })
    }
}

#[derive(Debug, Default)]
struct Shared {
    catalog: Mutex<Catalog>,
    faults: Mutex<HashSet<FailPoint>>,
}

/// Library store held entirely in memory.
///
/// Clones share the same catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    shared: Arc<Shared>,
    manifest: Manifest,
}

impl MemoryLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the manifest seeded into new bundles.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Creates a bundle and seeds its manifest record.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::Conflict`] if the bundle already exists and
    /// [`ContentsError::NotFound`] if the parts do not form a valid key.
    pub fn create_bundle(&self, source: &str, name: &str, version: &str) -> Result<BundleHandle> {
        let handle = new_bundle_handle(source, name, version)?;
        let mut state = BundleState::new(handle.clone(), Vec::new());
        let manifest = state.create(
            &self.manifest.file_name,
            FileClass::Plain,
            &self.manifest.mime_type,
        )?;
        let content = Manifest::render(&handle);
        state.record_written(manifest.record.id, &content, &self.manifest.mime_type)?;

        let mut catalog = self.shared.catalog.lock().upstream("create_bundle")?;
        if catalog.bundles.contains_key(&handle.key) {
            return Err(ContentsError::Conflict {
                path: handle.key.to_string(),
            });
        }
        catalog.contents.insert(manifest.record.id, content);
        catalog.bundles.insert(handle.key.clone(), state);

        tracing::info!("Created bundle {}", handle.key);
        Ok(handle)
    }

    /// Makes every later call of `point` fail with an upstream error.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.insert(point);
        }
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.clear();
        }
    }

    fn check(shared: &Shared, point: FailPoint) -> Result<()> {
        let faults = shared.faults.lock().upstream(point.as_str())?;
        if faults.contains(&point) {
            tracing::debug!("Injecting failure at {point}");
            return Err(ContentsError::upstream(
                point.as_str(),
                StoreError::Injected { point },
            ));
        }
        Ok(())
    }
}

impl Library for MemoryLibrary {
    type Session = MemorySession;

    fn open(&self) -> Result<MemorySession> {
        Self::check(&self.shared, FailPoint::Open)?;
        let snapshot = self.shared.catalog.lock().upstream("open")?.clone();
        Ok(MemorySession {
            shared: Arc::clone(&self.shared),
            snapshot,
            touched: BTreeSet::new(),
            content_touched: HashSet::new(),
        })
    }
}

/// Session over a snapshot of a [`MemoryLibrary`].
#[derive(Debug)]
pub struct MemorySession {
    shared: Arc<Shared>,
    snapshot: Catalog,
    touched: BTreeSet<(BundleKey, RecordId)>,
    content_touched: HashSet<RecordId>,
}

impl MemorySession {
    fn check(&self, point: FailPoint) -> Result<()> {
        MemoryLibrary::check(&self.shared, point)
    }

    fn touch(&mut self, file: &FileHandle) {
        self.touched.insert((file.bundle.clone(), file.record.id));
    }

    fn touch_content(&mut self, file: &FileHandle) {
        self.touch(file);
        self.content_touched.insert(file.record.id);
    }
}

impl LibrarySession for MemorySession {
    fn resolve_bundle(&mut self, key: &BundleKey) -> Result<BundleHandle> {
        self.check(FailPoint::ResolveBundle)?;
        Ok(self.snapshot.bundle(key)?.handle.clone())
    }

    fn list_bundles(&mut self) -> Result<Vec<BundleHandle>> {
        self.check(FailPoint::ListBundles)?;
        Ok(self
            .snapshot
            .bundles
            .values()
            .map(|state| state.handle.clone())
            .collect())
    }

    fn resolve_file(&mut self, bundle: &BundleHandle, name: &str) -> Result<FileHandle> {
        self.check(FailPoint::ResolveFile)?;
        self.snapshot.bundle(&bundle.key)?.resolve(name)
    }

    fn create_file(
        &mut self,
        bundle: &BundleHandle,
        name: &str,
        class: FileClass,
        mime_type: &str,
    ) -> Result<FileHandle> {
        self.check(FailPoint::CreateFile)?;
        let file = self
            .snapshot
            .bundle_mut(&bundle.key)?
            .create(name, class, mime_type)?;
        self.touch_content(&file);
        Ok(file)
    }

    fn list_files(&mut self, bundle: &BundleHandle) -> Result<Vec<FileHandle>> {
        self.check(FailPoint::ListFiles)?;
        Ok(self.snapshot.bundle(&bundle.key)?.list())
    }

    fn read_content(&mut self, file: &FileHandle) -> Result<Vec<u8>> {
        self.check(FailPoint::ReadContent)?;
        let id = file.record.id;
        let stored = self.snapshot.bundle(&file.bundle)?.stored(id)?;
        match self.snapshot.contents.get(&id) {
            Some(content) => Ok(content.clone()),
            None if stored.record.size.is_none() => Ok(Vec::new()),
            None => Err(ContentsError::upstream(
                "read_content",
                StoreError::MissingContent { id },
            )),
        }
    }

    fn write_content(
        &mut self,
        file: &FileHandle,
        content: &[u8],
        mime_type: &str,
    ) -> Result<FileHandle> {
        self.check(FailPoint::WriteContent)?;
        let id = file.record.id;
        let updated = self
            .snapshot
            .bundle_mut(&file.bundle)?
            .record_written(id, content, mime_type)?;
        self.snapshot.contents.insert(id, content.to_vec());
        self.touch_content(file);
        Ok(updated)
    }

    fn remove_content(&mut self, file: &FileHandle) -> Result<()> {
        self.check(FailPoint::RemoveContent)?;
        let id = file.record.id;
        self.snapshot.bundle_mut(&file.bundle)?.record_cleared(id)?;
        self.snapshot.contents.remove(&id);
        self.touch_content(file);
        Ok(())
    }

    fn remove_record(&mut self, file: &FileHandle) -> Result<()> {
        self.check(FailPoint::RemoveRecord)?;
        let id = file.record.id;
        self.snapshot.bundle_mut(&file.bundle)?.remove(id)?;
        self.snapshot.contents.remove(&id);
        self.touch_content(file);
        Ok(())
    }

    fn rename_record(&mut self, file: &FileHandle, new_name: &str) -> Result<FileHandle> {
        self.check(FailPoint::RenameRecord)?;
        let renamed = self
            .snapshot
            .bundle_mut(&file.bundle)?
            .rename(file.record.id, new_name)?;
        self.touch(file);
        Ok(renamed)
    }

    fn commit(&mut self) -> Result<()> {
        self.check(FailPoint::Commit)?;
        let mut catalog = self.shared.catalog.lock().upstream("commit")?;
        let touched = std::mem::take(&mut self.touched);
        let content_touched = std::mem::take(&mut self.content_touched);
        for (key, id) in &touched {
            let staged = self.snapshot.bundle(key)?.find(*id);
            let content_changed = content_touched.contains(id);
            if let Some(displaced) = catalog.bundle_mut(key)?.apply(*id, staged, content_changed) {
                catalog.contents.remove(&displaced);
            }
            if !content_changed {
                continue;
            }
            match self.snapshot.contents.get(id) {
                Some(content) if staged.is_some() => {
                    catalog.contents.insert(*id, content.clone());
                }
                _ => {
                    catalog.contents.remove(id);
                }
            }
        }
        tracing::debug!("Committed {} record changes", touched.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (MemoryLibrary, BundleHandle) {
        let library = MemoryLibrary::new();
        let bundle = library.create_bundle("example.com", "test", "0.0.1").unwrap();
        (library, bundle)
    }

    #[test]
    fn test_create_bundle_seeds_manifest() {
        let (library, bundle) = library();
        let mut session = library.open().unwrap();

        let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();
        assert_eq!(manifest.record.mime_type, "application/x-yaml");
        assert!(manifest.record.has_content());

        let content = session.read_content(&manifest).unwrap();
        assert!(String::from_utf8(content).unwrap().contains("name: test"));
    }

    #[test]
    fn test_create_bundle_twice_conflicts() {
        let (library, _) = library();
        let err = library
            .create_bundle("example.com", "test", "0.0.1")
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_custom_manifest() {
        let library = MemoryLibrary::new().with_manifest(Manifest {
            file_name: "meta.toml".to_string(),
            mime_type: "application/toml".to_string(),
        });
        let bundle = library.create_bundle("s", "b", "1").unwrap();
        let mut session = library.open().unwrap();
        assert!(session.resolve_file(&bundle, "meta.toml").is_ok());
    }

    #[test]
    fn test_uncommitted_session_changes_nothing() {
        let (library, bundle) = library();
        {
            let mut session = library.open().unwrap();
            let file = session
                .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
                .unwrap();
            session.write_content(&file, b"hello", "text/plain").unwrap();
        }

        let mut session = library.open().unwrap();
        assert!(session.resolve_file(&bundle, "a.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_commit_publishes_changes() {
        let (library, bundle) = library();
        let mut session = library.open().unwrap();
        let file = session
            .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
            .unwrap();
        session.write_content(&file, b"hello", "text/plain").unwrap();
        session.commit().unwrap();

        let mut session = library.open().unwrap();
        let file = session.resolve_file(&bundle, "a.txt").unwrap();
        assert_eq!(file.record.size, Some(5));
        assert_eq!(session.read_content(&file).unwrap(), b"hello");
    }

    #[test]
    fn test_interleaved_sessions_keep_both_files() {
        let (library, bundle) = library();
        let mut first = library.open().unwrap();
        let mut second = library.open().unwrap();

        let b = second
            .create_file(&bundle, "b.txt", FileClass::Plain, "text/plain")
            .unwrap();
        second.write_content(&b, b"second", "text/plain").unwrap();
        second.commit().unwrap();

        let a = first
            .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
            .unwrap();
        first.write_content(&a, b"first", "text/plain").unwrap();
        first.commit().unwrap();

        let mut session = library.open().unwrap();
        let a = session.resolve_file(&bundle, "a.txt").unwrap();
        let b = session.resolve_file(&bundle, "b.txt").unwrap();
        assert_eq!(session.read_content(&a).unwrap(), b"first");
        assert_eq!(session.read_content(&b).unwrap(), b"second");
    }

    #[test]
    fn test_last_commit_wins_for_same_name() {
        let (library, bundle) = library();
        let mut first = library.open().unwrap();
        let mut second = library.open().unwrap();

        for (session, content) in [(&mut first, b"one"), (&mut second, b"two")] {
            let file = session
                .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
                .unwrap();
            session.write_content(&file, content, "text/plain").unwrap();
        }
        first.commit().unwrap();
        second.commit().unwrap();

        let mut session = library.open().unwrap();
        let files = session.list_files(&bundle).unwrap();
        assert_eq!(files.iter().filter(|f| f.name() == "a.txt").count(), 1);
        let a = session.resolve_file(&bundle, "a.txt").unwrap();
        assert_eq!(session.read_content(&a).unwrap(), b"two");
    }

    #[test]
    fn test_delete_does_not_undo_other_commits() {
        let (library, bundle) = library();
        let mut deleting = library.open().unwrap();
        let manifest = deleting.resolve_file(&bundle, "bundle.yaml").unwrap();

        let mut writer = library.open().unwrap();
        let file = writer
            .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
            .unwrap();
        writer.write_content(&file, b"kept", "text/plain").unwrap();
        writer.commit().unwrap();

        deleting.remove_content(&manifest).unwrap();
        deleting.remove_record(&manifest).unwrap();
        deleting.commit().unwrap();

        let mut session = library.open().unwrap();
        let names: Vec<_> = session
            .list_files(&bundle)
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn test_rename_keeps_newer_content() {
        let (library, bundle) = library();
        let mut seed = library.open().unwrap();
        let file = seed
            .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
            .unwrap();
        seed.write_content(&file, b"old", "text/plain").unwrap();
        seed.commit().unwrap();

        let mut renaming = library.open().unwrap();
        let stale = renaming.resolve_file(&bundle, "a.txt").unwrap();

        let mut writer = library.open().unwrap();
        let file = writer.resolve_file(&bundle, "a.txt").unwrap();
        writer.write_content(&file, b"newer", "text/plain").unwrap();
        writer.commit().unwrap();

        renaming.rename_record(&stale, "b.txt").unwrap();
        renaming.commit().unwrap();

        let mut session = library.open().unwrap();
        let b = session.resolve_file(&bundle, "b.txt").unwrap();
        assert_eq!(b.record.size, Some(5));
        assert_eq!(session.read_content(&b).unwrap(), b"newer");
    }

    #[test]
    fn test_unwritten_file_reads_empty() {
        let (library, bundle) = library();
        let mut session = library.open().unwrap();
        let file = session
            .create_file(&bundle, "a.txt", FileClass::Plain, "text/plain")
            .unwrap();
        assert!(session.read_content(&file).unwrap().is_empty());
    }

    #[test]
    fn test_remove_record_and_content() {
        let (library, bundle) = library();
        let mut session = library.open().unwrap();
        let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();

        session.remove_content(&manifest).unwrap();
        session.remove_record(&manifest).unwrap();
        session.commit().unwrap();

        let mut session = library.open().unwrap();
        assert!(session.list_files(&bundle).unwrap().is_empty());
    }

    #[test]
    fn test_rename_record() {
        let (library, bundle) = library();
        let mut session = library.open().unwrap();
        let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();
        let renamed = session.rename_record(&manifest, "old.yaml").unwrap();
        session.commit().unwrap();

        let mut session = library.open().unwrap();
        let file = session.resolve_file(&bundle, "old.yaml").unwrap();
        assert_eq!(file.record.id, renamed.record.id);
        assert_eq!(file.record.id, manifest.record.id);
    }

    #[test]
    fn test_fail_on() {
        let (library, bundle) = library();
        library.fail_on(FailPoint::RemoveRecord);

        let mut session = library.open().unwrap();
        let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();
        let err = session.remove_record(&manifest).unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("remove_record"));

        library.clear_faults();
        assert!(session.remove_record(&manifest).is_ok());
    }

    #[test]
    fn test_fail_on_open() {
        let library = MemoryLibrary::new();
        library.fail_on(FailPoint::Open);
        assert!(library.open().unwrap_err().is_upstream());
    }

    #[test]
    fn test_unknown_bundle() {
        let (library, _) = library();
        let mut session = library.open().unwrap();
        let key = BundleKey::new("example.com", "other-1.0").unwrap();
        assert!(session.resolve_bundle(&key).unwrap_err().is_not_found());
    }

    #[test]
    fn test_clones_share_catalog() {
        let (library, _) = library();
        let clone = library.clone();
        clone.create_bundle("example.com", "second", "1.0").unwrap();

        let mut session = library.open().unwrap();
        assert_eq!(session.list_bundles().unwrap().len(), 2);
    }
}
