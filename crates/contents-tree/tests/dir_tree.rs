//! End-to-end tests of the content tree over a directory-backed library.

use contents_core::{
    BundleHandle, BundleKey, ContentType, FileClass, FileHandle, Library, LibrarySession, Result,
    TreeConfig,
};
use contents_store::{DirLibrary, DirSession};
use contents_tree::{ContentTree, GetOptions, SaveRequest};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup() -> (TempDir, ContentTree<DirLibrary>) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let library = DirLibrary::new(temp_dir.path()).expect("failed to create library");
    library
        .create_bundle("example.com", "test", "0.0.1")
        .expect("failed to create bundle");
    (temp_dir, ContentTree::new(library, TreeConfig::default()))
}

#[test]
fn test_full_file_lifecycle() {
    let (temp_dir, tree) = setup();
    let path = "example.com/test-0.0.1/notes.txt";

    // 1. Create
    tree.save(SaveRequest::text("first"), path)
        .expect("save should succeed");
    assert!(tree.exists(path).unwrap());

    // 2. Reopen over the same directory and read back
    let reopened = ContentTree::new(
        DirLibrary::new(temp_dir.path()).unwrap(),
        TreeConfig::default(),
    );
    let model = reopened.get(path, GetOptions::default()).unwrap();
    assert_eq!(model.text(), Some("first"));

    // 3. Rename
    let renamed = "example.com/test-0.0.1/final.txt";
    reopened.rename(path, renamed).expect("rename should succeed");
    assert!(!tree.exists(path).unwrap());
    assert_eq!(
        tree.get(renamed, GetOptions::default()).unwrap().text(),
        Some("first")
    );

    // 4. Delete
    tree.delete(renamed).expect("delete should succeed");
    assert!(!tree.exists(renamed).unwrap());

    let listing = tree
        .get("example.com/test-0.0.1", GetOptions::default())
        .unwrap();
    let names: Vec<_> = listing.children().unwrap().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["bundle.yaml"]);
}

#[test]
fn test_notebook_persists_across_instances() {
    let (temp_dir, tree) = setup();
    let path = "example.com/test-0.0.1/analysis.ipynb";
    let notebook = json!({
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": "# Title"},
            {"cell_type": "code", "metadata": {}, "source": "x = 1", "execution_count": null, "outputs": []}
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 4
    });

    let saved = tree.save(SaveRequest::notebook(notebook), path).unwrap();
    assert_eq!(saved.kind, ContentType::Notebook);

    let reopened = ContentTree::new(
        DirLibrary::new(temp_dir.path()).unwrap(),
        TreeConfig::default(),
    );
    let model = reopened.get(path, GetOptions::default()).unwrap();
    let nb = model.notebook().expect("notebook content");
    assert_eq!(nb.cells.len(), 2);
    assert_eq!(nb.cells[0].source(), "# Title");
    // A code cell without outputs is trusted even if unsigned.
    assert!(nb.code_cells().all(|c| c.trusted() == Some(true)));
}

#[test]
fn test_root_lists_sources_from_disk() {
    let (_temp_dir, tree) = setup();
    tree.library()
        .create_bundle("alpha.org", "data", "2.0")
        .unwrap();

    let root = tree.get("", GetOptions::default()).unwrap();
    let names: Vec<_> = root.children().unwrap().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha.org", "example.com"]);

    let source = tree.get("alpha.org", GetOptions::default()).unwrap();
    assert_eq!(source.children().unwrap()[0].path, "alpha.org/data-2.0");
}

#[test]
fn test_concurrent_saves_keep_every_file() {
    let (_temp_dir, tree) = setup();
    std::thread::scope(|scope| {
        for i in 0..16 {
            let tree = &tree;
            scope.spawn(move || {
                tree.save(
                    SaveRequest::text(format!("file {i}")),
                    &format!("example.com/test-0.0.1/f{i}.txt"),
                )
                .unwrap();
            });
        }
    });

    let listing = tree
        .get("example.com/test-0.0.1", GetOptions::default())
        .unwrap();
    assert_eq!(listing.children().unwrap().len(), 17);
    for i in 0..16 {
        let model = tree
            .get(&format!("example.com/test-0.0.1/f{i}.txt"), GetOptions::default())
            .unwrap();
        assert_eq!(model.text(), Some(format!("file {i}").as_str()));
    }
}

/// Library whose sessions fail to write `records.json` at commit.
#[derive(Debug)]
struct UnwritableRecords {
    inner: DirLibrary,
    records: PathBuf,
}

#[derive(Debug)]
struct UnwritableRecordsSession {
    inner: DirSession,
    records: PathBuf,
}

impl Library for UnwritableRecords {
    type Session = UnwritableRecordsSession;

    fn open(&self) -> Result<UnwritableRecordsSession> {
        Ok(UnwritableRecordsSession {
            inner: self.inner.open()?,
            records: self.records.clone(),
        })
    }
}

impl LibrarySession for UnwritableRecordsSession {
    fn resolve_bundle(&mut self, key: &BundleKey) -> Result<BundleHandle> {
        self.inner.resolve_bundle(key)
    }

    fn list_bundles(&mut self) -> Result<Vec<BundleHandle>> {
        self.inner.list_bundles()
    }

    fn resolve_file(&mut self, bundle: &BundleHandle, name: &str) -> Result<FileHandle> {
        self.inner.resolve_file(bundle, name)
    }

    fn create_file(
        &mut self,
        bundle: &BundleHandle,
        name: &str,
        class: FileClass,
        mime_type: &str,
    ) -> Result<FileHandle> {
        self.inner.create_file(bundle, name, class, mime_type)
    }

    fn list_files(&mut self, bundle: &BundleHandle) -> Result<Vec<FileHandle>> {
        self.inner.list_files(bundle)
    }

    fn read_content(&mut self, file: &FileHandle) -> Result<Vec<u8>> {
        self.inner.read_content(file)
    }

    fn write_content(
        &mut self,
        file: &FileHandle,
        content: &[u8],
        mime_type: &str,
    ) -> Result<FileHandle> {
        self.inner.write_content(file, content, mime_type)
    }

    fn remove_content(&mut self, file: &FileHandle) -> Result<()> {
        self.inner.remove_content(file)
    }

    fn remove_record(&mut self, file: &FileHandle) -> Result<()> {
        self.inner.remove_record(file)
    }

    fn rename_record(&mut self, file: &FileHandle, new_name: &str) -> Result<FileHandle> {
        self.inner.rename_record(file, new_name)
    }

    fn commit(&mut self) -> Result<()> {
        let aside = self.records.with_extension("aside");
        fs::rename(&self.records, &aside).unwrap();
        fs::create_dir(&self.records).unwrap();
        let result = self.inner.commit();
        fs::remove_dir(&self.records).unwrap();
        fs::rename(&aside, &self.records).unwrap();
        result
    }
}

#[test]
fn test_failed_delete_keeps_file_readable() {
    let temp_dir = TempDir::new().unwrap();
    let inner = DirLibrary::new(temp_dir.path()).unwrap();
    inner.create_bundle("example.com", "test", "0.0.1").unwrap();
    let path = "example.com/test-0.0.1/notes.txt";
    ContentTree::new(inner.clone(), TreeConfig::default())
        .save(SaveRequest::text("keep me"), path)
        .unwrap();

    let library = UnwritableRecords {
        inner,
        records: temp_dir
            .path()
            .join("example.com")
            .join("test-0.0.1")
            .join("records.json"),
    };
    let tree = ContentTree::new(library, TreeConfig::default());

    assert!(tree.delete(path).unwrap_err().is_upstream());
    assert!(tree.exists(path).unwrap());
    let model = tree.get(path, GetOptions::default()).unwrap();
    assert_eq!(model.text(), Some("keep me"));
}
