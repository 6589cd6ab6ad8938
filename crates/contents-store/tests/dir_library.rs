//! Integration tests for the directory-backed library.

use contents_core::{BundleKey, FileClass, Library, LibrarySession};
use contents_store::{DirLibrary, FILES_DIR, RECORDS_FILE};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, DirLibrary) {
    let temp = TempDir::new().unwrap();
    let library = DirLibrary::new(temp.path()).unwrap();
    library.create_bundle("example.com", "test", "0.0.1").unwrap();
    (temp, library)
}

fn key() -> BundleKey {
    BundleKey::for_bundle("example.com", "test", "0.0.1").unwrap()
}

#[test]
fn test_changes_persist_across_library_instances() {
    let (temp, library) = setup();
    {
        let mut session = library.open().unwrap();
        let bundle = session.resolve_bundle(&key()).unwrap();
        let file = session
            .create_file(&bundle, "notes.txt", FileClass::Plain, "text/plain")
            .unwrap();
        session.write_content(&file, b"first draft", "text/plain").unwrap();
        session.commit().unwrap();
    }

    let reopened = DirLibrary::new(temp.path()).unwrap();
    let mut session = reopened.open().unwrap();
    let bundle = session.resolve_bundle(&key()).unwrap();
    let file = session.resolve_file(&bundle, "notes.txt").unwrap();

    assert_eq!(file.record.size, Some(11));
    assert_eq!(file.record.mime_type, "text/plain");
    assert_eq!(session.read_content(&file).unwrap(), b"first draft");
}

#[test]
fn test_dropped_session_leaves_disk_untouched() {
    let (temp, library) = setup();
    let records = temp
        .path()
        .join("example.com")
        .join("test-0.0.1")
        .join(RECORDS_FILE);
    let before = fs::read(&records).unwrap();

    {
        let mut session = library.open().unwrap();
        let bundle = session.resolve_bundle(&key()).unwrap();
        let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();
        session.rename_record(&manifest, "renamed.yaml").unwrap();
    }

    assert_eq!(fs::read(&records).unwrap(), before);
}

#[test]
fn test_rename_keeps_content_file() {
    let (_temp, library) = setup();
    let mut session = library.open().unwrap();
    let bundle = session.resolve_bundle(&key()).unwrap();
    let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();
    let original = session.read_content(&manifest).unwrap();

    session.rename_record(&manifest, "meta.yaml").unwrap();
    session.commit().unwrap();

    let mut session = library.open().unwrap();
    let renamed = session.resolve_file(&bundle, "meta.yaml").unwrap();
    assert_eq!(renamed.record.id, manifest.record.id);
    assert_eq!(session.read_content(&renamed).unwrap(), original);
    assert!(session.resolve_file(&bundle, "bundle.yaml").is_err());
}

#[test]
fn test_tampered_content_is_upstream_failure() {
    let (temp, library) = setup();
    let mut session = library.open().unwrap();
    let bundle = session.resolve_bundle(&key()).unwrap();
    let manifest = session.resolve_file(&bundle, "bundle.yaml").unwrap();

    let content_file = temp
        .path()
        .join("example.com")
        .join("test-0.0.1")
        .join(FILES_DIR)
        .join(manifest.record.id.to_string());
    fs::write(&content_file, b"tampered").unwrap();

    let mut session = library.open().unwrap();
    let err = session.read_content(&manifest).unwrap_err();
    assert!(err.is_upstream());
    assert!(err.to_string().contains("read_content"));
}

#[test]
fn test_list_bundles_sorted() {
    let (_temp, library) = setup();
    library.create_bundle("alpha.org", "data", "2.0").unwrap();
    library.create_bundle("example.com", "another", "1.0").unwrap();

    let mut session = library.open().unwrap();
    let keys: Vec<String> = session
        .list_bundles()
        .unwrap()
        .into_iter()
        .map(|b| b.key.to_string())
        .collect();

    assert_eq!(
        keys,
        vec![
            "alpha.org/data-2.0",
            "example.com/another-1.0",
            "example.com/test-0.0.1"
        ]
    );
}

#[test]
fn test_missing_bundle_not_found() {
    let (_temp, library) = setup();
    let mut session = library.open().unwrap();
    let key = BundleKey::new("example.com", "nope-1.0").unwrap();
    assert!(session.resolve_bundle(&key).unwrap_err().is_not_found());
}

#[test]
fn test_corrupt_records_is_upstream_failure() {
    let (temp, library) = setup();
    fs::write(
        temp.path()
            .join("example.com")
            .join("test-0.0.1")
            .join(RECORDS_FILE),
        b"{not json",
    )
    .unwrap();

    let mut session = library.open().unwrap();
    assert!(session.resolve_bundle(&key()).unwrap_err().is_upstream());
}
