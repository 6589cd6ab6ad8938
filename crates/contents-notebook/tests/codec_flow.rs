//! Integration tests for the notebook codec save/load cycle.

use contents_core::{ContentsError, TreeConfig};
use contents_notebook::{NotebookCodec, TrustNone, decode};
use serde_json::json;
use std::sync::Arc;

const PATH: &str = "example.com/test-0.0.1/analysis.ipynb";

fn with_output(trusted: bool) -> serde_json::Value {
    json!({
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": "# Results"},
            {
                "cell_type": "code",
                "metadata": {"trusted": trusted},
                "source": "print('hi')",
                "execution_count": 3,
                "outputs": [{"output_type": "stream", "name": "stdout", "text": ["hi\n"]}]
            }
        ],
        "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3"}},
        "nbformat": 4,
        "nbformat_minor": 4
    })
}

#[test]
fn test_trusted_save_is_trusted_on_load() {
    let codec = NotebookCodec::from_config(&TreeConfig::default().trust);

    let stored = codec.prepare(with_output(true), PATH).unwrap();
    // Trust flags never reach the stored document.
    assert!(!String::from_utf8_lossy(&stored).contains("\"trusted\""));

    let loaded = codec.read(&stored, PATH).unwrap();
    assert!(loaded.code_cells().all(|c| c.trusted() == Some(true)));
}

#[test]
fn test_untrusted_save_marks_output_cells_untrusted() {
    let codec = NotebookCodec::from_config(&TreeConfig::default().trust);

    let stored = codec.prepare(with_output(false), PATH).unwrap();
    let loaded = codec.read(&stored, PATH).unwrap();
    assert!(loaded.code_cells().all(|c| c.trusted() == Some(false)));
}

#[test]
fn test_edited_notebook_loses_trust() {
    let codec = NotebookCodec::from_config(&TreeConfig::default().trust);
    let stored = codec.prepare(with_output(true), PATH).unwrap();

    let tampered = String::from_utf8(stored)
        .unwrap()
        .replace("print('hi')", "print('pwned')");
    let loaded = codec.read(tampered.as_bytes(), PATH).unwrap();
    assert!(loaded.code_cells().all(|c| c.trusted() == Some(false)));
}

#[test]
fn test_trusted_path_prefix() {
    let config = TreeConfig::builder().trusted_path("example.com/").build();
    let codec = NotebookCodec::from_config(&config.trust);

    let stored = codec.prepare(with_output(false), PATH).unwrap();
    let loaded = codec.read(&stored, PATH).unwrap();
    assert!(loaded.code_cells().all(|c| c.trusted() == Some(true)));

    let elsewhere = codec.read(&stored, "other.org/b-1/a.ipynb").unwrap();
    assert!(elsewhere.code_cells().all(|c| c.trusted() == Some(false)));
}

#[test]
fn test_trust_none_never_trusts() {
    let codec = NotebookCodec::new(Arc::new(TrustNone));
    let stored = codec.prepare(with_output(true), PATH).unwrap();
    let loaded = codec.read(&stored, PATH).unwrap();
    assert!(loaded.code_cells().all(|c| c.trusted() == Some(false)));
}

#[test]
fn test_stored_document_keeps_cells_and_metadata() {
    let codec = NotebookCodec::default();
    let stored = codec.prepare(with_output(false), PATH).unwrap();

    let notebook = decode(&stored).unwrap();
    assert_eq!(notebook.cells.len(), 2);
    assert_eq!(notebook.cells[1].source(), "print('hi')");
    assert_eq!(notebook.metadata["kernelspec"]["name"], "python3");
    assert!(stored.ends_with(b"\n"));
}

#[test]
fn test_invalid_output_is_rejected() {
    let codec = NotebookCodec::default();
    let mut value = with_output(false);
    value["cells"][1]["outputs"][0]["name"] = json!("stdlog");

    let err = codec.prepare(value, PATH).unwrap_err();
    assert!(matches!(err, ContentsError::InvalidNotebook { .. }));
}
