//! Structural validation of nbformat 4 documents.
//!
//! The serde schema already guarantees cell shape. Validation covers what
//! it cannot: the format version, the output records kept as raw JSON, and
//! cell id uniqueness.

use crate::document::{NBFORMAT, Notebook};
use contents_core::{ContentsError, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Checks a notebook against the nbformat 4 rules.
///
/// # Errors
///
/// Returns [`ContentsError::InvalidNotebook`] describing the first
/// violation found.
///
/// # Examples
///
/// ```
/// use contents_notebook::{validate, Notebook};
///
/// assert!(validate(&Notebook::new()).is_ok());
///
/// let mut nb = Notebook::new();
/// nb.nbformat = 3;
/// assert!(validate(&nb).is_err());
/// ```
pub fn validate(notebook: &Notebook) -> Result<()> {
    if notebook.nbformat != NBFORMAT {
        return Err(invalid(format!(
            "expected nbformat {NBFORMAT}, found {}",
            notebook.nbformat
        )));
    }

    let mut ids = HashSet::new();
    for (index, cell) in notebook.cells.iter().enumerate() {
        if let Some(id) = cell.id() {
            if id.is_empty() {
                return Err(invalid(format!("cell {index} has an empty id")));
            }
            if !ids.insert(id) {
                return Err(invalid(format!("duplicate cell id '{id}'")));
            }
        }
    }

    for (index, cell) in notebook.code_cells().enumerate() {
        for output in &cell.outputs {
            validate_output(output).map_err(|reason| {
                invalid(format!("code cell {index}: {reason}"))
            })?;
        }
    }

    Ok(())
}

fn validate_output(output: &Value) -> std::result::Result<(), String> {
    let Some(object) = output.as_object() else {
        return Err("output must be a JSON object".to_string());
    };
    let Some(output_type) = object.get("output_type").and_then(Value::as_str) else {
        return Err("output is missing output_type".to_string());
    };

    let required: &[&str] = match output_type {
        "execute_result" => &["data", "metadata", "execution_count"],
        "display_data" => &["data", "metadata"],
        "stream" => &["name", "text"],
        "error" => &["ename", "evalue", "traceback"],
        other => return Err(format!("unknown output type '{other}'")),
    };

    if let Some(missing) = required.iter().find(|field| !object.contains_key(**field)) {
        return Err(format!("{output_type} output is missing '{missing}'"));
    }

    if output_type == "stream" {
        match object.get("name").and_then(Value::as_str) {
            Some("stdout" | "stderr") => {}
            _ => return Err("stream name must be stdout or stderr".to_string()),
        }
    }

    Ok(())
}

fn invalid(message: String) -> ContentsError {
    ContentsError::InvalidNotebook { message }
}
