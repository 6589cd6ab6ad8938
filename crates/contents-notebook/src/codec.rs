//! Byte-level notebook codec.
//!
//! [`decode`] parses stored bytes, upgrading nbformat 3 documents to the
//! in-memory nbformat 4 schema. [`encode`] is its inverse. [`from_value`]
//! applies the same normalization to caller-supplied JSON.
//!
//! # Examples
//!
//! ```
//! use contents_notebook::{decode, encode, Cell, CodeCell, Notebook};
//!
//! let mut nb = Notebook::new();
//! nb.cells.push(Cell::Code(CodeCell::new("print('hi')")));
//!
//! let bytes = encode(&nb).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), nb);
//! ```

use crate::document::{NBFORMAT, NBFORMAT_MINOR, Notebook};
use crate::trust::{self, Notary, TrustPolicy};
use crate::validate::validate;
use contents_core::{ContentsError, Result, TrustConfig};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Oldest on-disk major version that can be upgraded.
pub const MIN_NBFORMAT: u64 = 3;

/// Parses a stored notebook payload.
///
/// # Errors
///
/// Returns [`ContentsError::CorruptDocument`] if the bytes are not JSON, the
/// format version is unsupported, or the document does not match the
/// schema.
pub fn decode(bytes: &[u8]) -> Result<Notebook> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| corrupt(&e))?;
    let value = upgrade(value).map_err(|reason| ContentsError::CorruptDocument { reason })?;
    serde_json::from_value(value).map_err(|e| corrupt(&e))
}

/// Serializes a notebook to its stored byte representation.
///
/// # Errors
///
/// Returns [`ContentsError::CorruptDocument`] if serialization fails.
pub fn encode(notebook: &Notebook) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(notebook).map_err(|e| corrupt(&e))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Builds a notebook from caller-supplied JSON.
///
/// # Errors
///
/// Returns [`ContentsError::InvalidNotebook`] if the JSON is not a
/// notebook of a supported version.
pub fn from_value(value: Value) -> Result<Notebook> {
    let value = upgrade(value).map_err(|message| ContentsError::InvalidNotebook { message })?;
    serde_json::from_value(value).map_err(|e| ContentsError::InvalidNotebook {
        message: e.to_string(),
    })
}

/// Converts a notebook back into JSON.
///
/// # Errors
///
/// Returns [`ContentsError::CorruptDocument`] if serialization fails.
pub fn to_value(notebook: &Notebook) -> Result<Value> {
    serde_json::to_value(notebook).map_err(|e| corrupt(&e))
}

/// Notebook codec bound to a trust policy.
///
/// This is the entry point the content tree uses: [`NotebookCodec::read`]
/// decodes stored bytes and marks cell trust for the reader, and
/// [`NotebookCodec::prepare`] turns caller JSON into the bytes to store.
#[derive(Debug, Clone)]
pub struct NotebookCodec {
    policy: Arc<dyn TrustPolicy>,
}

impl NotebookCodec {
    /// Creates a codec using the given trust policy.
    #[must_use]
    pub fn new(policy: Arc<dyn TrustPolicy>) -> Self {
        Self { policy }
    }

    /// Creates a codec backed by a [`Notary`] built from the configuration.
    #[must_use]
    pub fn from_config(config: &TrustConfig) -> Self {
        Self::new(Arc::new(Notary::new(config)))
    }

    /// Returns the trust policy.
    #[must_use]
    pub fn policy(&self) -> &dyn TrustPolicy {
        self.policy.as_ref()
    }

    /// Decodes and validates stored bytes, then marks cell trust for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::CorruptDocument`] if the bytes do not decode
    /// and [`ContentsError::InvalidNotebook`] if the decoded notebook breaks
    /// the nbformat 4 rules.
    pub fn read(&self, bytes: &[u8], path: &str) -> Result<Notebook> {
        let mut notebook = decode(bytes)?;
        validate(&notebook)?;
        trust::mark_trusted_cells(&mut notebook, self.policy(), path);
        Ok(notebook)
    }

    /// Normalizes, validates, and signs caller JSON, returning the bytes to
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::InvalidNotebook`] if the JSON is not a valid
    /// notebook.
    pub fn prepare(&self, value: Value, path: &str) -> Result<Vec<u8>> {
        let mut notebook = from_value(value)?;
        validate(&notebook)?;
        trust::check_and_sign(&notebook, self.policy(), path);
        trust::strip_trust(&mut notebook);
        encode(&notebook)
    }

    /// Returns the stored form of an empty notebook.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::CorruptDocument`] if serialization fails.
    pub fn empty(&self) -> Result<Vec<u8>> {
        encode(&Notebook::new())
    }
}

impl Default for NotebookCodec {
    fn default() -> Self {
        Self::from_config(&TrustConfig::default())
    }
}

fn corrupt(error: &serde_json::Error) -> ContentsError {
    ContentsError::CorruptDocument {
        reason: error.to_string(),
    }
}

/// Upgrades a raw notebook document to the current major version.
///
/// Documents already at the current major version pass through unchanged.
fn upgrade(mut value: Value) -> std::result::Result<Value, String> {
    let major = value
        .get("nbformat")
        .and_then(Value::as_u64)
        .ok_or_else(|| "missing nbformat version".to_string())?;

    match major {
        m if m == u64::from(NBFORMAT) => Ok(value),
        3 => {
            let root = value
                .as_object_mut()
                .ok_or_else(|| "notebook must be a JSON object".to_string())?;
            upgrade_v3(root)?;
            tracing::debug!("Upgraded notebook from nbformat 3 to {NBFORMAT}");
            Ok(value)
        }
        m if m < MIN_NBFORMAT => Err(format!("nbformat {m} is too old to upgrade")),
        m => Err(format!("unsupported nbformat version {m}")),
    }
}

fn upgrade_v3(root: &mut Map<String, Value>) -> std::result::Result<(), String> {
    let worksheets = match root.remove("worksheets") {
        Some(Value::Array(worksheets)) => worksheets,
        None => Vec::new(),
        Some(_) => return Err("worksheets must be an array".to_string()),
    };

    let mut cells = Vec::new();
    for worksheet in worksheets {
        if let Some(Value::Array(ws_cells)) = worksheet.get("cells") {
            for cell in ws_cells {
                cells.push(upgrade_cell_v3(cell.clone())?);
            }
        }
    }

    if let Some(Value::Object(metadata)) = root.get_mut("metadata") {
        metadata.remove("name");
        metadata.remove("signature");
    }
    root.entry("metadata").or_insert_with(|| json!({}));
    root.insert("cells".to_string(), Value::Array(cells));
    root.insert("nbformat".to_string(), json!(NBFORMAT));
    root.insert("nbformat_minor".to_string(), json!(NBFORMAT_MINOR));
    Ok(())
}

fn upgrade_cell_v3(cell: Value) -> std::result::Result<Value, String> {
    let Value::Object(mut cell) = cell else {
        return Err("cell must be a JSON object".to_string());
    };
    let cell_type = cell
        .get("cell_type")
        .and_then(Value::as_str)
        .ok_or_else(|| "cell is missing cell_type".to_string())?
        .to_string();

    let mut metadata = match cell.remove("metadata") {
        Some(Value::Object(metadata)) => metadata,
        _ => Map::new(),
    };

    let upgraded = match cell_type.as_str() {
        "code" => {
            if let Some(collapsed) = cell.remove("collapsed") {
                metadata.insert("collapsed".to_string(), collapsed);
            }
            let outputs = match cell.remove("outputs") {
                Some(Value::Array(outputs)) => outputs
                    .into_iter()
                    .map(upgrade_output_v3)
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            json!({
                "cell_type": "code",
                "metadata": metadata,
                "source": cell.remove("input").unwrap_or_else(|| json!("")),
                "execution_count": cell.remove("prompt_number").unwrap_or(Value::Null),
                "outputs": outputs,
            })
        }
        "heading" => {
            let level = cell
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            let source = join_source(cell.remove("source"));
            let hashes = "#".repeat(usize::try_from(level).unwrap_or(1));
            let heading = source
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ");
            json!({
                "cell_type": "markdown",
                "metadata": metadata,
                "source": format!("{hashes} {heading}"),
            })
        }
        "markdown" | "raw" => json!({
            "cell_type": cell_type,
            "metadata": metadata,
            "source": cell.remove("source").unwrap_or_else(|| json!("")),
        }),
        other => return Err(format!("unknown nbformat 3 cell type '{other}'")),
    };

    Ok(upgraded)
}

fn upgrade_output_v3(output: Value) -> std::result::Result<Value, String> {
    let Value::Object(mut output) = output else {
        return Err("output must be a JSON object".to_string());
    };
    let output_type = output
        .remove("output_type")
        .and_then(|t| t.as_str().map(str::to_string))
        .ok_or_else(|| "output is missing output_type".to_string())?;

    let upgraded = match output_type.as_str() {
        "pyout" | "execute_result" => {
            let execution_count = output.remove("prompt_number").unwrap_or(Value::Null);
            let metadata = output.remove("metadata").unwrap_or_else(|| json!({}));
            json!({
                "output_type": "execute_result",
                "execution_count": execution_count,
                "data": mime_bundle_v3(&mut output),
                "metadata": metadata,
            })
        }
        "display_data" => {
            let metadata = output.remove("metadata").unwrap_or_else(|| json!({}));
            json!({
                "output_type": "display_data",
                "data": mime_bundle_v3(&mut output),
                "metadata": metadata,
            })
        }
        "pyerr" | "error" => json!({
            "output_type": "error",
            "ename": output.remove("ename").unwrap_or_else(|| json!("")),
            "evalue": output.remove("evalue").unwrap_or_else(|| json!("")),
            "traceback": output.remove("traceback").unwrap_or_else(|| json!([])),
        }),
        "stream" => json!({
            "output_type": "stream",
            "name": output.remove("stream").unwrap_or_else(|| json!("stdout")),
            "text": output.remove("text").unwrap_or_else(|| json!("")),
        }),
        other => return Err(format!("unknown nbformat 3 output type '{other}'")),
    };

    Ok(upgraded)
}

/// Collects v3 short mime keys (`text`, `png`, ...) into a v4 mime bundle.
fn mime_bundle_v3(output: &mut Map<String, Value>) -> Value {
    const MIME_KEYS: [(&str, &str); 8] = [
        ("text", "text/plain"),
        ("html", "text/html"),
        ("svg", "image/svg+xml"),
        ("png", "image/png"),
        ("jpeg", "image/jpeg"),
        ("latex", "text/latex"),
        ("json", "application/json"),
        ("javascript", "application/javascript"),
    ];

    let mut data = Map::new();
    for (short, mime) in MIME_KEYS {
        if let Some(value) = output.remove(short) {
            data.insert(mime.to_string(), value);
        }
    }
    Value::Object(data)
}

fn join_source(source: Option<Value>) -> String {
    match source {
        Some(Value::String(text)) => text,
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .concat(),
        _ => String::new(),
    }
}
