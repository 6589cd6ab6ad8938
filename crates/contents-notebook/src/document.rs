//! In-memory notebook document model (nbformat 4).
//!
//! Cells are a tagged enum keyed on `cell_type`. Sources are held as a
//! single string and written back as the line array nbformat uses on disk,
//! so a decoded document encodes to the same JSON structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Major nbformat version of the in-memory schema.
pub const NBFORMAT: u32 = 4;

/// Minor nbformat version written for upgraded documents.
pub const NBFORMAT_MINOR: u32 = 4;

/// Cell metadata key holding the transient trust flag.
pub const TRUSTED_KEY: &str = "trusted";

/// A notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Ordered cells
    pub cells: Vec<Cell>,
    /// Notebook-level metadata (kernelspec, language info, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Major format version
    pub nbformat: u32,
    /// Minor format version
    pub nbformat_minor: u32,
}

impl Notebook {
    /// Creates an empty notebook of the current format version.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_notebook::Notebook;
    ///
    /// let nb = Notebook::new();
    /// assert_eq!(nb.nbformat, 4);
    /// assert!(nb.cells.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    /// Iterates over the code cells of the notebook.
    pub fn code_cells(&self) -> impl Iterator<Item = &CodeCell> {
        self.cells.iter().filter_map(|cell| match cell {
            Cell::Code(code) => Some(code),
            _ => None,
        })
    }

    /// Iterates mutably over the code cells of the notebook.
    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = &mut CodeCell> {
        self.cells.iter_mut().filter_map(|cell| match cell {
            Cell::Code(code) => Some(code),
            _ => None,
        })
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

/// A notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    /// Executable code with outputs
    Code(CodeCell),
    /// Markdown prose
    Markdown(TextCell),
    /// Raw, unrendered text
    Raw(TextCell),
}

impl Cell {
    /// Returns the cell id, if the document carries one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Code(cell) => cell.id.as_deref(),
            Self::Markdown(cell) | Self::Raw(cell) => cell.id.as_deref(),
        }
    }

    /// Returns the cell source.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Code(cell) => &cell.source,
            Self::Markdown(cell) | Self::Raw(cell) => &cell.source,
        }
    }

    /// Returns the cell metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        match self {
            Self::Code(cell) => &cell.metadata,
            Self::Markdown(cell) | Self::Raw(cell) => &cell.metadata,
        }
    }

    /// Returns the cell metadata for modification.
    pub const fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Self::Code(cell) => &mut cell.metadata,
            Self::Markdown(cell) | Self::Raw(cell) => &mut cell.metadata,
        }
    }
}

/// A code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    /// Optional cell id (nbformat 4.5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Cell metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Cell source
    #[serde(with = "multiline")]
    pub source: String,
    /// Execution counter, `null` if never run
    pub execution_count: Option<u64>,
    /// Output records, kept as JSON objects
    pub outputs: Vec<Value>,
}

impl CodeCell {
    /// Creates a code cell with no outputs.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: None,
            metadata: Map::new(),
            source: source.into(),
            execution_count: None,
            outputs: Vec::new(),
        }
    }

    /// Returns the transient trust flag, if set.
    #[must_use]
    pub fn trusted(&self) -> Option<bool> {
        self.metadata.get(TRUSTED_KEY).and_then(Value::as_bool)
    }
}

/// A markdown or raw cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    /// Optional cell id (nbformat 4.5+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Cell metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Cell source
    #[serde(with = "multiline")]
    pub source: String,
    /// Inline attachments keyed by file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Map<String, Value>>,
}

impl TextCell {
    /// Creates a text cell.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: None,
            metadata: Map::new(),
            source: source.into(),
            attachments: None,
        }
    }
}

/// Serde adapter for nbformat multi-line strings.
///
/// Reads either a string or an array of strings; writes an array of lines
/// that keep their trailing newlines.
pub(crate) mod multiline {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(split_lines(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(value) => value,
            Repr::Many(lines) => lines.concat(),
        })
    }

    /// Splits text into lines, keeping each line's trailing newline.
    pub fn split_lines(value: &str) -> impl Iterator<Item = &str> {
        value.split_inclusive('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_written_as_lines() {
        let cell = Cell::Code(CodeCell::new("import os\nprint(os.getcwd())"));
        let value = serde_json::to_value(&cell).unwrap();

        assert_eq!(value["cell_type"], "code");
        assert_eq!(value["source"], json!(["import os\n", "print(os.getcwd())"]));
        assert_eq!(value["execution_count"], Value::Null);
        assert_eq!(value["outputs"], json!([]));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_source_read_from_string_or_lines() {
        let from_lines: Cell = serde_json::from_value(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": ["# Title\n", "body"]
        }))
        .unwrap();
        let from_string: Cell = serde_json::from_value(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": "# Title\nbody"
        }))
        .unwrap();

        assert_eq!(from_lines, from_string);
        assert_eq!(from_lines.source(), "# Title\nbody");
    }

    #[test]
    fn test_empty_source_is_empty_array() {
        let cell = Cell::Raw(TextCell::new(""));
        let value = serde_json::to_value(&cell).unwrap();
        assert_eq!(value["source"], json!([]));
    }

    #[test]
    fn test_code_cell_requires_outputs() {
        let result: Result<Cell, _> = serde_json::from_value(json!({
            "cell_type": "code",
            "metadata": {},
            "source": "",
            "execution_count": null
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_cell_type_rejected() {
        let result: Result<Cell, _> = serde_json::from_value(json!({
            "cell_type": "heading",
            "metadata": {},
            "source": ""
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_code_cells_iterator() {
        let mut nb = Notebook::new();
        nb.cells.push(Cell::Markdown(TextCell::new("# Intro")));
        nb.cells.push(Cell::Code(CodeCell::new("1 + 1")));
        nb.cells.push(Cell::Code(CodeCell::new("2 + 2")));

        assert_eq!(nb.code_cells().count(), 2);
        for cell in nb.code_cells_mut() {
            cell.execution_count = Some(1);
        }
        assert!(nb.code_cells().all(|c| c.execution_count == Some(1)));
    }

    #[test]
    fn test_trusted_flag() {
        let mut cell = CodeCell::new("x");
        assert_eq!(cell.trusted(), None);
        cell.metadata.insert(TRUSTED_KEY.to_string(), Value::Bool(true));
        assert_eq!(cell.trusted(), Some(true));
    }
}
