//! Output formatters for command results.
//!
//! Every command result is serializable and printed through
//! [`format_output`], so the three output modes behave the same way across
//! commands.

use crate::cli::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// Formats `data` according to `format`.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Examples
///
/// ```
/// use contents_cli::cli::OutputFormat;
/// use contents_cli::formatters::format_output;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Removed {
///     path: String,
/// }
///
/// let removed = Removed { path: "example.com/test-0.0.1/a.txt".into() };
/// let output = format_output(&removed, OutputFormat::Json)?;
/// assert!(output.contains("\"path\""));
///
/// let output = format_output(&removed, OutputFormat::Text)?;
/// assert_eq!(output, "path: example.com/test-0.0.1/a.txt");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Formats data as indented JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Formats data as single-line JSON.
    pub fn format_compact<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string(data)?)
    }
}

/// Plain text output formatting.
///
/// Line oriented so results can be piped into `grep`, `cut`, or `xargs`:
/// strings print bare, arrays print one item per line, and objects print
/// one `key: value` pair per line. Nested values fall back to compact JSON.
pub mod text {
    use super::{Result, Serialize, json};
    use serde_json::Value;

    /// Formats data as plain text.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        match &value {
            Value::Array(items) => items
                .iter()
                .map(line)
                .collect::<Result<Vec<_>>>()
                .map(|lines| lines.join("\n")),
            _ => line(&value),
        }
    }

    fn line(value: &Value) -> Result<String> {
        match value {
            Value::Object(fields) => fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(key, v)| Ok(format!("{key}: {}", scalar(v)?)))
                .collect::<Result<Vec<_>>>()
                .map(|pairs| pairs.join("\n")),
            other => scalar(other),
        }
    }

    fn scalar(value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
            Value::Array(_) | Value::Object(_) => json::format_compact(value),
        }
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;

    /// Formats data as colorized, indented output.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        write_value(&mut out, &value, 0);
        Ok(out)
    }

    fn write_value(out: &mut String, value: &Value, indent: usize) {
        let pad = "  ".repeat(indent);
        match value {
            Value::Null => out.push_str(&"-".dimmed().to_string()),
            Value::Bool(b) => out.push_str(&b.to_string().yellow().to_string()),
            Value::Number(n) => out.push_str(&n.to_string().cyan().to_string()),
            Value::String(s) => out.push_str(&s.green().to_string()),
            Value::Array(items) if items.is_empty() => out.push_str(&"(empty)".dimmed().to_string()),
            Value::Object(fields) if fields.is_empty() => {
                out.push_str(&"(empty)".dimmed().to_string());
            }
            Value::Array(items) => {
                for item in items {
                    out.push('\n');
                    out.push_str(&pad);
                    out.push_str("- ");
                    write_value(out, item, indent + 1);
                }
            }
            Value::Object(fields) => {
                for (i, (key, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                        out.push_str(&pad);
                    }
                    out.push_str(&key.blue().bold().to_string());
                    out.push(':');
                    match field {
                        Value::Object(nested) if !nested.is_empty() => {
                            out.push('\n');
                            out.push_str(&"  ".repeat(indent + 1));
                        }
                        Value::Array(items) if !items.is_empty() => {}
                        _ => out.push(' '),
                    }
                    write_value(out, field, indent + 1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_format() {
        let output = json::format(&json!({"name": "a.txt", "size": 3})).unwrap();
        assert!(output.contains("\"name\": \"a.txt\""));
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_json_format_compact() {
        let output = json::format_compact(&json!({"name": "a.txt"})).unwrap();
        assert_eq!(output, r#"{"name":"a.txt"}"#);
    }

    #[test]
    fn test_text_format_object() {
        let output = text::format(&json!({
            "name": "a.txt",
            "writable": false,
            "mimetype": null,
            "tags": ["x"]
        }))
        .unwrap();
        assert_eq!(output, "name: a.txt\ntags: [\"x\"]\nwritable: false");
    }

    #[test]
    fn test_text_format_list_of_strings() {
        let output = text::format(&vec!["a", "b"]).unwrap();
        assert_eq!(output, "a\nb");
    }

    #[test]
    fn test_pretty_format_contains_values() {
        colored::control::set_override(false);
        let output = pretty::format(&json!({
            "path": "example.com",
            "children": [{"name": "test-0.0.1"}],
            "empty": []
        }))
        .unwrap();
        assert!(output.contains("path: example.com"));
        assert!(output.contains("- "));
        assert!(output.contains("name: test-0.0.1"));
        assert!(output.contains("empty: (empty)"));
    }

    #[test]
    fn test_format_output_dispatch() {
        let data = json!({"path": "p"});
        assert!(format_output(&data, OutputFormat::Json).unwrap().contains("\"path\""));
        assert_eq!(format_output(&data, OutputFormat::Text).unwrap(), "path: p");
    }
}
