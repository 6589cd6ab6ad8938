//! Output formats and exit codes.
//!
//! # Examples
//!
//! ```
//! use contents_cli::cli::{ExitCode, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format, OutputFormat::Json);
//! assert_eq!(ExitCode::NOT_FOUND.as_i32(), 3);
//! ```

use contents_core::ContentsError;
use std::fmt;
use std::str::FromStr;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// JSON output for machine parsing
    Json,
    /// Plain text output for scripts
    Text,
    /// Colored output for human reading
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => anyhow::bail!("invalid output format: '{s}' (expected: json, text, or pretty)"),
        }
    }
}

/// Process exit code.
///
/// Failures are classified by the first [`ContentsError`] found in the
/// error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Successful execution (exit code 0).
    pub const SUCCESS: Self = Self(0);

    /// Store failure or any unclassified error (exit code 1).
    pub const ERROR: Self = Self(1);

    /// Rejected request: bad type, conflict, invalid input (exit code 2).
    pub const INVALID_INPUT: Self = Self(2);

    /// Path, bundle, or file does not exist (exit code 3).
    pub const NOT_FOUND: Self = Self(3);

    /// Returns the numeric exit code.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns `true` for [`ExitCode::SUCCESS`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Classifies a command failure.
    ///
    /// ```
    /// use contents_cli::cli::ExitCode;
    /// use contents_core::ContentsError;
    ///
    /// let err = anyhow::Error::new(ContentsError::NotFound { path: "a/b-1/c".into() })
    ///     .context("cat failed");
    /// assert_eq!(ExitCode::from_error(&err), ExitCode::NOT_FOUND);
    ///
    /// let err = anyhow::anyhow!("disk on fire");
    /// assert_eq!(ExitCode::from_error(&err), ExitCode::ERROR);
    /// ```
    #[must_use]
    pub fn from_error(error: &anyhow::Error) -> Self {
        let Some(contents) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ContentsError>())
        else {
            return Self::ERROR;
        };

        if contents.is_not_found() {
            Self::NOT_FOUND
        } else if contents.is_client_error() {
            Self::INVALID_INPUT
        } else {
            Self::ERROR
        }
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
