//! Configuration for the content tree.
//!
//! [`TreeConfig`] collects the knobs of the tree: the notebook extension the
//! path classifier keys on, the manifest file every bundle carries, default
//! mime types, and the notebook trust settings. It can be built in code or
//! loaded from TOML.
//!
//! # Examples
//!
//! ```
//! use contents_core::TreeConfig;
//!
//! let config = TreeConfig::default();
//! assert_eq!(config.notebook_extension, ".ipynb");
//! assert_eq!(config.manifest_file, "bundle.yaml");
//!
//! let custom = TreeConfig::builder()
//!     .notebook_extension(".nb")
//!     .trusted_path("example.com/")
//!     .build();
//! assert!(custom.validate().is_ok());
//! ```
//!
//! ```toml
//! notebook_extension = ".ipynb"
//! manifest_file = "bundle.yaml"
//!
//! [trust]
//! secret = "change-me"
//! trusted_paths = ["example.com/"]
//! ```

use crate::error::{ContentsError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default notebook file extension.
pub const DEFAULT_NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Default manifest file created with every bundle.
pub const DEFAULT_MANIFEST_FILE: &str = "bundle.yaml";

/// Runtime configuration of the content tree.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Extension that marks a file as a notebook.
    ///
    /// Default: `.ipynb`
    pub notebook_extension: String,

    /// Name of the manifest file seeded into every new bundle.
    ///
    /// Default: `bundle.yaml`
    pub manifest_file: String,

    /// Mime type of the manifest file.
    pub manifest_mime_type: String,

    /// Mime type recorded for plain text files.
    pub text_mime_type: String,

    /// Mime type recorded for binary files saved as base64.
    pub binary_mime_type: String,

    /// Mime type recorded for notebook files.
    pub notebook_mime_type: String,

    /// Notebook trust settings.
    pub trust: TrustConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            notebook_extension: DEFAULT_NOTEBOOK_EXTENSION.to_string(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            manifest_mime_type: "application/x-yaml".to_string(),
            text_mime_type: "text/plain".to_string(),
            binary_mime_type: "application/octet-stream".to_string(),
            notebook_mime_type: "application/json".to_string(),
            trust: TrustConfig::default(),
        }
    }
}

/// Notebook trust settings.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Secret used to key notebook signatures.
    ///
    /// If `None`, the secret is read from (or generated into) `data_dir`;
    /// without a data directory a random per-process secret is used.
    #[serde(skip_serializing)]
    pub secret: Option<SecretString>,

    /// Path prefixes whose notebooks are always trusted.
    pub trusted_paths: Vec<String>,

    /// Directory persisting notebook signatures between runs.
    ///
    /// If `None`, signatures are kept in memory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl TreeConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::new()
    }

    /// Parses and validates a TOML configuration.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::Config`] if the TOML is malformed or the
    /// resulting configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::TreeConfig;
    ///
    /// let config = TreeConfig::from_toml_str(r#"
    ///     notebook_extension = ".nb"
    ///     [trust]
    ///     trusted_paths = ["src1/"]
    /// "#).unwrap();
    ///
    /// assert_eq!(config.notebook_extension, ".nb");
    /// assert_eq!(config.manifest_file, "bundle.yaml");
    /// assert_eq!(config.trust.trusted_paths, vec!["src1/".to_string()]);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|e| ContentsError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::Config`] if the file cannot be read or is
    /// invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|e| ContentsError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        tracing::debug!("Loaded tree configuration from {}", path.display());
        Self::from_toml_str(&input)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ContentsError::Config`] if:
    /// - the notebook extension does not start with '.' or contains '/'
    /// - the manifest file name is empty, contains '/', or is a notebook
    /// - any mime type is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use contents_core::TreeConfig;
    ///
    /// let mut config = TreeConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.notebook_extension = "ipynb".to_string();
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(ContentsError::Config { message });

        if !self.notebook_extension.starts_with('.') || self.notebook_extension.len() < 2 {
            return invalid(format!(
                "notebook_extension '{}' must start with '.'",
                self.notebook_extension
            ));
        }
        if self.notebook_extension.contains('/') {
            return invalid("notebook_extension cannot contain '/'".to_string());
        }
        if self.manifest_file.is_empty() || self.manifest_file.contains('/') {
            return invalid(format!(
                "manifest_file '{}' must be a plain file name",
                self.manifest_file
            ));
        }
        if self.manifest_file.ends_with(&self.notebook_extension) {
            return invalid("manifest_file cannot be a notebook".to_string());
        }

        for (field, value) in [
            ("manifest_mime_type", &self.manifest_mime_type),
            ("text_mime_type", &self.text_mime_type),
            ("binary_mime_type", &self.binary_mime_type),
            ("notebook_mime_type", &self.notebook_mime_type),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("{field} cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Builder for [`TreeConfig`].
#[derive(Debug, Default)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
}

impl TreeConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the notebook extension.
    #[must_use]
    pub fn notebook_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.notebook_extension = extension.into();
        self
    }

    /// Sets the manifest file name.
    #[must_use]
    pub fn manifest_file(mut self, name: impl Into<String>) -> Self {
        self.config.manifest_file = name.into();
        self
    }

    /// Sets the text mime type.
    #[must_use]
    pub fn text_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.config.text_mime_type = mime_type.into();
        self
    }

    /// Sets the trust secret.
    #[must_use]
    pub fn trust_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.trust.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Adds an always-trusted path prefix.
    #[must_use]
    pub fn trusted_path(mut self, prefix: impl Into<String>) -> Self {
        self.config.trust.trusted_paths.push(prefix.into());
        self
    }

    /// Sets the directory persisting notebook signatures.
    #[must_use]
    pub fn trust_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.trust.data_dir = Some(dir.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TreeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(TreeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TreeConfig::builder()
            .notebook_extension(".nb")
            .manifest_file("manifest.yaml")
            .trust_secret("s3cret")
            .trusted_path("src1/")
            .build();

        assert_eq!(config.notebook_extension, ".nb");
        assert_eq!(config.manifest_file, "manifest.yaml");
        assert_eq!(
            config.trust.secret.as_ref().map(ExposeSecret::expose_secret),
            Some("s3cret")
        );
        assert_eq!(config.trust.trusted_paths, vec!["src1/".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let config = TreeConfig::builder().notebook_extension(".").build();
        assert!(config.validate().is_err());

        let config = TreeConfig::builder().notebook_extension("./x").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_manifest() {
        let config = TreeConfig::builder().manifest_file("a/b.yaml").build();
        assert!(config.validate().is_err());

        let config = TreeConfig::builder().manifest_file("meta.ipynb").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_mime() {
        let config = TreeConfig::builder().text_mime_type(" ").build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("text_mime_type"));
    }

    #[test]
    fn test_from_toml_reads_secret() {
        let config = TreeConfig::from_toml_str(
            r#"
            [trust]
            secret = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.trust.secret.as_ref().map(ExposeSecret::expose_secret),
            Some("hunter2")
        );
    }

    #[test]
    fn test_from_toml_reads_trust_data_dir() {
        let config = TreeConfig::from_toml_str(
            r#"
            [trust]
            data_dir = "/var/lib/contents/trust"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.trust.data_dir,
            Some(PathBuf::from("/var/lib/contents/trust"))
        );
        assert_eq!(TreeConfig::default().trust.data_dir, None);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let err = TreeConfig::from_toml_str("notebook_extension = 3").unwrap_err();
        assert_eq!(err.status_code(), 500);

        assert!(TreeConfig::from_toml_str("notebook_extension = \"nb\"").is_err());
    }

    #[test]
    fn test_serialized_config_hides_secret() {
        let config = TreeConfig::builder().trust_secret("hunter2").build();
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("notebook_extension"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "manifest_file = \"meta.yaml\"").unwrap();

        let config = TreeConfig::load(file.path()).unwrap();
        assert_eq!(config.manifest_file, "meta.yaml");
    }

    #[test]
    fn test_load_missing_file() {
        let err = TreeConfig::load("/nonexistent/contents.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
