//! Config command implementation.
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/bundle-contents/config.toml`
//! - macOS: `~/Library/Application Support/bundle-contents/config.toml`
//! - Windows: `%APPDATA%\bundle-contents\config.toml`
//!
//! ```toml
//! [general]
//! library = "/srv/bundles"
//! default_format = "pretty"
//!
//! [tree]
//! notebook_extension = ".ipynb"
//! manifest_file = "bundle.yaml"
//!
//! [tree.trust]
//! secret = "change-me"
//! trusted_paths = ["example.com/"]
//! data_dir = "/srv/bundles/.trust"
//! ```

use crate::actions::ConfigAction;
use crate::cli::{ExitCode, OutputFormat};
use anyhow::{Context, Result};
use contents_core::TreeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "bundle-contents";

/// CLI configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Content tree settings
    #[serde(default)]
    pub tree: TreeConfig,
}

/// General configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory of the bundle library
    pub library: PathBuf,

    /// Default output format (json, text, pretty)
    pub default_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            library: default_library_dir(),
            default_format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the output format or the tree settings are invalid.
    pub fn validate(&self) -> Result<()> {
        self.general
            .default_format
            .parse::<OutputFormat>()
            .context("invalid general.default_format")?;
        self.tree.validate()?;
        Ok(())
    }

    /// Loads the configuration from `path`, or returns defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("failed to parse config file")?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, toml_str).context("failed to write config file")?;

        debug!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Returns the default configuration file path.
///
/// # Errors
///
/// Returns an error if the platform config directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("failed to determine config directory")?;
    Ok(config_dir.join(APP_DIR).join("config.toml"))
}

fn default_library_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".").join(APP_DIR),
        |dir| dir.join(APP_DIR).join("library"),
    )
}

/// Initialization result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitResult {
    /// Whether a new file was written
    pub created: bool,
    /// Status message
    pub message: String,
    /// Path of the configuration file
    pub path: String,
}

/// Runs the config command against the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or written.
pub fn run(action: &ConfigAction, path: &Path, output_format: OutputFormat) -> Result<ExitCode> {
    info!("Config action: {action:?}");

    let output = match action {
        ConfigAction::Init => crate::formatters::format_output(&init(path)?, output_format),
        ConfigAction::Show => crate::formatters::format_output(&Config::load(path)?, output_format),
    }
    .context("failed to format configuration")?;
    println!("{output}");

    Ok(ExitCode::SUCCESS)
}

/// Writes a default configuration file unless one already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn init(path: &Path) -> Result<InitResult> {
    if path.exists() {
        return Ok(InitResult {
            created: false,
            message: "configuration file already exists".to_string(),
            path: path.display().to_string(),
        });
    }

    Config::default().save(path)?;
    Ok(InitResult {
        created: true,
        message: "configuration file created with default values".to_string(),
        path: path.display().to_string(),
    })
}
