//! `contents`: browse and edit a bundle library from the command line.
//!
//! The library is a directory holding `source/name-version` bundles. Paths
//! use the same three-level layout a notebook front end sees:
//!
//! ```bash
//! # Create a bundle and list it
//! contents new-bundle example.com test 0.0.1
//! contents ls example.com/test-0.0.1
//!
//! # Upload, read, rename, and delete files
//! contents put example.com/test-0.0.1/analysis.ipynb --from ./analysis.ipynb
//! contents cat example.com/test-0.0.1/bundle.yaml
//! contents mv example.com/test-0.0.1/analysis.ipynb example.com/test-0.0.1/final.ipynb
//! contents rm example.com/test-0.0.1/final.ipynb
//! ```
//!
//! Exit codes: 0 on success, 1 on store failures, 2 on rejected requests,
//! 3 when a path does not exist.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use contents_cli::ConfigAction;
use contents_cli::cli::{ExitCode, OutputFormat};
use contents_cli::commands::common::DirTree;
use contents_cli::commands::{self, cat::Encoding, config::Config, put::PutKind};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Browse and edit a library of versioned bundles.
#[derive(Parser, Debug)]
#[command(name = "contents")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Library root directory (overrides the configuration file)
    #[arg(long, global = true, env = "CONTENTS_LIBRARY")]
    library: Option<PathBuf>,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, env = "CONTENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true)]
    format: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty bundle holding only its manifest.
    NewBundle {
        /// Source the bundle belongs to (e.g. a domain)
        source: String,
        /// Bundle name
        name: String,
        /// Bundle version
        version: String,
    },

    /// List a source, bundle, or the library root.
    Ls {
        /// Content path, empty for the root
        #[arg(default_value = "")]
        path: String,
    },

    /// Print the content of a file or notebook.
    Cat {
        /// Content path of the file
        path: String,

        /// Encoding of plain file content
        #[arg(long, value_enum)]
        encoding: Option<Encoding>,
    },

    /// Upload a local file into a bundle.
    Put {
        /// Target content path
        path: String,

        /// Local file to upload
        #[arg(long)]
        from: PathBuf,

        /// Declared type (default: inferred from the extension)
        #[arg(long = "type", value_enum)]
        kind: Option<PutKind>,
    },

    /// Delete a file.
    Rm {
        /// Content path of the file
        path: String,
    },

    /// Rename a file within its bundle.
    Mv {
        /// Current content path
        from: String,
        /// New content path
        to: String,
    },

    /// Manage the configuration file.
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match init_logging(cli.verbose).and_then(|()| execute(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from_error(&e)
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging to stderr.
///
/// `-v` forces debug level; otherwise `RUST_LOG` applies, defaulting to
/// warnings so command output stays clean.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Routes the command to its handler.
fn execute(cli: Cli) -> Result<ExitCode> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => commands::config::default_config_path()?,
    };
    let open = || open_tree(cli.library.as_deref(), cli.format.as_deref(), &config_path);

    match cli.command {
        Commands::Config { action } => {
            let format = cli.format.as_deref().unwrap_or("pretty").parse()?;
            commands::config::run(&action, &config_path, format)
        }
        Commands::NewBundle {
            source,
            name,
            version,
        } => {
            let (tree, format) = open()?;
            commands::new_bundle::run(&tree, &source, &name, &version, format)
        }
        Commands::Ls { path } => {
            let (tree, format) = open()?;
            commands::ls::run(&tree, &path, format)
        }
        Commands::Cat { path, encoding } => {
            let (tree, format) = open()?;
            commands::cat::run(&tree, &path, encoding, format)
        }
        Commands::Put { path, from, kind } => {
            let (tree, format) = open()?;
            commands::put::run(&tree, &path, &from, kind, format)
        }
        Commands::Rm { path } => {
            let (tree, format) = open()?;
            commands::rm::run(&tree, &path, format)
        }
        Commands::Mv { from, to } => {
            let (tree, format) = open()?;
            commands::mv::run(&tree, &from, &to, format)
        }
    }
}

/// Loads the configuration and opens the library it points to.
///
/// Command-line options take precedence over the configuration file.
fn open_tree(
    library: Option<&Path>,
    format: Option<&str>,
    config_path: &Path,
) -> Result<(DirTree, OutputFormat)> {
    let config = Config::load(config_path)?;
    let output_format = format
        .unwrap_or(&config.general.default_format)
        .parse()?;
    let root = library.map_or_else(|| config.general.library.clone(), Path::to_path_buf);
    let tree = commands::common::open_tree(&root, config.tree)?;
    Ok((tree, output_format))
}
