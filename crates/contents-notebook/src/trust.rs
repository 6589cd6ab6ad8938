//! Notebook trust.
//!
//! A notebook is trusted when the active [`TrustPolicy`] vouches for it.
//! Trust is surfaced per code cell through the transient `trusted` metadata
//! flag: every code cell of a trusted notebook is marked trusted, while in
//! an untrusted notebook only cells without outputs are. Flags are set on
//! read and stripped again before a notebook is persisted.
//!
//! [`Notary`] remembers Blake3 keyed-hash signatures of notebooks it has
//! signed and trusts configured path prefixes. With a data directory it
//! keeps its signatures, and a generated secret when none is configured, in
//! files there, so trust survives restarts. [`TrustNone`] trusts only what
//! cannot carry untrusted output.
//!
//! # Examples
//!
//! ```
//! use contents_core::TrustConfig;
//! use contents_notebook::{Cell, CodeCell, Notary, Notebook, TrustPolicy};
//!
//! let notary = Notary::new(&TrustConfig::default());
//! let mut nb = Notebook::new();
//! nb.cells.push(Cell::Code(CodeCell::new("1 + 1")));
//!
//! assert!(!notary.is_trusted(&nb, "src/b-1.0/a.ipynb"));
//! notary.sign(&nb, "src/b-1.0/a.ipynb");
//! assert!(notary.is_trusted(&nb, "src/b-1.0/a.ipynb"));
//! ```

use crate::document::{Notebook, TRUSTED_KEY};
use contents_core::TrustConfig;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Key derivation context for notebook signatures.
const SIGNATURE_CONTEXT: &str = "bundle-contents 2024 notebook signatures";

/// Generated secret kept in the data directory.
pub const SECRET_FILE: &str = "notebook_secret";

/// Signature list kept in the data directory, one signature per line.
pub const SIGNATURES_FILE: &str = "notebook_signatures";

/// Decides whether a notebook is trusted and records new signatures.
pub trait TrustPolicy: Send + Sync + fmt::Debug {
    /// Returns `true` if the notebook stored at `path` is trusted.
    fn is_trusted(&self, notebook: &Notebook, path: &str) -> bool;

    /// Records that the notebook stored at `path` is trusted.
    fn sign(&self, notebook: &Notebook, path: &str);
}

/// Signature-keeping trust policy.
///
/// With a configured secret the same notebook always signs to the same
/// value. Without one, the secret comes from the data directory, or a
/// random key is drawn per instance. Signatures are appended to the data
/// directory when one is configured; failures to persist are logged and
/// the notary keeps working from memory.
pub struct Notary {
    key: [u8; 32],
    trusted_paths: Vec<String>,
    signatures: RwLock<HashSet<String>>,
    data_dir: Option<PathBuf>,
}

impl Notary {
    /// Creates a notary from the trust configuration.
    #[must_use]
    pub fn new(config: &TrustConfig) -> Self {
        let data_dir = config.data_dir.clone();
        let key = match (&config.secret, data_dir.as_deref()) {
            (Some(secret), _) => {
                blake3::derive_key(SIGNATURE_CONTEXT, secret.expose_secret().as_bytes())
            }
            (None, Some(dir)) => match load_or_create_secret(dir) {
                Ok(secret) => blake3::derive_key(SIGNATURE_CONTEXT, secret.as_bytes()),
                Err(e) => {
                    tracing::warn!("Failed to load notebook secret from {}: {}", dir.display(), e);
                    random_key()
                }
            },
            (None, None) => random_key(),
        };
        let signatures = data_dir.as_deref().map(load_signatures).unwrap_or_default();

        tracing::debug!(
            keyed = config.secret.is_some(),
            trusted_paths = config.trusted_paths.len(),
            signatures = signatures.len(),
            "Created notebook notary"
        );
        Self {
            key,
            trusted_paths: config.trusted_paths.clone(),
            signatures: RwLock::new(signatures),
            data_dir,
        }
    }

    /// Computes the signature of a notebook.
    ///
    /// Transient trust flags and any embedded signature are ignored, so
    /// marking a notebook does not change its signature.
    #[must_use]
    pub fn signature(&self, notebook: &Notebook) -> String {
        let mut canonical = notebook.clone();
        strip_trust(&mut canonical);
        canonical.metadata.remove("signature");

        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        // serde_json maps are ordered, so equal notebooks serialize equally.
        if serde_json::to_writer(&mut hasher, &canonical).is_err() {
            tracing::warn!("Failed to serialize notebook for signing");
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }

    /// Returns the number of recorded signatures.
    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.signatures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn is_trusted_path(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.trusted_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.trim_start_matches('/')))
    }
}

impl TrustPolicy for Notary {
    fn is_trusted(&self, notebook: &Notebook, path: &str) -> bool {
        if self.is_trusted_path(path) {
            return true;
        }
        let signature = self.signature(notebook);
        self.signatures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&signature)
    }

    fn sign(&self, notebook: &Notebook, path: &str) {
        let signature = self.signature(notebook);
        let added = self
            .signatures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature.clone());
        if !added {
            return;
        }
        tracing::debug!(path, "Signed notebook");
        let Some(dir) = &self.data_dir else {
            return;
        };
        if let Err(e) = append_signature(dir, &signature) {
            tracing::warn!("Failed to persist signature in {}: {}", dir.display(), e);
        }
    }
}

impl fmt::Debug for Notary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notary")
            .field("key", &"[REDACTED]")
            .field("trusted_paths", &self.trusted_paths)
            .field("signatures", &self.signature_count())
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

fn random_key() -> [u8; 32] {
    blake3::derive_key(SIGNATURE_CONTEXT, Uuid::new_v4().as_bytes())
}

fn load_or_create_secret(dir: &Path) -> io::Result<String> {
    let path = dir.join(SECRET_FILE);
    match fs::read_to_string(&path) {
        Ok(secret) if !secret.trim().is_empty() => return Ok(secret.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::create_dir_all(dir)?;
    let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut file) => {
            file.write_all(secret.as_bytes())?;
            tracing::info!("Generated notebook secret at {}", path.display());
            Ok(secret)
        }
        // Another process created it first.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Ok(fs::read_to_string(&path)?.trim().to_string())
        }
        Err(e) => Err(e),
    }
}

fn load_signatures(dir: &Path) -> HashSet<String> {
    let path = dir.join(SIGNATURES_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
        Err(e) => {
            tracing::warn!("Failed to read signatures from {}: {}", path.display(), e);
            HashSet::new()
        }
    }
}

fn append_signature(dir: &Path, signature: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(SIGNATURES_FILE))?;
    writeln!(file, "{signature}")
}

/// Policy that never trusts a notebook.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustNone;

impl TrustPolicy for TrustNone {
    fn is_trusted(&self, _notebook: &Notebook, _path: &str) -> bool {
        false
    }

    fn sign(&self, _notebook: &Notebook, _path: &str) {}
}

/// Sets the `trusted` flag on every code cell.
///
/// If the policy trusts the notebook all code cells are marked trusted.
/// Otherwise a cell is trusted only when it has no outputs.
pub fn mark_trusted_cells(notebook: &mut Notebook, policy: &dyn TrustPolicy, path: &str) {
    let trusted = policy.is_trusted(notebook, path);
    for cell in notebook.code_cells_mut() {
        let cell_trusted = trusted || cell.outputs.is_empty();
        cell.metadata
            .insert(TRUSTED_KEY.to_string(), Value::Bool(cell_trusted));
    }
}

/// Signs the notebook if every code cell is marked trusted.
///
/// Returns `true` if a signature was recorded.
pub fn check_and_sign(notebook: &Notebook, policy: &dyn TrustPolicy, path: &str) -> bool {
    if notebook.code_cells().all(|cell| cell.trusted() == Some(true)) {
        policy.sign(notebook, path);
        true
    } else {
        tracing::debug!(path, "Notebook not fully trusted, leaving unsigned");
        false
    }
}

/// Removes transient trust flags from every cell.
pub fn strip_trust(notebook: &mut Notebook) {
    for cell in &mut notebook.cells {
        cell.metadata_mut().remove(TRUSTED_KEY);
    }
}
