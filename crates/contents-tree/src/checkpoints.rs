//! Checkpoint capability.
//!
//! The library keeps no file history, so the tree ships with
//! [`NullCheckpoints`]: creating a checkpoint succeeds without storing
//! anything, listing always returns nothing, and restore, rename, and
//! delete do nothing. Hosts that need real checkpoints can plug in their
//! own [`Checkpoints`] implementation.

use chrono::{DateTime, Utc};
use contents_core::Result;
use serde::Serialize;
use std::fmt;

/// Identifier reported by [`NullCheckpoints::create`].
pub const NULL_CHECKPOINT_ID: &str = "checkpoint";

/// Model of a single checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointModel {
    /// Checkpoint identifier
    pub id: String,
    /// Time the checkpoint was taken
    pub last_modified: DateTime<Utc>,
}

/// Checkpoint store for content paths.
#[allow(clippy::missing_errors_doc)]
pub trait Checkpoints: Send + Sync + fmt::Debug {
    /// Takes a checkpoint of `path`.
    fn create(&self, path: &str) -> Result<CheckpointModel>;

    /// Lists checkpoints of `path`.
    fn list(&self, path: &str) -> Result<Vec<CheckpointModel>>;

    /// Restores `path` to a checkpoint.
    fn restore(&self, checkpoint_id: &str, path: &str) -> Result<()>;

    /// Moves a checkpoint from `old_path` to `new_path`.
    fn rename(&self, checkpoint_id: &str, old_path: &str, new_path: &str) -> Result<()>;

    /// Deletes a checkpoint.
    fn delete(&self, checkpoint_id: &str, path: &str) -> Result<()>;

    /// Moves every checkpoint of `old_path` to `new_path`.
    fn rename_all(&self, old_path: &str, new_path: &str) -> Result<()> {
        for checkpoint in self.list(old_path)? {
            self.rename(&checkpoint.id, old_path, new_path)?;
        }
        Ok(())
    }

    /// Deletes every checkpoint of `path`.
    fn delete_all(&self, path: &str) -> Result<()> {
        for checkpoint in self.list(path)? {
            self.delete(&checkpoint.id, path)?;
        }
        Ok(())
    }
}

/// Checkpoints that are never stored.
///
/// # Examples
///
/// ```
/// use contents_tree::{Checkpoints, NullCheckpoints};
///
/// let checkpoints = NullCheckpoints;
/// let created = checkpoints.create("src/b-1/a.ipynb").unwrap();
/// assert_eq!(created.id, "checkpoint");
/// assert!(checkpoints.list("src/b-1/a.ipynb").unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCheckpoints;

impl Checkpoints for NullCheckpoints {
    fn create(&self, path: &str) -> Result<CheckpointModel> {
        tracing::debug!(path, "Checkpoint requested, not stored");
        Ok(CheckpointModel {
            id: NULL_CHECKPOINT_ID.to_string(),
            last_modified: Utc::now(),
        })
    }

    fn list(&self, _path: &str) -> Result<Vec<CheckpointModel>> {
        Ok(Vec::new())
    }

    fn restore(&self, _checkpoint_id: &str, _path: &str) -> Result<()> {
        Ok(())
    }

    fn rename(&self, _checkpoint_id: &str, _old_path: &str, _new_path: &str) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _checkpoint_id: &str, _path: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_checkpoints_are_noops() {
        let checkpoints = NullCheckpoints;
        let before = Utc::now();
        let created = checkpoints.create("p").unwrap();

        assert_eq!(created.id, NULL_CHECKPOINT_ID);
        assert!(created.last_modified >= before);
        assert!(checkpoints.list("p").unwrap().is_empty());
        assert!(checkpoints.restore("checkpoint", "p").is_ok());
        assert!(checkpoints.rename_all("p", "q").is_ok());
        assert!(checkpoints.delete_all("p").is_ok());
    }

    #[test]
    fn test_checkpoint_model_serializes() {
        let value = serde_json::to_value(NullCheckpoints.create("p").unwrap()).unwrap();
        assert_eq!(value["id"], "checkpoint");
        assert!(value["last_modified"].is_string());
    }
}
