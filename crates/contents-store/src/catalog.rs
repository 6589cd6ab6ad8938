//! Bundle record bookkeeping shared by the stores.
//!
//! A [`BundleState`] holds a bundle handle and its file records. Both the
//! memory and the directory store mutate records through it, so naming
//! conflicts and record updates behave the same in each.

use crate::checksum::calculate_checksum;
use chrono::Utc;
use contents_core::{
    BundleHandle, BundleKey, ContentsError, DEFAULT_MANIFEST_FILE, FileClass, FileHandle,
    FileRecord, RecordId, Result, TreeConfig,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Manifest file seeded into every new bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// File name of the manifest
    pub file_name: String,
    /// Mime type of the manifest
    pub mime_type: String,
}

impl Manifest {
    /// Takes the manifest name and mime type from a tree configuration.
    #[must_use]
    pub fn from_config(config: &TreeConfig) -> Self {
        Self {
            file_name: config.manifest_file.clone(),
            mime_type: config.manifest_mime_type.clone(),
        }
    }

    /// Renders the initial manifest content for a bundle.
    #[must_use]
    pub fn render(handle: &BundleHandle) -> Vec<u8> {
        format!(
            "source: {}\nname: {}\nversion: {}\nvid: {}\n",
            handle.source(),
            handle.name,
            handle.version,
            handle.vid
        )
        .into_bytes()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_MANIFEST_FILE.to_string(),
            mime_type: "application/x-yaml".to_string(),
        }
    }
}

/// File record as persisted by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredFile {
    #[serde(flatten)]
    pub record: FileRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A bundle and its file records.
#[derive(Debug, Clone)]
pub(crate) struct BundleState {
    pub handle: BundleHandle,
    pub files: Vec<StoredFile>,
}

pub(crate) fn new_bundle_handle(source: &str, name: &str, version: &str) -> Result<BundleHandle> {
    Ok(BundleHandle {
        key: BundleKey::for_bundle(source, name, version)?,
        vid: Uuid::new_v4(),
        name: name.to_string(),
        version: version.to_string(),
        created: Utc::now(),
    })
}

impl BundleState {
    pub const fn new(handle: BundleHandle, files: Vec<StoredFile>) -> Self {
        Self { handle, files }
    }

    fn handle_of(&self, stored: &StoredFile) -> FileHandle {
        FileHandle {
            bundle: self.handle.key.clone(),
            record: stored.record.clone(),
        }
    }

    fn index_of(&self, id: RecordId) -> Result<usize> {
        self.files
            .iter()
            .position(|f| f.record.id == id)
            .ok_or_else(|| ContentsError::NotFound {
                path: format!("{}#{id}", self.handle.key),
            })
    }

    fn name_taken(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.record.name == name)
    }

    pub fn stored(&self, id: RecordId) -> Result<&StoredFile> {
        self.index_of(id).map(|i| &self.files[i])
    }

    pub fn resolve(&self, name: &str) -> Result<FileHandle> {
        self.files
            .iter()
            .find(|f| f.record.name == name)
            .map(|f| self.handle_of(f))
            .ok_or_else(|| ContentsError::NotFound {
                path: self.handle.key.file_path(name),
            })
    }

    pub fn list(&self) -> Vec<FileHandle> {
        self.files.iter().map(|f| self.handle_of(f)).collect()
    }

    pub fn create(&mut self, name: &str, class: FileClass, mime_type: &str) -> Result<FileHandle> {
        if self.name_taken(name) {
            return Err(ContentsError::Conflict {
                path: self.handle.key.file_path(name),
            });
        }
        let stored = StoredFile {
            record: FileRecord::new(name, class, mime_type),
            checksum: None,
        };
        let handle = self.handle_of(&stored);
        self.files.push(stored);
        Ok(handle)
    }

    pub fn record_written(
        &mut self,
        id: RecordId,
        content: &[u8],
        mime_type: &str,
    ) -> Result<FileHandle> {
        let index = self.index_of(id)?;
        let stored = &mut self.files[index];
        stored.record.size = Some(content.len() as u64);
        stored.record.modified = Some(Utc::now());
        stored.record.mime_type = mime_type.to_string();
        stored.checksum = Some(calculate_checksum(content));
        Ok(self.handle_of(&self.files[index]))
    }

    pub fn record_cleared(&mut self, id: RecordId) -> Result<()> {
        let index = self.index_of(id)?;
        let stored = &mut self.files[index];
        stored.record.size = None;
        stored.checksum = None;
        Ok(())
    }

    pub fn remove(&mut self, id: RecordId) -> Result<StoredFile> {
        let index = self.index_of(id)?;
        Ok(self.files.remove(index))
    }

    pub fn find(&self, id: RecordId) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.record.id == id)
    }

    /// Replaces record `id` with a session's copy of it, or drops it when
    /// `staged` is `None`.
    ///
    /// Unless `content_changed`, the live record keeps its size, timestamp,
    /// mime type, and checksum. A record holding the same name under another
    /// id is displaced, and its id is returned so the caller can drop its
    /// content.
    pub fn apply(
        &mut self,
        id: RecordId,
        staged: Option<&StoredFile>,
        content_changed: bool,
    ) -> Option<RecordId> {
        let Some(staged) = staged else {
            self.files.retain(|f| f.record.id != id);
            return None;
        };

        let displaced = self
            .files
            .iter()
            .position(|f| f.record.id != id && f.record.name == staged.record.name)
            .map(|i| self.files.remove(i).record.id);
        match self.files.iter().position(|f| f.record.id == id) {
            Some(i) if content_changed => self.files[i] = staged.clone(),
            Some(i) => self.files[i].record.name.clone_from(&staged.record.name),
            None => self.files.push(staged.clone()),
        }
        displaced
    }

    pub fn rename(&mut self, id: RecordId, new_name: &str) -> Result<FileHandle> {
        let index = self.index_of(id)?;
        if self.files[index].record.name != new_name && self.name_taken(new_name) {
            return Err(ContentsError::Conflict {
                path: self.handle.key.file_path(new_name),
            });
        }
        self.files[index].record.name = new_name.to_string();
        Ok(self.handle_of(&self.files[index]))
    }
}
