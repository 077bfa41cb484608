//! Versioned JSON files in a `.storage/` directory
//!
//! Every file wraps its payload in an envelope:
//!
//! ```json
//! {
//!   "version": 1,
//!   "minor_version": 1,
//!   "key": "budget_autopilot.dataset",
//!   "data": { ... }
//! }
//! ```

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Envelope around a stored payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    /// Bumped on breaking layout changes
    pub version: u32,
    /// Bumped on additive changes
    pub minor_version: u32,
    /// File name inside the storage directory
    pub key: String,
    pub data: T,
}

/// A payload type with a fixed storage key and version
pub trait Storable: Serialize + DeserializeOwned {
    const KEY: &'static str;
    const VERSION: u32;
    const MINOR_VERSION: u32;

    /// Wrap in an envelope at the current version
    fn envelope(&self) -> StorageFile<&Self> {
        StorageFile {
            version: Self::VERSION,
            minor_version: Self::MINOR_VERSION,
            key: Self::KEY.to_string(),
            data: self,
        }
    }
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
    minor_version: u32,
}

/// Handle on a `.storage/` directory
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Storage rooted at `<root>/.storage`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(".storage"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    /// Create the directory if needed
    pub async fn ensure_dir(&self) -> StoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            debug!(dir = ?self.dir, "Created storage directory");
        }
        Ok(())
    }

    /// Load a payload, or `None` when the file does not exist
    ///
    /// Fails with [`StoreError::MigrationRequired`] when the major version
    /// differs; an older minor version only warns.
    pub async fn load<T: Storable>(&self) -> StoreResult<Option<T>> {
        let path = self.file_path(T::KEY);
        if !path.exists() {
            debug!(key = T::KEY, "Storage file not found");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let header: VersionHeader = serde_json::from_str(&content)?;

        if header.version != T::VERSION {
            return Err(StoreError::MigrationRequired {
                key: T::KEY.to_string(),
                from: header.version,
                to: T::VERSION,
            });
        }
        if header.minor_version < T::MINOR_VERSION {
            warn!(
                key = T::KEY,
                found = header.minor_version,
                expected = T::MINOR_VERSION,
                "Storage file has an older minor version"
            );
        }

        let file: StorageFile<T> = serde_json::from_str(&content)?;
        debug!(key = T::KEY, version = file.version, "Loaded storage file");
        Ok(Some(file.data))
    }

    /// Load a payload that must exist
    pub async fn load_required<T: Storable>(&self) -> StoreResult<T> {
        self.load().await?.ok_or_else(|| StoreError::NotFound {
            key: T::KEY.to_string(),
        })
    }

    /// Write a payload via temp file and rename
    pub async fn save<T: Storable>(&self, data: &T) -> StoreResult<()> {
        self.ensure_dir().await?;

        let path = self.file_path(T::KEY);
        let temp_path = self.file_path(&format!("{}.tmp", T::KEY));

        let content = serde_json::to_string_pretty(&data.envelope())?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(key = T::KEY, "Saved storage file");
        Ok(())
    }
}
