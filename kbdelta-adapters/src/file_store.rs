//! Change store backed by a single JSON file.

use async_trait::async_trait;
use chrono::Utc;
use kbdelta_core::{ChangeStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const FILE_FORMAT_VERSION: u32 = 1;

/// On-disk wrapper around the encoded blob.
#[derive(Debug, Serialize, Deserialize)]
struct ChangeFile {
    version: u32,
    saved_at: String,
    changes: Value,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ChangeStore for FileStore {
    async fn save(&self, blob: &Value) -> Result<(), StoreError> {
        let file = ChangeFile {
            version: FILE_FORMAT_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            changes: blob.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(StoreError::backend)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::backend)?;
        }

        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(StoreError::backend)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StoreError::backend)?;

        tracing::debug!(path = %self.path.display(), "Wrote change file");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::backend(e)),
        };

        let file: ChangeFile = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Backend(format!("{} is not a change file: {}", self.path.display(), e))
        })?;
        if file.version > FILE_FORMAT_VERSION {
            return Err(StoreError::Backend(format!(
                "{} has unsupported version {}",
                self.path.display(),
                file.version
            )));
        }

        tracing::debug!(path = %self.path.display(), saved_at = %file.saved_at, "Read change file");
        Ok(Some(file.changes))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
