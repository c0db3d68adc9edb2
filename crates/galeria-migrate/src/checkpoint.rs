//! Resumable progress
//!
//! The checkpoint file holds the ids of every record whose destination write
//! succeeded. It is rewritten through a temporary file and a rename after each
//! commit, so a crash leaves either the previous or the new version.

use galeria_core::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to access checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    version: u32,
    committed: BTreeSet<RecordId>,
}

#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    committed: Mutex<BTreeSet<RecordId>>,
}

impl Checkpoint {
    /// Load the checkpoint at `path`; a missing file is an empty checkpoint.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();

        let committed = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let file: CheckpointFile =
                    serde_json::from_slice(&raw).map_err(|e| CheckpointError::Corrupt {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                if file.version != CHECKPOINT_VERSION {
                    return Err(CheckpointError::Corrupt {
                        path,
                        message: format!("unsupported version {}", file.version),
                    });
                }
                file.committed
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        tracing::info!(
            checkpoint = %path.display(),
            committed = committed.len(),
            "Checkpoint loaded"
        );

        Ok(Self {
            path,
            committed: Mutex::new(committed),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_committed(&self, id: &RecordId) -> bool {
        self.committed.lock().await.contains(id)
    }

    pub async fn committed_count(&self) -> usize {
        self.committed.lock().await.len()
    }

    /// Record `id` as committed and persist the checkpoint.
    pub async fn mark_committed(&self, id: &RecordId) -> Result<(), CheckpointError> {
        // Held across the write so concurrent marks persist in order.
        let mut committed = self.committed.lock().await;
        if !committed.insert(id.clone()) {
            return Ok(());
        }

        let file = CheckpointFile {
            version: CHECKPOINT_VERSION,
            committed: committed.clone(),
        };
        self.persist(&file).await
    }

    async fn persist(&self, file: &CheckpointFile) -> Result<(), CheckpointError> {
        let io_err = |source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        };

        let raw = serde_json::to_vec_pretty(file).map_err(|e| CheckpointError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut partial = self.path.clone().into_os_string();
        partial.push(format!(".tmp-{}", Uuid::new_v4().simple()));
        let partial = PathBuf::from(partial);

        if let Err(e) = tokio::fs::write(&partial, &raw).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(io_err(e));
        }
        if let Err(e) = tokio::fs::rename(&partial, &self.path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(io_err(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::load(dir.path().join("checkpoint.json"))
            .await
            .unwrap();
        assert_eq!(checkpoint.committed_count().await, 0);
        assert!(!checkpoint.is_committed(&RecordId::new("1")).await);
    }

    #[tokio::test]
    async fn test_marks_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/checkpoint.json");

        let checkpoint = Checkpoint::load(&path).await.unwrap();
        checkpoint.mark_committed(&RecordId::new("7")).await.unwrap();
        checkpoint.mark_committed(&RecordId::new("8")).await.unwrap();
        checkpoint.mark_committed(&RecordId::new("7")).await.unwrap();

        let reloaded = Checkpoint::load(&path).await.unwrap();
        assert_eq!(reloaded.committed_count().await, 2);
        assert!(reloaded.is_committed(&RecordId::new("7")).await);
        assert!(reloaded.is_committed(&RecordId::new("8")).await);

        // Only the checkpoint itself is left in the directory
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("state"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = Checkpoint::load(&path).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt { .. }));
    }
}
