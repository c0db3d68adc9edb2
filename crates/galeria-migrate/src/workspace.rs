//! Staging area for per-asset temporary files
//!
//! Every staged file is named `{role}_{record_id}_{index}_{random}.{ext}` inside
//! the workspace root and is created exclusively. The file is removed when its
//! `StagingFile` handle is dropped, whichever way the asset pipeline exits.
//! Files left behind by a killed process are swept when the workspace opens.

use galeria_core::{MigrationError, MigrationResult, RecordId};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingRole {
    Input,
    Output,
}

impl StagingRole {
    const ALL: [StagingRole; 2] = [StagingRole::Input, StagingRole::Output];

    pub fn as_str(self) -> &'static str {
        match self {
            StagingRole::Input => "input",
            StagingRole::Output => "output",
        }
    }
}

impl Display for StagingRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A staged file owned by one asset pipeline invocation.
#[derive(Debug)]
pub struct StagingFile {
    file: NamedTempFile,
}

impl StagingFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[derive(Debug)]
pub struct TempWorkspace {
    root: PathBuf,
}

impl TempWorkspace {
    /// Create the staging root if needed and remove leftovers of earlier runs.
    pub async fn open(root: impl Into<PathBuf>) -> MigrationResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            MigrationError::Staging(format!(
                "Failed to create staging directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let workspace = Self { root };
        let swept = workspace.sweep().await.map_err(|e| {
            MigrationError::Staging(format!(
                "Failed to sweep staging directory {}: {}",
                workspace.root.display(),
                e
            ))
        })?;
        if swept > 0 {
            tracing::info!(
                staging_dir = %workspace.root.display(),
                removed = swept,
                "Removed staging files left by a previous run"
            );
        }

        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn sweep(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let is_staged = StagingRole::ALL
                .iter()
                .any(|role| name.starts_with(&format!("{}_", role)));
            if is_staged && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Stage `data` as a new file.
    pub async fn stage(
        &self,
        record_id: &RecordId,
        index: usize,
        role: StagingRole,
        extension: &str,
        data: &[u8],
    ) -> MigrationResult<StagingFile> {
        let staged = self.reserve(record_id, index, role, extension)?;
        tokio::fs::write(staged.path(), data).await.map_err(|e| {
            MigrationError::Staging(format!(
                "Failed to write {}: {}",
                staged.path().display(),
                e
            ))
        })?;
        Ok(staged)
    }

    /// Create a new empty file for a later writer (e.g. the transcoder).
    pub fn reserve(
        &self,
        record_id: &RecordId,
        index: usize,
        role: StagingRole,
        extension: &str,
    ) -> MigrationResult<StagingFile> {
        let file = tempfile::Builder::new()
            .prefix(&staging_prefix(record_id, index, role))
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.root)
            .map_err(|e| {
                MigrationError::Staging(format!(
                    "Failed to create staging file in {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
        Ok(StagingFile { file })
    }

    /// Staged files currently present for one asset, in either role.
    pub fn staged_files(&self, record_id: &RecordId, index: usize) -> std::io::Result<Vec<PathBuf>> {
        let prefixes: Vec<String> = StagingRole::ALL
            .iter()
            .map(|role| staging_prefix(record_id, index, *role))
            .collect();

        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
                found.push(entry.path());
            }
        }
        Ok(found)
    }
}

/// `_` separates the name parts, so it is escaped inside the record id.
fn staging_prefix(record_id: &RecordId, index: usize, role: StagingRole) -> String {
    let id = urlencoding::encode(record_id.as_str()).replace('_', "%5F");
    format!("{}_{}_{}_", role, id, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staging_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::open(dir.path().join("temp_images")).await.unwrap();
        let id = RecordId::new("7");

        let input = workspace
            .stage(&id, 0, StagingRole::Input, "jpg", b"raw")
            .await
            .unwrap();
        let output = workspace.reserve(&id, 0, StagingRole::Output, "webp").unwrap();

        let name = input.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("input_7_0_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(std::fs::read(input.path()).unwrap(), b"raw");
        assert_eq!(workspace.staged_files(&id, 0).unwrap().len(), 2);

        drop(input);
        drop(output);
        assert!(workspace.staged_files(&id, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_asset_staged_twice_gets_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::open(dir.path()).await.unwrap();
        let id = RecordId::new("7");

        let first = workspace.reserve(&id, 0, StagingRole::Input, "jpg").unwrap();
        let second = workspace.reserve(&id, 0, StagingRole::Input, "jpg").unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[tokio::test]
    async fn test_ids_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::open(dir.path()).await.unwrap();

        let _a = workspace
            .reserve(&RecordId::new("1_1"), 1, StagingRole::Input, "jpg")
            .unwrap();
        assert!(workspace
            .staged_files(&RecordId::new("1"), 1)
            .unwrap()
            .is_empty());
        assert_eq!(
            workspace
                .staged_files(&RecordId::new("1_1"), 1)
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_open_sweeps_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("input_7_0_abc.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("output_7_0_def.webp"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        TempWorkspace::open(dir.path()).await.unwrap();

        let remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining, vec!["notes.txt".to_string()]);
    }
}
