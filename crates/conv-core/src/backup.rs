//! Backups of settings files taken before a conversion
//!
//! Each backup is a timestamped directory under `.settings-backup/` holding
//! copies of the affected files and a `metadata.toml` describing them.

use std::fs;

use chrono::{DateTime, Utc};
use conv_fs::checksum::compute_file_checksum;
use conv_fs::{ConfigStore, NormalizedPath, SettingsLayout};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const METADATA_FILE: &str = "metadata.toml";

/// Directory inside a backup holding files from outside the workspace root.
const EXTERNAL_DIR: &str = "external";

/// One backed up file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Where the file lives (relative to the workspace root when inside it)
    pub original: String,
    /// Where the copy lives, relative to the backup directory
    pub stored: String,
    /// SHA-256 of the content at backup time
    pub checksum: String,
}

/// Metadata written next to the copies of a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// When the backup was created
    pub created: DateTime<Utc>,
    /// Converters about to run when the backup was taken
    #[serde(default)]
    pub converters: Vec<String>,
    #[serde(default)]
    pub files: Vec<BackupEntry>,
}

/// A backup on disk
#[derive(Debug, Clone)]
pub struct Backup {
    /// Path to the backup directory
    pub path: NormalizedPath,
    pub metadata: BackupMetadata,
}

/// Creates, lists and restores conversion backups of one workspace
pub struct BackupManager {
    root: NormalizedPath,
    backups_dir: NormalizedPath,
}

impl BackupManager {
    pub fn new(layout: &SettingsLayout) -> Self {
        Self {
            root: layout.root.clone(),
            backups_dir: layout.backup_dir(),
        }
    }

    pub fn backups_dir(&self) -> &NormalizedPath {
        &self.backups_dir
    }

    /// Copy every existing file of `files` into a new backup directory.
    ///
    /// Files that do not exist yet are skipped; there is nothing to restore.
    pub fn create_backup(&self, files: &[NormalizedPath], converters: &[String]) -> Result<Backup> {
        let created = Utc::now();
        let backup_dir = self.unique_backup_dir(&created);
        fs::create_dir_all(backup_dir.to_native()).map_err(|e| conv_fs::Error::io(backup_dir.to_native(), e))?;

        let mut entries = Vec::new();
        for (n, file) in files.iter().enumerate() {
            if !file.is_file() {
                continue;
            }
            let (original, stored) = match file.relative_to(&self.root) {
                Some(relative) if !relative.is_empty() => (relative.to_string(), relative.to_string()),
                _ => (
                    file.as_str().to_string(),
                    format!("{EXTERNAL_DIR}/{n}/{}", file.file_name().unwrap_or("file")),
                ),
            };

            let dest = backup_dir.join(&stored);
            copy_file(file, &dest)?;
            entries.push(BackupEntry {
                original,
                stored,
                checksum: compute_file_checksum(file)?,
            });
        }

        let metadata = BackupMetadata {
            created,
            converters: converters.to_vec(),
            files: entries,
        };
        ConfigStore::new().save(&backup_dir.join(METADATA_FILE), &metadata)?;
        tracing::info!(backup = %backup_dir, files = metadata.files.len(), "created settings backup");

        Ok(Backup {
            path: backup_dir,
            metadata,
        })
    }

    /// Every backup with readable metadata, oldest first.
    pub fn list_backups(&self) -> Result<Vec<Backup>> {
        if !self.backups_dir.is_dir() {
            return Ok(Vec::new());
        }
        let native = self.backups_dir.to_native();
        let mut backups = Vec::new();
        for entry in fs::read_dir(&native).map_err(|e| conv_fs::Error::io(&native, e))? {
            let entry = entry.map_err(|e| conv_fs::Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            let metadata_path = path.join(METADATA_FILE);
            if !metadata_path.is_file() {
                continue;
            }
            match ConfigStore::new().load::<BackupMetadata>(&metadata_path) {
                Ok(metadata) => backups.push(Backup { path, metadata }),
                Err(e) => tracing::warn!(backup = %path, error = %e, "skipping unreadable backup"),
            }
        }
        backups.sort_by(|a, b| {
            a.metadata
                .created
                .cmp(&b.metadata.created)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(backups)
    }

    /// The most recent backup, if any.
    pub fn latest_backup(&self) -> Result<Option<Backup>> {
        Ok(self.list_backups()?.pop())
    }

    /// Copy the files of `backup` back to where they came from.
    ///
    /// Each copy is checked against its recorded checksum before anything is
    /// written.
    pub fn restore_backup(&self, backup: &Backup) -> Result<Vec<NormalizedPath>> {
        let mut pending = Vec::with_capacity(backup.metadata.files.len());
        for entry in &backup.metadata.files {
            let source = backup.path.join(&entry.stored);
            if source.relative_to(&backup.path).is_none() {
                return Err(Error::cannot_convert(format!(
                    "backup entry escapes the backup directory: {}",
                    entry.stored
                )));
            }
            let checksum = compute_file_checksum(&source)?;
            if checksum != entry.checksum {
                return Err(Error::cannot_convert_file(&source, "backup copy does not match its checksum"));
            }
            let dest = self.root.join(&entry.original);
            if !NormalizedPath::new(&entry.original).is_absolute() && dest.relative_to(&self.root).is_none() {
                return Err(Error::cannot_convert(format!(
                    "refusing to restore outside the workspace: {}",
                    entry.original
                )));
            }
            pending.push((source, dest));
        }

        let mut restored = Vec::with_capacity(pending.len());
        for (source, dest) in pending {
            copy_file(&source, &dest)?;
            tracing::debug!(file = %dest, "restored from backup");
            restored.push(dest);
        }
        Ok(restored)
    }

    fn unique_backup_dir(&self, created: &DateTime<Utc>) -> NormalizedPath {
        let stamp = created.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let mut candidate = self.backups_dir.join(&stamp);
        let mut n = 1;
        while candidate.exists() {
            candidate = self.backups_dir.join(&format!("{stamp}-{n}"));
            n += 1;
        }
        candidate
    }
}

fn copy_file(source: &NormalizedPath, dest: &NormalizedPath) -> Result<()> {
    let dest_native = dest.to_native();
    if let Some(parent) = dest_native.parent() {
        fs::create_dir_all(parent).map_err(|e| conv_fs::Error::io(parent, e))?;
    }
    fs::copy(source.to_native(), &dest_native).map_err(|e| conv_fs::Error::io(&dest_native, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SettingsLayout) {
        let dir = TempDir::new().unwrap();
        let root = NormalizedPath::new(dir.path());
        fs::write(root.join("project.toml").to_native(), "version = 1\n").unwrap();
        (dir, SettingsLayout::single_file(root.join("project.toml")))
    }

    #[test]
    fn create_and_restore() {
        let (_dir, layout) = setup();
        let manager = BackupManager::new(&layout);

        let backup = manager
            .create_backup(&[layout.project_file.clone()], &["bump".to_string()])
            .unwrap();
        assert_eq!(backup.metadata.files.len(), 1);
        assert_eq!(backup.metadata.files[0].original, "project.toml");
        assert!(backup.path.join("project.toml").is_file());

        fs::write(layout.project_file.to_native(), "version = 2\n").unwrap();
        let restored = manager.restore_backup(&backup).unwrap();
        assert_eq!(restored, vec![layout.project_file.clone()]);
        assert_eq!(
            fs::read_to_string(layout.project_file.to_native()).unwrap(),
            "version = 1\n"
        );
    }

    #[test]
    fn missing_files_are_skipped() {
        let (_dir, layout) = setup();
        let manager = BackupManager::new(&layout);
        let backup = manager
            .create_backup(&[layout.workspace_file.clone()], &[])
            .unwrap();
        assert!(backup.metadata.files.is_empty());
    }

    #[test]
    fn list_backups_oldest_first() {
        let (_dir, layout) = setup();
        let manager = BackupManager::new(&layout);
        assert!(manager.list_backups().unwrap().is_empty());

        let first = manager.create_backup(&[layout.project_file.clone()], &[]).unwrap();
        let second = manager.create_backup(&[layout.project_file.clone()], &[]).unwrap();
        assert_ne!(first.path, second.path);

        let listed = manager.list_backups().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(manager.latest_backup().unwrap().unwrap().path, listed[1].path);
    }

    #[test]
    fn tampered_copy_is_refused() {
        let (_dir, layout) = setup();
        let manager = BackupManager::new(&layout);
        let backup = manager.create_backup(&[layout.project_file.clone()], &[]).unwrap();
        fs::write(backup.path.join("project.toml").to_native(), "tampered").unwrap();
        assert!(manager.restore_backup(&backup).is_err());
    }
}
