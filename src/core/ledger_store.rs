//! Canonical ledger store
//!
//! This module provides the LedgerStore component that owns the canonical
//! ledger file. Every mutation follows the same discipline:
//!
//! 1. Check the request against the current content (unknown id, duplicate
//!    id, structural problems) without touching any file
//! 2. Copy the current file to the backup path (itself staged and renamed);
//!    if that fails the mutation stops here
//! 3. Write the new content to a staging file beside the store, fsync it and
//!    read it back to confirm every row landed
//! 4. Rename the staging file over the canonical path
//!
//! The canonical path is only ever the target of a rename, so a reader sees
//! either the old file or the new one, never a partial write.
//!
//! # Single Writer
//!
//! The store assumes one mutating call at a time per path; there is no
//! locking. Readers never block and always see the last committed file.

use crate::core::validator::check_structure;
use crate::io::csv_format::write_records_csv;
use crate::io::sync_reader::SyncReader;
use crate::types::{LedgerError, TransactionRecord};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Default file name of the canonical store
pub const DEFAULT_LEDGER_FILE: &str = "shop_data.csv";

/// Handle on one canonical ledger file and its backup
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    backup_path: PathBuf,
    #[cfg(test)]
    fail_before_rename: bool,
}

impl LedgerStore {
    /// Create a handle for the ledger at `path`
    ///
    /// No file is created until the first mutation. The backup lives beside
    /// the store as `<stem>_backup.<ext>`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);

        Self {
            path,
            backup_path,
            #[cfg(test)]
            fail_before_rename: false,
        }
    }

    /// Path of the canonical store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the single retained backup
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Read every committed record, in file order
    ///
    /// A store that has never been written reads as empty. Never takes a
    /// backup.
    ///
    /// # Errors
    ///
    /// Fails fast on missing columns or any malformed row, reporting the line.
    pub fn read_all(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        read_ledger_file(&self.path)
    }

    /// Read the records held in the backup file
    pub fn read_backup(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        read_ledger_file(&self.backup_path)
    }

    /// Add one record to the end of the store
    ///
    /// # Errors
    ///
    /// * `ValidationError` - The record is structurally invalid
    /// * `DuplicateId` - The id is already committed
    /// * `BackupFailure` - The backup could not be written; store untouched
    pub fn append(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        check_structure(&record).map_err(|errors| LedgerError::validation(None, errors))?;

        let mut records = self.read_all()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(LedgerError::duplicate_id(&record.id));
        }

        let id = record.id.clone();
        records.push(record);
        self.commit(&records)?;

        tracing::info!(id = %id, rows = records.len(), "transaction appended");
        Ok(())
    }

    /// Replace the entire store content
    ///
    /// Used by merge and delete. The records are written in the order given.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - A record is structurally invalid
    /// * `DuplicateId` - Two records share an id
    /// * `BackupFailure` - The backup could not be written; store untouched
    pub fn replace(&self, records: &[TransactionRecord]) -> Result<(), LedgerError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            check_structure(record).map_err(|errors| LedgerError::validation(None, errors))?;
            if !seen.insert(record.id.as_str()) {
                return Err(LedgerError::duplicate_id(&record.id));
            }
        }

        self.commit(records)?;

        tracing::info!(rows = records.len(), "ledger replaced");
        Ok(())
    }

    /// Remove the record with the given id
    ///
    /// # Returns
    ///
    /// The removed record.
    ///
    /// # Errors
    ///
    /// * `NotFound` - No record has this id; no backup is taken
    /// * `BackupFailure` - The backup could not be written; store untouched
    pub fn delete(&self, id: &str) -> Result<TransactionRecord, LedgerError> {
        let mut records = self.read_all()?;
        let position = records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| LedgerError::not_found(id))?;

        let removed = records.remove(position);
        self.replace(&records)?;

        tracing::info!(id = %id, "transaction deleted");
        Ok(removed)
    }

    /// Back up the current file, then atomically write `records`
    fn commit(&self, records: &[TransactionRecord]) -> Result<(), LedgerError> {
        self.backup()?;
        self.write_atomically(records)?;

        tracing::debug!(
            path = %self.path.display(),
            rows = records.len(),
            "ledger committed"
        );
        Ok(())
    }

    /// Copy the current store, byte for byte, to the backup path
    ///
    /// A store that does not exist yet is backed up as a header-only file.
    fn backup(&self) -> Result<(), LedgerError> {
        let current = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut empty = Vec::new();
                write_records_csv(&[], &mut empty)
                    .map_err(|e| LedgerError::backup_failure(&self.backup_path, e))?;
                empty
            }
            Err(e) => return Err(LedgerError::backup_failure(&self.backup_path, e)),
        };

        let staging = staging_path_for(&self.backup_path);
        let result = write_file(&staging, &current).and_then(|()| {
            fs::rename(&staging, &self.backup_path).map_err(LedgerError::from)
        });

        if let Err(e) = result {
            let _ = fs::remove_file(&staging);
            tracing::warn!(
                backup = %self.backup_path.display(),
                error = %e,
                "backup failed, mutation abandoned"
            );
            return Err(LedgerError::backup_failure(&self.backup_path, e));
        }

        tracing::debug!(backup = %self.backup_path.display(), "backup written");
        Ok(())
    }

    /// Stage the new content beside the store and rename it into place
    fn write_atomically(&self, records: &[TransactionRecord]) -> Result<(), LedgerError> {
        let staging = staging_path_for(&self.path);

        let result = self.stage_and_swap(&staging, records);
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn stage_and_swap(&self, staging: &Path, records: &[TransactionRecord]) -> Result<(), LedgerError> {
        let mut content = Vec::new();
        write_records_csv(records, &mut content)?;
        write_file(staging, &content)?;

        // Partial-write guard: the staged file must hold every row
        let found = SyncReader::open(staging)?.read_strict()?.len();
        if found != records.len() {
            return Err(LedgerError::PartialWriteGuardViolation {
                path: staging.display().to_string(),
                expected: records.len(),
                found,
            });
        }

        #[cfg(test)]
        if self.fail_before_rename {
            return Err(LedgerError::IoError {
                message: "simulated crash before rename".to_string(),
            });
        }

        fs::rename(staging, &self.path)?;
        sync_parent_dir(&self.path);
        Ok(())
    }
}

fn read_ledger_file(path: &Path) -> Result<Vec<TransactionRecord>, LedgerError> {
    match SyncReader::open(path) {
        Ok(reader) => reader.read_strict(),
        Err(LedgerError::FileNotFound { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Write and fsync a whole file
fn write_file(path: &Path, content: &[u8]) -> Result<(), LedgerError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(content)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Make a completed rename durable
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

/// `shop_data.csv` → `shop_data_backup.csv`
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_backup.{}", stem, ext.to_string_lossy()),
        None => format!("{}_backup", stem),
    };
    path.with_file_name(name)
}

/// `shop_data.csv` → `shop_data.csv.tmp`, in the same directory
fn staging_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
