//! Synchronous source loader
//!
//! Reads merge inputs one file after another with the streaming
//! [`SyncReader`]. Every row is kept, parsed or not, so the merge can report
//! what it excluded.

use crate::core::merge::SourceRows;
use crate::io::sync_reader::SyncReader;
use crate::strategy::SourceLoader;
use crate::types::LedgerError;
use std::path::PathBuf;

/// Single-threaded loader
///
/// ```no_run
/// use shop_ledger::strategy::{SourceLoader, SyncSourceLoader};
/// use std::path::PathBuf;
///
/// let sources = SyncSourceLoader
///     .load(&[PathBuf::from("chair_one.csv"), PathBuf::from("chair_two.csv")])
///     .expect("Loading failed");
/// println!("{} sources", sources.len());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncSourceLoader;

impl SourceLoader for SyncSourceLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<Vec<SourceRows>, LedgerError> {
        paths
            .iter()
            .map(|path| -> Result<SourceRows, LedgerError> {
                let rows: Vec<_> = SyncReader::open(path)?.collect();
                tracing::debug!(source = %path.display(), rows = rows.len(), "source loaded");
                Ok(SourceRows::new(path.display().to_string(), rows))
            })
            .collect()
    }
}
