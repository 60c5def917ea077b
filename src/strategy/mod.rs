//! Loading strategies for merge-input files
//!
//! A merge takes several uploaded ledger files. This module defines the
//! Strategy pattern for turning a list of paths into parsed [`SourceRows`],
//! so the loading implementation (one file after another, or several files
//! read concurrently) can be selected at runtime.
//!
//! Whatever the strategy, the sources come back in the order the paths were
//! given, because merge priority is source order.

use crate::cli::StrategyType;
use crate::core::merge::SourceRows;
use crate::types::LedgerError;
use std::path::PathBuf;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncSourceLoader, BatchConfig};
pub use sync::SyncSourceLoader;

/// Strategy trait for loading merge inputs
pub trait SourceLoader: Send + Sync {
    /// Parse every file into rows, keeping per-row failures
    ///
    /// # Arguments
    ///
    /// * `paths` - Merge inputs in priority order
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SourceRows>)` - One entry per path, in the same order
    /// * `Err(LedgerError)` - A whole file was unusable (missing, unreadable,
    ///   missing required columns); the merge must not go ahead
    ///
    /// Malformed rows are not errors here: they are returned inside
    /// [`SourceRows::rows`] for the merge to report.
    fn load(&self, paths: &[PathBuf]) -> Result<Vec<SourceRows>, LedgerError>;
}

/// Create a source loader for the given strategy
///
/// # Arguments
///
/// * `strategy_type` - Sync or Async
/// * `config` - Batch configuration for the async loader (ignored for sync)
pub fn create_loader(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn SourceLoader> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncSourceLoader),
        StrategyType::Async => Box::new(AsyncSourceLoader::new(config.unwrap_or_default())),
    }
}
