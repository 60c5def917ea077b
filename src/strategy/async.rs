//! Asynchronous source loader
//!
//! Reads several merge inputs at the same time on a multi-threaded tokio
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncSourceLoader
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── tokio::fs::File + compat layer (one per input)
//!     └── AsyncReader (batch CSV reading)
//! ```
//!
//! Up to `max_concurrent` files are in flight at once. Results are collected
//! with `buffered`, which yields them in input order no matter which file
//! finishes first, so merge priority is unaffected by scheduling.

use crate::core::merge::SourceRows;
use crate::io::async_reader::AsyncReader;
use crate::strategy::SourceLoader;
use crate::types::LedgerError;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};

/// Configuration for batched, concurrent loading
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of rows read per batch
    pub batch_size: usize,
    /// Maximum number of files read concurrently
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                default = default.batch_size,
                "invalid batch size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            tracing::warn!(
                default = default.max_concurrent,
                "invalid concurrency 0, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Concurrent loader backed by a tokio runtime
#[derive(Debug, Clone)]
pub struct AsyncSourceLoader {
    config: BatchConfig,
}

impl AsyncSourceLoader {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl SourceLoader for AsyncSourceLoader {
    /// Load every input concurrently
    ///
    /// The first whole-file failure (in input order) is returned and the
    /// remaining results are discarded.
    fn load(&self, paths: &[PathBuf]) -> Result<Vec<SourceRows>, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .build()?;

        let batch_size = self.config.batch_size;
        runtime.block_on(async {
            stream::iter(paths.iter().map(|path| load_source(path, batch_size)))
                .buffered(self.config.max_concurrent)
                .try_collect::<Vec<SourceRows>>()
                .await
        })
    }
}

/// Read one file to the end in batches
async fn load_source(path: &Path, batch_size: usize) -> Result<SourceRows, LedgerError> {
    let name = path.display().to_string();
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LedgerError::FileNotFound { path: name.clone() },
        _ => LedgerError::from(e),
    })?;

    // Wrap tokio file in a compatibility layer for csv-async
    let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
    let mut reader = AsyncReader::new(compat_file, &name).await?;

    let mut rows = Vec::new();
    loop {
        let batch = reader.read_batch(batch_size).await;
        if batch.is_empty() {
            break;
        }
        rows.extend(batch);
    }

    tracing::debug!(source = %name, rows = rows.len(), "source loaded");
    Ok(SourceRows::new(name, rows))
}
