//! Concurrent batch processing strategy
//!
//! This module provides a concurrent, multi-threaded implementation of the
//! ProcessingStrategy trait. It processes reward events in batches using
//! thread-based parallelism with user-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncEventReader (batch CSV reading)
//!     ├── BatchProcessor (user partitioning + task spawning)
//!     └── SharedRewardsEngine (thread-safe processing)
//!         ├── SharedBalanceBook (thread-safe account state)
//!         └── SharedLedgerStore (thread-safe ledger history)
//! ```
//!
//! # Ordering
//!
//! Batches are processed sequentially; within each batch, events are
//! partitioned by user id and processed in parallel. This keeps per-user
//! event ordering intact both within and across batches.

use crate::core::{BatchProcessor, SharedBalanceBook, SharedLedgerStore, SharedRewardsEngine};
use crate::io::async_reader::AsyncEventReader;
use crate::io::csv_format::write_summaries_csv;
use crate::strategy::ProcessingStrategy;
use crate::types::RewardError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how events are batched and the number of worker threads for
/// parallel processing within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of events per batch
    pub batch_size: usize,
    /// Maximum number of partitions processing concurrently
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values are invalid and fall back to the defaults with a
    /// warning on stderr.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            eprintln!(
                "Warning: Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            eprintln!(
                "Warning: Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Concurrent batch processing strategy
///
/// Implements the ProcessingStrategy trait using multi-threaded batch
/// processing. Events are read in batches and processed sequentially
/// (batch-by-batch) to maintain ordering guarantees. Within each batch,
/// events are partitioned by user id and processed in parallel.
///
/// # Thread Safety
///
/// ConcurrentProcessingStrategy is Send + Sync and uses thread-safe
/// components internally (Arc-wrapped SharedRewardsEngine with
/// DashMap-based state).
#[derive(Debug, Clone)]
pub struct ConcurrentProcessingStrategy {
    config: BatchConfig,
}

impl ConcurrentProcessingStrategy {
    /// Create a new ConcurrentProcessingStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for ConcurrentProcessingStrategy {
    /// Process events from the input file and write summaries to output
    ///
    /// Builds a tokio multi-threaded runtime, streams batches from the
    /// input CSV, and processes each batch to completion before reading the
    /// next. Individual event errors are logged to stderr by the batch
    /// processor; fatal errors (file open, runtime creation, output write)
    /// are returned.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), RewardError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| RewardError::IoError {
                message: format!("failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let balances = Arc::new(SharedBalanceBook::new());
            let ledger = Arc::new(SharedLedgerStore::new());
            let engine = Arc::new(SharedRewardsEngine::new(
                Arc::clone(&balances),
                Arc::clone(&ledger),
            ));

            let processor = BatchProcessor::new(Arc::clone(&engine));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| RewardError::IoError {
                    message: format!("failed to open '{}': {}", input_path.display(), e),
                })?;

            // Compatibility layer between tokio's AsyncRead and csv-async's
            // futures-based AsyncRead
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);

            let mut reader = AsyncEventReader::new(compat_file);

            // Batches complete before the next one starts, so a user's
            // events spanning batch boundaries still apply in file order
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;

                if batch.is_empty() {
                    break;
                }

                let outcomes = processor.process_batch(batch).await;
                for outcome in &outcomes {
                    if let Err(e) = &outcome.result {
                        eprintln!("Event processing error: {}", e);
                    }
                }
            }

            write_summaries_csv(&engine.summaries(), output)?;

            Ok(())
        })
    }
}
