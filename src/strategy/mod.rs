//! Processing strategy module for reward event processing
//!
//! This module defines the Strategy pattern for complete event processing
//! pipelines, encompassing both CSV parsing and ledger processing. This
//! allows different implementations (synchronous, concurrent batch) to be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::types::RewardError;
use std::io::Write;
use std::path::Path;

pub mod concurrent;
pub mod sync;

pub use concurrent::{BatchConfig, ConcurrentProcessingStrategy};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete event processing pipelines
///
/// Each strategy reads reward events from a CSV file, processes them
/// through the appropriate engine, and writes the final per-user summaries
/// to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process events from the input file and write summaries to output
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions: the input file cannot
    /// be opened or the output cannot be written. Individual event errors
    /// are logged to stderr and processing continues with the next event.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), RewardError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// Factory for the Strategy pattern: selects and instantiates the
/// appropriate implementation at runtime.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Concurrent => {
            let config = config.unwrap_or_default();
            Box::new(ConcurrentProcessingStrategy::new(config))
        }
    }
}
