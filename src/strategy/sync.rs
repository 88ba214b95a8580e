//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of
//! the ProcessingStrategy trait. It orchestrates event processing by
//! coordinating between the SyncEventReader (for CSV input) and
//! RewardsEngine (for business logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncEventReader` (iterator interface)
//! - Event processing to `RewardsEngine` (business logic)
//! - CSV output to `csv_format::write_summaries_csv` (format handling)
//!
//! # Memory Efficiency
//!
//! Events stream through one at a time; memory grows with accounts and
//! ledger history, not with the size of the input file.

use crate::core::RewardsEngine;
use crate::io::csv_format::write_summaries_csv;
use crate::io::sync_reader::SyncEventReader;
use crate::strategy::ProcessingStrategy;
use crate::types::RewardError;
use std::io::Write;
use std::path::Path;

/// Synchronous processing strategy
///
/// Implements the ProcessingStrategy trait using single-threaded,
/// streaming event processing.
///
/// # Examples
///
/// ```no_run
/// use rewards_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy;
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("events.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process events from the input file and write summaries to output
    ///
    /// Streams event records from the CSV file through a fresh
    /// RewardsEngine, then writes the final per-user summaries. Individual
    /// event errors (bad rows, rejected operations) are logged to stderr
    /// and never abort the run.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), RewardError> {
        let mut engine = RewardsEngine::new();

        let reader = SyncEventReader::new(input_path)?;

        for result in reader {
            match result {
                Ok(event_record) => {
                    if let Err(e) = engine.process(event_record) {
                        eprintln!("Event processing error: {}", e);
                    }
                }
                Err(e) => {
                    eprintln!("CSV parsing error: {}", e);
                }
            }
        }

        write_summaries_csv(&engine.summaries(), output)?;

        Ok(())
    }
}
