//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over reward event records from a CSV
//! file. Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncEventReader implements the Iterator trait, yielding
//! `Result<EventRecord, RewardError>` for each CSV row:
//!
//! ```no_run
//! use rewards_ledger::io::sync_reader::SyncEventReader;
//! use std::path::Path;
//!
//! let reader = SyncEventReader::new(Path::new("events.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("event: {:?}", record),
//!         Err(e) => eprintln!("error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! Fatal errors (file not found) are returned from `new()`. Individual
//! record errors are yielded as Err variants so callers can log and keep
//! going; parse errors carry the source line number.
//!
//! # Memory Efficiency
//!
//! Records are read one at a time; memory usage does not grow with the
//! size of the input file.

use crate::io::csv_format::{convert_event_record, CsvEventRecord};
use crate::types::{EventRecord, RewardError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader over reward events
#[derive(Debug)]
pub struct SyncEventReader {
    reader: csv::Reader<File>,
}

impl SyncEventReader {
    /// Create a new SyncEventReader from a file path
    ///
    /// The CSV reader trims whitespace from all fields and allows rows to
    /// omit trailing optional columns.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, RewardError> {
        let file = File::open(path).map_err(|e| RewardError::IoError {
            message: format!("failed to open '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self { reader })
    }
}

impl Iterator for SyncEventReader {
    type Item = Result<EventRecord, RewardError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvEventRecord>();

        match deserializer.next()? {
            Ok(csv_record) => Some(convert_event_record(csv_record)),
            Err(e) => Some(Err(e.into())),
        }
    }
}
