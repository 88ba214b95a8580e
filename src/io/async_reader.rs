//! Asynchronous CSV reader with batch interface
//!
//! Provides batched streaming over reward event records from an async
//! source, for the concurrent processing strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV source → AsyncEventReader → batches of EventRecords
//!                    ↓
//!             csv_format module
//!             (CsvEventRecord, convert_event_record)
//! ```

use crate::io::csv_format::{convert_event_record, CsvEventRecord};
use crate::types::EventRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader over reward events
///
/// Reads up to a configured number of records at a time while keeping the
/// overall pipeline streaming.
pub struct AsyncEventReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncEventReader<R> {
    /// Create a new AsyncEventReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read a batch of event records
    ///
    /// Reads up to `batch_size` records, converting each to an
    /// [`EventRecord`]. Rows that fail to parse or convert are logged to
    /// stderr and skipped. An empty vector signals end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<EventRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvEventRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_event_record(csv_record) {
                    Ok(event_record) => batch.push(event_record),
                    Err(e) => eprintln!("Record conversion error: {}", e),
                },
                Some(Err(e)) => eprintln!("CSV parse error: {}", e),
                None => break,
            }
        }

        batch
    }
}
