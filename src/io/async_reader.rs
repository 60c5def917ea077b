//! Asynchronous CSV reader with batch interface
//!
//! Reads ledger rows from any `AsyncRead` source in batches. Used by the
//! concurrent merge-input loader so several uploaded files can be read at
//! the same time.
//!
//! # Architecture
//!
//! ```text
//! AsyncRead → AsyncReader → Batches of Result<TransactionRecord, LedgerError>
//!                  ↓
//!           csv_format module
//!           (CsvRow, check_headers, convert_csv_row)
//! ```
//!
//! Unlike the synchronous reader, rows are not dropped on error: every
//! rejected row is returned so the merge can report it.

use crate::io::csv_format::{check_headers, convert_csv_row, CsvRow};
use crate::types::{LedgerError, TransactionRecord};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// File line of the next data row (the header is line 1)
    next_line: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader, checking the header first
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    /// * `name` - Name used in error messages
    ///
    /// # Returns
    ///
    /// * `Ok(AsyncReader)` if every required column is present
    /// * `Err(LedgerError)` if the header cannot be read or is incomplete
    pub async fn new(reader: R, name: &str) -> Result<Self, LedgerError> {
        let mut csv_reader = AsyncReaderBuilder::new()
            .flexible(false)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        let headers = csv_reader
            .headers()
            .await
            .map_err(|e| parse_error(e, 1))?;
        check_headers(headers.iter(), name)?;

        Ok(Self {
            csv_reader,
            next_line: 2,
        })
    }

    /// Read a batch of rows
    ///
    /// This method reads up to `batch_size` rows, converting each to a
    /// TransactionRecord or to the error that kept it out.
    ///
    /// # Returns
    ///
    /// A vector of per-row results. Returns an empty vector when the end of
    /// the input is reached.
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Vec<Result<TransactionRecord, LedgerError>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvRow>();

        while batch.len() < batch_size {
            // Line numbers assume one row per line, true for ledger files
            let line = self.next_line;
            match rows.next().await {
                Some(Ok(row)) => batch.push(
                    convert_csv_row(row).map_err(|errors| LedgerError::validation(Some(line), errors)),
                ),
                Some(Err(e)) => batch.push(Err(parse_error(e, line))),
                None => break,
            }
            self.next_line += 1;
        }

        batch
    }
}

fn parse_error(error: csv_async::Error, line: u64) -> LedgerError {
    LedgerError::ParseError {
        line: Some(line),
        message: error.to_string(),
    }
}
