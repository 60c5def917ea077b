//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over ledger records from a CSV file (or any
//! other byte source, such as an uploaded file held in memory).
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors, missing required columns) are
//!   returned from `open()` / `from_reader()` before any row is read
//! - Individual row errors are yielded as Err variants in the iterator, with
//!   the file line number, and iteration continues with the next row
//!
//! ```no_run
//! use shop_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::open(Path::new("shop_data.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("{} {}", record.id, record.amount),
//!         Err(e) => eprintln!("Skipping row: {}", e),
//!     }
//! }
//! ```

use crate::io::csv_format::{check_headers, convert_csv_row, CsvRow};
use crate::types::{LedgerError, TransactionRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Synchronous CSV reader
///
/// Yields one `Result` per data row; the header has already been checked
/// by the time a reader exists.
#[derive(Debug)]
pub struct SyncReader<R: Read = File> {
    reader: csv::Reader<R>,
    headers: StringRecord,
}

impl SyncReader<File> {
    /// Open a ledger file for reading
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened and carries every required column
    /// * `Err(LedgerError::FileNotFound)` if the path does not exist
    /// * `Err(LedgerError::MissingColumns)` if the header is incomplete
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LedgerError::from(e),
        })?;

        Self::from_reader(file, &path.display().to_string())
    }
}

impl<R: Read> SyncReader<R> {
    /// Wrap any byte source holding ledger CSV
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Require every row to have as many fields as the header
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `source` - Byte source
    /// * `name` - Name used in error messages
    pub fn from_reader(source: R, name: &str) -> Result<Self, LedgerError> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(false)
            .buffer_capacity(8 * 1024)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        check_headers(&headers, name)?;

        Ok(Self { reader, headers })
    }

    /// Read every row, failing on the first bad one
    ///
    /// Used for the canonical store, which only ever holds validated rows.
    pub fn read_strict(self) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.collect()
    }
}

impl<R: Read> Iterator for SyncReader<R> {
    type Item = Result<TransactionRecord, LedgerError>;

    /// Get the next record from the CSV source
    ///
    /// # Returns
    ///
    /// * `Some(Ok(TransactionRecord))` - Structurally valid row
    /// * `Some(Err(LedgerError))` - CSV or structural error, with line number
    /// * `None` - End of input reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = StringRecord::new();

        match self.reader.read_record(&mut raw) {
            Ok(false) => None,
            Ok(true) => {
                let line = raw.position().map(|pos| pos.line());
                let row = match raw.deserialize::<CsvRow>(Some(&self.headers)) {
                    Ok(row) => row,
                    Err(e) => return Some(Err(LedgerError::from(e))),
                };
                Some(convert_csv_row(row).map_err(|errors| LedgerError::validation(line, errors)))
            }
            Err(e) => Some(Err(LedgerError::from(e))),
        }
    }
}
