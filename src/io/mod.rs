//! I/O module
//!
//! Handles CSV parsing and output for the canonical store and merge inputs.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (header, row conversion, serialization)
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_csv_row, write_records_csv, CsvRow, HEADER};
pub use sync_reader::SyncReader;
