//! Error types for the shop ledger
//!
//! This module defines every failure the ledger surfaces to its callers.
//! Statistical and duplicate-id findings are not errors; they are returned
//! as data (see [`crate::types::validation`] and the merge outcome).
//!
//! # Error Categories
//!
//! - **Structural errors**: missing columns, malformed rows, invalid records
//! - **Store errors**: unknown id on delete, duplicate id on write
//! - **Write-path errors**: backup failure, partial-write guard
//! - **Parameter errors**: projection inputs outside their valid range
//! - **Arithmetic errors**: totals beyond the range of the amount type
//! - **I/O errors**: file system failures outside the write path

use super::validation::{describe_field_errors, FieldError};
use thiserror::Error;

/// Main error type for the ledger
///
/// Each variant carries enough context to explain the failure on the
/// command line without further lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV could not be read as delimited text
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// The header lacks one or more required columns
    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// File being read
        path: String,
        /// Required columns that were absent
        columns: Vec<String>,
    },

    /// A record failed structural validation
    #[error("Invalid record{}: {}", line.map(|l| format!(" at line {}", l)).unwrap_or_default(), describe_field_errors(errors))]
    ValidationError {
        /// Line number in the source file (if read from one)
        line: Option<u64>,
        /// Every structural problem found in the record
        errors: Vec<FieldError>,
    },

    /// Delete of an id that is not in the store
    #[error("Transaction {id} not found")]
    NotFound {
        /// The id that was requested
        id: String,
    },

    /// A write would leave two records with the same id
    #[error("Duplicate transaction ID {id}")]
    DuplicateId {
        /// The repeated id
        id: String,
    },

    /// The pre-write backup could not be created; the store was not touched
    #[error("Backup to {path} failed, ledger left unchanged: {message}")]
    BackupFailure {
        /// Backup destination
        path: String,
        /// Underlying cause
        message: String,
    },

    /// The staged file did not hold every row that was written to it
    ///
    /// Detected before the rename, so the canonical store is never exposed
    /// to the short file.
    #[error("Staged ledger {path} holds {found} rows, expected {expected}; commit abandoned")]
    PartialWriteGuardViolation {
        /// Staging path
        path: String,
        /// Rows written
        expected: usize,
        /// Rows read back
        found: usize,
    },

    /// A caller-supplied parameter is outside its valid range
    #[error("Invalid {name} '{value}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Offending value
        value: String,
        /// Accepted range
        reason: String,
    },

    /// A total or projection exceeded the range of the amount type
    #[error("Amounts too large to compute {context}")]
    Overflow {
        /// The figure being computed
        context: String,
    },
}

// Conversion from io::Error to LedgerError
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to LedgerError
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a NotFound error
    pub fn not_found(id: &str) -> Self {
        LedgerError::NotFound { id: id.to_string() }
    }

    /// Create a DuplicateId error
    pub fn duplicate_id(id: &str) -> Self {
        LedgerError::DuplicateId { id: id.to_string() }
    }

    /// Create a BackupFailure error
    pub fn backup_failure(path: &std::path::Path, cause: impl ToString) -> Self {
        LedgerError::BackupFailure {
            path: path.display().to_string(),
            message: cause.to_string(),
        }
    }

    /// Create a ValidationError error
    pub fn validation(line: Option<u64>, errors: Vec<FieldError>) -> Self {
        LedgerError::ValidationError { line, errors }
    }

    /// Create an InvalidParameter error
    pub fn invalid_parameter(name: &str, value: impl ToString, reason: &str) -> Self {
        LedgerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an Overflow error
    pub fn overflow(context: &str) -> Self {
        LedgerError::Overflow {
            context: context.to_string(),
        }
    }

    /// Create a MissingColumns error
    pub fn missing_columns(path: &str, columns: Vec<String>) -> Self {
        LedgerError::MissingColumns {
            path: path.to_string(),
            columns,
        }
    }
}
