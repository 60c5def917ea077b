//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `record`: the committed transaction record and its draft builder
//! - `validation`: validator outcomes, field errors and warnings
//! - `error`: error types for the ledger

pub mod error;
pub mod record;
pub mod validation;

pub use error::LedgerError;
pub use record::{
    amount_in_range, checked_total, generate_record_id, normalize_amount, NewTransaction,
    RecordId, Role, TransactionRecord, AMOUNT_SCALE, KNOWN_SERVICES, MAX_AMOUNT,
};
pub use validation::{FieldError, Validation, Warning};
