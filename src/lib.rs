//! Shop Ledger Library
//! # Overview
//!
//! This library records a barber shop's transactions in a CSV ledger, keeps
//! that ledger consistent across writes and merges, and projects the owner's
//! profit from its history.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (TransactionRecord, Role, errors, validation outcomes)
//! - [`cli`] - CLI argument parsing and command execution
//! - [`core`] - Business logic components:
//!   - [`core::validator`] - Accept, accept-with-warning, or reject a candidate
//!   - [`core::ledger_store`] - Backup-before-write, atomic replace persistence
//!   - [`core::merge`] - Multi-source merge deduplicated by id
//!   - [`core::projection`] - Commission-based profit projection
//!   - [`core::analytics`] - Revenue and traffic aggregates
//! - [`io`] - CSV format handling with sync and async readers
//! - [`strategy`] - Pluggable loading of merge-input files
//!
//! # Write Path
//!
//! ```text
//! candidate ─▶ Validator ─▶ LedgerStore::append ─▶ backup ─▶ stage + fsync ─▶ rename
//! uploads ───▶ SourceLoader ─▶ merge ─▶ LedgerStore::replace ─▶ (same)
//! ```
//!
//! # Guarantees
//!
//! - A fresh backup exists before every mutation, or the mutation does not happen
//! - The canonical file is only ever replaced by rename, so readers never see a
//!   partial write
//! - Ids are unique in the store; merges keep the first occurrence of each id
//! - Warnings are data returned to the caller, never errors

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use self::core::{
    consolidate, merge, project, Commission, LedgerSnapshot, LedgerStore, MergeOutcome,
    Projection, ProjectionParams, Validator,
};
pub use io::write_records_csv;
pub use types::{LedgerError, NewTransaction, Role, TransactionRecord, Validation, Warning};
