//! Core traits for reading ledger state
//!
//! Projections and analytics only need a point-in-time copy of the ledger.
//! This trait lets them run against the canonical store or against records
//! already held in memory (a merge result not yet committed, test data).

use crate::core::ledger_store::LedgerStore;
use crate::types::{LedgerError, TransactionRecord};

/// A source of a consistent, read-only ledger snapshot
pub trait LedgerSnapshot {
    /// Take a snapshot of every committed record, in ledger order
    fn snapshot(&self) -> Result<Vec<TransactionRecord>, LedgerError>;
}

impl LedgerSnapshot for LedgerStore {
    fn snapshot(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.read_all()
    }
}

impl LedgerSnapshot for [TransactionRecord] {
    fn snapshot(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.to_vec())
    }
}

impl LedgerSnapshot for Vec<TransactionRecord> {
    fn snapshot(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.as_slice().snapshot()
    }
}
