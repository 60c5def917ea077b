//! Core business logic module
//!
//! This module contains the ledger engine components:
//! - `validator` - Structural rejection and statistical warnings for candidates
//! - `ledger_store` - Canonical store with backup-before-write and atomic replace
//! - `merge` - Multi-source consolidation with first-seen deduplication
//! - `projection` - Commission-based profit projection
//! - `analytics` - Read-only aggregates for reporting
//! - `traits` - Snapshot abstraction shared by projection and analytics

pub mod analytics;
pub mod ledger_store;
pub mod merge;
pub mod projection;
pub mod traits;
pub mod validator;

pub use analytics::{LedgerAnalytics, MonthlySummary};
pub use ledger_store::LedgerStore;
pub use merge::{consolidate, merge, MergeOutcome, RejectedRow, SourceRows};
pub use projection::{project, Commission, Confidence, Projection, ProjectionParams};
pub use traits::LedgerSnapshot;
pub use validator::{ValidationPolicy, Validator};
