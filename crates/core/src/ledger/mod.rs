//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Records (accounts, transactions, journals) and caller drafts
//! - Journal validation in a fixed check order
//! - Balance propagation and replay
//! - The journal engine with immediate and staged commit
//! - Account management and transaction queries
//! - Reversal drafting

pub mod accounts;
pub mod balance;
pub mod draft;
pub mod engine;
pub mod error;
pub mod reversal;
pub mod transactions;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use accounts::{AccountManager, BalanceAudit};
pub use balance::RunningBalance;
pub use draft::{AccountUpdate, JournalDraft, NewAccount, TransactionDraft};
pub use engine::{JournalEngine, PersistOutcome};
pub use error::LedgerError;
pub use reversal::ReversalBuilder;
pub use transactions::TransactionManager;
pub use types::{Account, Direction, Journal, Transaction};
pub use validation::{LedgerView, ValidatedJournal, validate_journal};
