//! In-memory tables for ledger records.
//!
//! Each repository owns one table and knows how to order and filter it. They
//! are not synchronized on their own; [`crate::InMemoryLedgerStore`] keeps all
//! of them behind one lock.

pub mod account;
pub mod journal;
pub mod transaction;

pub use account::AccountRepository;
pub use journal::JournalRepository;
pub use transaction::TransactionRepository;

/// A stored record with its insertion sequence number.
///
/// The sequence breaks ties between records with equal timestamps, so scans
/// are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<T> {
    /// Insertion order across the whole store.
    pub sequence: u64,
    /// The record.
    pub record: T,
}
