//! Storage layer for Tally.
//!
//! This crate provides:
//! - In-memory tables (repositories) for accounts, transactions and journals
//! - [`InMemoryLedgerStore`], a thread-safe `LedgerStore` over those tables

pub mod memory;
pub mod repositories;

pub use memory::{InMemoryLedgerStore, StoreSnapshot};
pub use repositories::{AccountRepository, JournalRepository, TransactionRepository};
