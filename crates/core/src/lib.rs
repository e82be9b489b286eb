//! Core business logic for Tally.
//!
//! This crate contains pure bookkeeping logic with ZERO database dependencies.
//! Stores plug in through the traits in [`storage`].
//!
//! # Modules
//!
//! - `ledger` - Double-entry journals, validation, balances, reversals
//! - `storage` - Store contracts the journal engine writes through
//! - `reports` - Text rendering of journals and account statements

pub mod ledger;
pub mod reports;
pub mod storage;
