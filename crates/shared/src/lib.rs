//! Shared types, collaborators, and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Typed, caller-assigned identifiers for accounts, journals, and postings
//! - Pagination types for listing operations
//! - The clock collaborator the ledger takes its timestamps from
//! - Configuration management

pub mod clock;
pub mod config;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, CommitMode};
