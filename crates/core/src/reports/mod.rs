//! Read-only presentation of ledger records.

mod render;

pub use render::{render_account_statement, render_journal};
