//! Ledger records: accounts, transactions (postings), and journals.
//!
//! These are plain data records. They are produced by the journal engine and
//! the account manager and read back through the storage contracts; callers
//! build new entries with the drafts in [`super::draft`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountNumber, JournalId, TransactionId};

/// Posting direction: either Debit or Credit.
///
/// Every account declares one of these as its base direction. Postings in the
/// base direction increase the balance, postings in the other direction
/// decrease it:
/// - Asset/expense-like accounts are DEBIT based
/// - Liability/equity/income-like accounts are CREDIT based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Debit posting.
    Debit,
    /// Credit posting.
    Credit,
}

impl Direction {
    /// Returns the other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => f.write_str("DEBIT"),
            Self::Credit => f.write_str("CREDIT"),
        }
    }
}

/// An account with its cached running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, caller-assigned account number.
    pub number: AccountNumber,
    /// Currency or unit code, e.g. `IDR`, `GOLD`, `POINT`.
    pub currency: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Direction that increases this account's balance.
    pub base_direction: Direction,
    /// Current balance in the smallest unit of the currency.
    pub balance: i64,
    /// Chart-of-accounts classification code.
    pub classification_code: String,
    /// When the account was created.
    pub created_time: DateTime<Utc>,
    /// Who created the account.
    pub created_by: String,
    /// When the account was last changed (metadata or balance).
    pub updated_time: DateTime<Utc>,
    /// Who last changed the account.
    pub updated_by: String,
}

/// A single posting against one account, owned by a journal.
///
/// Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique, caller-assigned transaction ID.
    pub id: TransactionId,
    /// When the posting happened.
    pub transaction_time: DateTime<Utc>,
    /// The account affected by this posting.
    pub account_number: AccountNumber,
    /// The journal this posting belongs to.
    pub journal_id: JournalId,
    /// Line description.
    pub description: String,
    /// Whether this is a debit or credit.
    pub direction: Direction,
    /// Posted amount (never negative).
    pub amount: i64,
    /// The account balance right after this posting was applied.
    pub post_balance: i64,
    /// When the posting was recorded.
    pub created_time: DateTime<Utc>,
    /// Who recorded the posting.
    pub created_by: String,
}

/// A balanced set of postings describing one financial event.
///
/// Immutable once persisted: corrections are new reversal journals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// Unique, caller-assigned journal ID.
    pub id: JournalId,
    /// When the journal takes effect.
    pub journaling_time: DateTime<Utc>,
    /// Journal description.
    pub description: String,
    /// Total amount (sum of debits, equal to sum of credits).
    pub amount: i64,
    /// The journal this one reverses, if it is a reversal.
    pub reversed_journal_id: Option<JournalId>,
    /// When the journal was recorded.
    pub created_time: DateTime<Utc>,
    /// Who recorded the journal.
    pub created_by: String,
    /// Postings (populated when loaded through the engine).
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Journal {
    /// Returns true if this journal reverses another one.
    #[must_use]
    pub fn is_reversal(&self) -> bool {
        self.reversed_journal_id.is_some()
    }

    /// Sum of all debit postings.
    #[must_use]
    pub fn total_debit(&self) -> i64 {
        self.total_for(Direction::Debit)
    }

    /// Sum of all credit postings.
    #[must_use]
    pub fn total_credit(&self) -> i64 {
        self.total_for(Direction::Credit)
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Copy of this journal without its postings, as kept in the journal store.
    #[must_use]
    pub fn header(&self) -> Self {
        Self {
            transactions: Vec::new(),
            ..self.clone()
        }
    }

    fn total_for(&self, direction: Direction) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.direction == direction)
            .map(|t| t.amount)
            .sum()
    }
}
