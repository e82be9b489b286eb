//! Storage contracts for ledger records.
//!
//! The journal engine only talks to storage through these traits, so any
//! backend that can honour them (in-memory tables, a SQL database, a KV store)
//! can hold the ledger.
//!
//! # Contract
//!
//! - `put_*` on journals and transactions refuses to overwrite: those records are immutable
//! - `put_account` upserts; it is how account metadata changes land
//! - scans return records in a stable order: accounts and transactions by
//!   creation, journals by journaling time, with insertion order breaking ties
//! - [`LedgerStore::apply`] writes a whole [`PostingBatch`] or nothing

mod error;

use chrono::{DateTime, Utc};
use tally_shared::types::{AccountNumber, JournalId, TransactionId};

use crate::ledger::types::{Account, Journal, Transaction};

pub use error::StoreError;

/// Selection for account scans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountFilter {
    /// Every account.
    #[default]
    All,
    /// Accounts whose classification code equals the given one.
    Classification(String),
    /// Accounts whose name contains the given text, ignoring case.
    NameContains(String),
}

impl AccountFilter {
    /// Returns true if `account` is selected by this filter.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            Self::All => true,
            Self::Classification(code) => account.classification_code == *code,
            Self::NameContains(fragment) => account
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

/// Selection for transaction scans. Empty fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionFilter {
    /// Only postings against this account.
    pub account: Option<AccountNumber>,
    /// Only postings of this journal.
    pub journal: Option<JournalId>,
    /// Inclusive lower bound on transaction time.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on transaction time.
    pub until: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Postings of one journal.
    #[must_use]
    pub fn for_journal(journal: &JournalId) -> Self {
        Self {
            journal: Some(journal.clone()),
            ..Self::default()
        }
    }

    /// Postings against one account.
    #[must_use]
    pub fn for_account(account: &AccountNumber) -> Self {
        Self {
            account: Some(account.clone()),
            ..Self::default()
        }
    }

    /// Restricts to an inclusive time range.
    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    /// Returns true if `transaction` is selected by this filter.
    #[must_use]
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.account
            .as_ref()
            .is_none_or(|a| transaction.account_number == *a)
            && self.journal.as_ref().is_none_or(|j| transaction.journal_id == *j)
            && self.from.is_none_or(|from| transaction.transaction_time >= from)
            && self.until.is_none_or(|until| transaction.transaction_time <= until)
    }
}

/// Selection for journal scans by inclusive journaling-time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalFilter {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub until: Option<DateTime<Utc>>,
}

impl JournalFilter {
    /// Returns true if `journal` is selected by this filter.
    #[must_use]
    pub fn matches(&self, journal: &Journal) -> bool {
        self.from.is_none_or(|from| journal.journaling_time >= from)
            && self.until.is_none_or(|until| journal.journaling_time <= until)
    }
}

/// New cached balance for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// The account to update.
    pub account_number: AccountNumber,
    /// Balance after the batch.
    pub balance: i64,
    /// Audit time of the change.
    pub updated_time: DateTime<Utc>,
    /// Who caused the change.
    pub updated_by: String,
}

/// Everything one journal writes, applied as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingBatch {
    /// Journal header (postings are carried in `transactions`).
    pub journal: Journal,
    /// The journal's postings.
    pub transactions: Vec<Transaction>,
    /// Final balance of every touched account.
    pub balances: Vec<BalanceUpdate>,
}

/// Account table.
pub trait AccountStore: Send + Sync {
    /// Loads an account.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError>;

    /// Returns true if the account is stored.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn account_exists(&self, number: &AccountNumber) -> Result<bool, StoreError>;

    /// Inserts or replaces an account.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn put_account(&self, account: Account) -> Result<(), StoreError>;

    /// Lists accounts in creation order.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn scan_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError>;
}

/// Transaction (posting) table.
pub trait TransactionStore: Send + Sync {
    /// Loads a transaction.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Returns true if the transaction is stored.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn transaction_exists(&self, id: &TransactionId) -> Result<bool, StoreError>;

    /// Inserts a transaction.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the ID is taken.
    fn put_transaction(&self, transaction: Transaction) -> Result<(), StoreError>;

    /// Lists transactions in the order they were written.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn scan_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError>;
}

/// Journal table.
pub trait JournalStore: Send + Sync {
    /// Loads a journal header.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn get_journal(&self, id: &JournalId) -> Result<Option<Journal>, StoreError>;

    /// Returns true if the journal is stored.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn journal_exists(&self, id: &JournalId) -> Result<bool, StoreError>;

    /// Inserts a journal header.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the ID is taken.
    fn put_journal(&self, journal: Journal) -> Result<(), StoreError>;

    /// Lists journal headers by journaling time.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn scan_journals(&self, filter: &JournalFilter) -> Result<Vec<Journal>, StoreError>;

    /// Returns the ID of the journal that reverses `target`, if any.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn reversal_of(&self, target: &JournalId) -> Result<Option<JournalId>, StoreError>;
}

/// A complete ledger backend.
pub trait LedgerStore: AccountStore + TransactionStore + JournalStore {
    /// Writes a posting batch atomically: on error nothing is visible.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` for a taken journal or transaction ID and
    /// `MissingAccount` for a balance update on an unknown account.
    fn apply(&self, batch: &PostingBatch) -> Result<(), StoreError>;
}
