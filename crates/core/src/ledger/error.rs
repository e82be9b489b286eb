//! Ledger error types.
//!
//! Every failure of a ledger operation is one of these kinds. Journal
//! validation reports the first failing check only, in a fixed order.

use tally_shared::types::{AccountNumber, JournalId, TransactionId};
use thiserror::Error;

use crate::storage::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Journal Validation Errors ==========
    /// No journal was supplied.
    #[error("No journal supplied")]
    NilJournal,

    /// The journal ID is empty.
    #[error("Journal ID is missing")]
    MissingJournalId,

    /// The journal has no posting lines.
    #[error("Journal has no transactions")]
    NoTransactions,

    /// The journal does not name its creator.
    #[error("Journal author is missing")]
    MissingAuthor,

    /// The journal input could not be parsed.
    #[error("Malformed journal input: {0}")]
    MalformedJournal(String),

    /// A journal with this ID is already persisted or staged.
    #[error("Journal {0} is already persisted")]
    JournalAlreadyPersisted(JournalId),

    /// A posting line has an empty ID.
    #[error("Transaction ID is missing")]
    TransactionMissingId,

    /// A transaction with this ID is already persisted or staged.
    #[error("Transaction {0} is already persisted")]
    TransactionAlreadyPersisted(TransactionId),

    /// The same transaction ID appears twice in one journal.
    #[error("Transaction {0} appears more than once in the journal")]
    DuplicateTransactionInJournal(TransactionId),

    /// A posting amount is negative.
    #[error("Transaction {0} has a negative amount")]
    NegativeAmount(TransactionId),

    /// Summing the journal's postings overflowed.
    #[error("Journal amounts overflow")]
    AmountOverflow,

    /// Debits and credits differ.
    #[error("Journal is not balanced. Debit: {debit}, Credit: {credit}")]
    JournalNotBalanced {
        /// Sum of debit postings.
        debit: i64,
        /// Sum of credit postings.
        credit: i64,
    },

    /// One account is posted more than once in the journal.
    #[error("Account {0} is posted more than once in the journal")]
    DuplicateAccountInJournal(AccountNumber),

    /// A posting references an account that does not exist.
    #[error("Account {0} is not persisted")]
    AccountNotPersisted(AccountNumber),

    /// Postings span more than one currency.
    #[error("Account {account} uses {found}, journal uses {expected}")]
    MixedCurrency {
        /// The offending account.
        account: AccountNumber,
        /// Currency of the first posted account.
        expected: String,
        /// Currency of the offending account.
        found: String,
    },

    /// The journal to reverse does not exist.
    #[error("Reversal target {0} does not exist")]
    ReversalTargetNotFound(JournalId),

    /// The journal to reverse is already reversed.
    #[error("Journal {0} is already reversed")]
    DoubleReversalRejected(JournalId),

    /// Applying the journal would push a balance out of range.
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountNumber),

    // ========== Account Errors ==========
    /// Account number is empty.
    #[error("Account number is missing")]
    AccountMissingNumber,

    /// Account name is empty.
    #[error("Account name is missing")]
    AccountMissingName,

    /// Account description is empty.
    #[error("Account description is missing")]
    AccountMissingDescription,

    /// Creator or updater is empty.
    #[error("Account creator is missing")]
    AccountMissingCreator,

    /// An account with this number already exists.
    #[error("Account {0} is already persisted")]
    AccountAlreadyPersisted(AccountNumber),

    // ========== Lookup and State Errors ==========
    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// The requested key.
        id: String,
    },

    /// A reversal journal points at a journal that cannot be loaded.
    #[error("Journal {journal} reverses {target}, which cannot be loaded")]
    ReversalChainInconsistent {
        /// The reversal journal.
        journal: JournalId,
        /// Its missing target.
        target: JournalId,
    },

    /// The journal is already committed; it can no longer be cancelled.
    #[error("Journal {0} is already committed")]
    AlreadyCommitted(JournalId),

    // ========== Storage Errors ==========
    /// The store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Creates a not-found error for a journal.
    #[must_use]
    pub fn journal_not_found(id: &JournalId) -> Self {
        Self::NotFound {
            entity: "journal",
            id: id.to_string(),
        }
    }

    /// Creates a not-found error for an account.
    #[must_use]
    pub fn account_not_found(number: &AccountNumber) -> Self {
        Self::NotFound {
            entity: "account",
            id: number.to_string(),
        }
    }

    /// Creates a not-found error for a transaction.
    #[must_use]
    pub fn transaction_not_found(id: &TransactionId) -> Self {
        Self::NotFound {
            entity: "transaction",
            id: id.to_string(),
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NilJournal => "NIL_JOURNAL",
            Self::MissingJournalId => "MISSING_JOURNAL_ID",
            Self::NoTransactions => "NO_TRANSACTIONS",
            Self::MissingAuthor => "MISSING_AUTHOR",
            Self::MalformedJournal(_) => "MALFORMED_JOURNAL",
            Self::JournalAlreadyPersisted(_) => "JOURNAL_ALREADY_PERSISTED",
            Self::TransactionMissingId => "TRANSACTION_MISSING_ID",
            Self::TransactionAlreadyPersisted(_) => "TRANSACTION_ALREADY_PERSISTED",
            Self::DuplicateTransactionInJournal(_) => "DUPLICATE_TRANSACTION_IN_JOURNAL",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::JournalNotBalanced { .. } => "JOURNAL_NOT_BALANCED",
            Self::DuplicateAccountInJournal(_) => "DUPLICATE_ACCOUNT_IN_JOURNAL",
            Self::AccountNotPersisted(_) => "ACCOUNT_NOT_PERSISTED",
            Self::MixedCurrency { .. } => "MIXED_CURRENCY",
            Self::ReversalTargetNotFound(_) => "REVERSAL_TARGET_NOT_FOUND",
            Self::DoubleReversalRejected(_) => "DOUBLE_REVERSAL_REJECTED",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::AccountMissingNumber => "ACCOUNT_MISSING_NUMBER",
            Self::AccountMissingName => "ACCOUNT_MISSING_NAME",
            Self::AccountMissingDescription => "ACCOUNT_MISSING_DESCRIPTION",
            Self::AccountMissingCreator => "ACCOUNT_MISSING_CREATOR",
            Self::AccountAlreadyPersisted(_) => "ACCOUNT_ALREADY_PERSISTED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ReversalChainInconsistent { .. } => "REVERSAL_CHAIN_INCONSISTENT",
            Self::AlreadyCommitted(_) => "ALREADY_COMMITTED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if this error comes from journal validation, i.e. the
    /// draft was rejected and nothing was written.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NilJournal
                | Self::MissingJournalId
                | Self::NoTransactions
                | Self::MissingAuthor
                | Self::MalformedJournal(_)
                | Self::JournalAlreadyPersisted(_)
                | Self::TransactionMissingId
                | Self::TransactionAlreadyPersisted(_)
                | Self::DuplicateTransactionInJournal(_)
                | Self::NegativeAmount(_)
                | Self::AmountOverflow
                | Self::JournalNotBalanced { .. }
                | Self::DuplicateAccountInJournal(_)
                | Self::AccountNotPersisted(_)
                | Self::MixedCurrency { .. }
                | Self::ReversalTargetNotFound(_)
                | Self::DoubleReversalRejected(_)
                | Self::BalanceOverflow(_)
        )
    }

    /// Returns true if this is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
