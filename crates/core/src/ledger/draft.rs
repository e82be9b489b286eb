//! Caller-side inputs for creating accounts and journals.
//!
//! Drafts carry only what the caller decides. Balances, post-balances, the
//! journal amount and every audit timestamp are filled in by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountNumber, JournalId, TransactionId};

use super::error::LedgerError;
use super::types::Direction;

/// Input for opening a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account number (must be unique).
    pub number: AccountNumber,
    /// Currency or unit code.
    pub currency: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Direction that increases the balance.
    pub base_direction: Direction,
    /// Chart-of-accounts classification code.
    #[serde(default)]
    pub classification_code: String,
    /// Who opens the account.
    pub created_by: String,
}

/// Metadata change for an existing account.
///
/// Balance, currency and base direction never change through an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// The account to change.
    pub number: AccountNumber,
    /// New display name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New classification code.
    pub classification_code: String,
    /// Who makes the change.
    pub updated_by: String,
}

/// One posting line of a journal draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Caller-assigned transaction ID.
    pub id: TransactionId,
    /// Account to post against.
    pub account_number: AccountNumber,
    /// Debit or credit.
    pub direction: Direction,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Line description.
    #[serde(default)]
    pub description: String,
    /// Effective time; the ledger clock is used when absent.
    #[serde(default)]
    pub transaction_time: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(id: impl Into<TransactionId>, account: impl Into<AccountNumber>, amount: i64) -> Self {
        Self::line(id.into(), account.into(), Direction::Debit, amount)
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(id: impl Into<TransactionId>, account: impl Into<AccountNumber>, amount: i64) -> Self {
        Self::line(id.into(), account.into(), Direction::Credit, amount)
    }

    /// Sets the line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the effective time.
    #[must_use]
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.transaction_time = Some(time);
        self
    }

    fn line(id: TransactionId, account_number: AccountNumber, direction: Direction, amount: i64) -> Self {
        Self {
            id,
            account_number,
            direction,
            amount,
            description: String::new(),
            transaction_time: None,
        }
    }
}

/// A journal as submitted for persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalDraft {
    /// Caller-assigned journal ID.
    pub id: JournalId,
    /// Journal description.
    #[serde(default)]
    pub description: String,
    /// Effective time; the ledger clock is used when absent.
    #[serde(default)]
    pub journaling_time: Option<DateTime<Utc>>,
    /// The journal this one reverses.
    #[serde(default)]
    pub reverses: Option<JournalId>,
    /// Who records the journal.
    #[serde(default)]
    pub created_by: String,
    /// Posting lines.
    #[serde(default)]
    pub transactions: Vec<TransactionDraft>,
}

impl JournalDraft {
    /// Starts an empty draft.
    #[must_use]
    pub fn new(id: impl Into<JournalId>, created_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_by: created_by.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the journaling time.
    #[must_use]
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.journaling_time = Some(time);
        self
    }

    /// Marks the draft as the reversal of `target`.
    #[must_use]
    pub fn reversing(mut self, target: impl Into<JournalId>) -> Self {
        self.reverses = Some(target.into());
        self
    }

    /// Appends a posting line.
    #[must_use]
    pub fn posting(mut self, line: TransactionDraft) -> Self {
        self.transactions.push(line);
        self
    }

    /// Parses a draft from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `NilJournal` for a JSON `null` and `MalformedJournal` when the
    /// text is not a journal.
    pub fn from_json(input: &str) -> Result<Self, LedgerError> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| LedgerError::MalformedJournal(e.to_string()))?;
        Self::from_value(value)
    }

    /// Converts an already parsed JSON value into a draft.
    ///
    /// # Errors
    ///
    /// Same as [`JournalDraft::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, LedgerError> {
        let draft: Option<Self> =
            serde_json::from_value(value).map_err(|e| LedgerError::MalformedJournal(e.to_string()))?;
        draft.ok_or(LedgerError::NilJournal)
    }
}
