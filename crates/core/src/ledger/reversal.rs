//! Reversal drafting.
//!
//! A reversal is an ordinary journal that posts every line of the source
//! journal in the opposite direction. The builder only drafts it; it is
//! persisted through the engine like any other journal, which enforces the
//! at-most-one-reversal rule.

use tally_shared::types::{JournalId, TransactionId};

use super::draft::{JournalDraft, TransactionDraft};
use super::types::Journal;

/// Drafts the reversal of a persisted journal.
#[derive(Debug, Clone)]
pub struct ReversalBuilder<'a> {
    source: &'a Journal,
    journal_id: JournalId,
    created_by: String,
    description: Option<String>,
    transaction_ids: Vec<TransactionId>,
}

impl<'a> ReversalBuilder<'a> {
    /// Starts a reversal of `source`.
    ///
    /// The new journal ID defaults to a generated one and the author to the
    /// source journal's author.
    #[must_use]
    pub fn for_journal(source: &'a Journal) -> Self {
        Self {
            source,
            journal_id: JournalId::generate(),
            created_by: source.created_by.clone(),
            description: None,
            transaction_ids: Vec::new(),
        }
    }

    /// Sets the reversal's journal ID.
    #[must_use]
    pub fn journal_id(mut self, id: impl Into<JournalId>) -> Self {
        self.journal_id = id.into();
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn created_by(mut self, author: impl Into<String>) -> Self {
        self.created_by = author.into();
        self
    }

    /// Sets the journal description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Supplies posting IDs, used in order. Missing ones are generated.
    #[must_use]
    pub fn transaction_ids(mut self, ids: impl IntoIterator<Item = impl Into<TransactionId>>) -> Self {
        self.transaction_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Produces the reversal draft.
    ///
    /// Every line keeps its account and amount with the direction flipped.
    /// Line descriptions are prefixed with `Reversal: `.
    #[must_use]
    pub fn build(self) -> JournalDraft {
        let mut ids = self.transaction_ids.into_iter();
        let transactions = self
            .source
            .transactions
            .iter()
            .map(|original| TransactionDraft {
                id: ids.next().unwrap_or_else(TransactionId::generate),
                account_number: original.account_number.clone(),
                direction: original.direction.opposite(),
                amount: original.amount,
                description: format!("Reversal: {}", original.description),
                transaction_time: None,
            })
            .collect();

        JournalDraft {
            id: self.journal_id,
            description: self
                .description
                .unwrap_or_else(|| format!("Reversal of journal {}", self.source.id)),
            journaling_time: None,
            reverses: Some(self.source.id.clone()),
            created_by: self.created_by,
            transactions,
        }
    }
}
