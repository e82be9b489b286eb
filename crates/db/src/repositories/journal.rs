//! Journal table with its reversal index.

use std::collections::HashMap;

use tally_core::ledger::Journal;
use tally_core::storage::{JournalFilter, StoreError};
use tally_shared::types::JournalId;

use super::Row;

/// Immutable journal headers keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct JournalRepository {
    rows: HashMap<JournalId, Row<Journal>>,
    /// Reversal target -> reversing journal.
    reversals: HashMap<JournalId, JournalId>,
}

impl JournalRepository {
    /// Loads a journal header.
    #[must_use]
    pub fn get(&self, id: &JournalId) -> Option<&Journal> {
        self.rows.get(id).map(|row| &row.record)
    }

    /// Returns true if the journal is stored.
    #[must_use]
    pub fn contains(&self, id: &JournalId) -> bool {
        self.rows.contains_key(id)
    }

    /// ID of the journal that reverses `target`.
    #[must_use]
    pub fn reversal_of(&self, target: &JournalId) -> Option<&JournalId> {
        self.reversals.get(target)
    }

    /// Fails if the ID is taken or the journal reverses an already reversed one.
    pub fn check_insert(&self, journal: &Journal) -> Result<(), StoreError> {
        if self.contains(&journal.id) {
            return Err(StoreError::conflict("journal", journal.id.as_str()));
        }
        if let Some(target) = &journal.reversed_journal_id
            && self.reversals.contains_key(target)
        {
            return Err(StoreError::conflict("reversal of journal", target.as_str()));
        }
        Ok(())
    }

    /// Inserts a journal header; postings are dropped.
    pub fn insert(&mut self, journal: &Journal, sequence: u64) -> Result<(), StoreError> {
        self.check_insert(journal)?;
        if let Some(target) = &journal.reversed_journal_id {
            self.reversals.insert(target.clone(), journal.id.clone());
        }
        self.rows.insert(
            journal.id.clone(),
            Row {
                sequence,
                record: journal.header(),
            },
        );
        Ok(())
    }

    /// Lists matching headers by journaling time, then insertion order.
    #[must_use]
    pub fn scan(&self, filter: &JournalFilter) -> Vec<Journal> {
        let mut rows: Vec<&Row<Journal>> = self
            .rows
            .values()
            .filter(|row| filter.matches(&row.record))
            .collect();
        rows.sort_by_key(|row| (row.record.journaling_time, row.sequence));
        rows.into_iter().map(|row| row.record.clone()).collect()
    }

    /// Number of stored journals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no journal is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
