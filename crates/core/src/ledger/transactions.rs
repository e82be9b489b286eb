//! Transaction (posting) queries.

use chrono::{DateTime, Utc};
use tally_shared::types::{AccountNumber, PageRequest, PageResponse, TransactionId};

use super::engine::JournalEngine;
use super::error::LedgerError;
use super::types::Transaction;
use crate::storage::{LedgerStore, TransactionFilter};

/// Read-only access to persisted postings.
pub struct TransactionManager<'a, S> {
    engine: &'a JournalEngine<S>,
}

impl<'a, S: LedgerStore> TransactionManager<'a, S> {
    pub(crate) fn new(engine: &'a JournalEngine<S>) -> Self {
        Self { engine }
    }

    /// Returns true if the transaction is persisted.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn transaction_exists(&self, id: &TransactionId) -> Result<bool, LedgerError> {
        Ok(self.engine.store().transaction_exists(id)?)
    }

    /// Loads a transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID.
    pub fn get_transaction(&self, id: &TransactionId) -> Result<Transaction, LedgerError> {
        self.engine
            .store()
            .get_transaction(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    /// Lists postings on `account` whose transaction time lies in
    /// `from..=until`, in the order they were recorded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account.
    pub fn list_transactions_on_account(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        account: &AccountNumber,
        page: &PageRequest,
    ) -> Result<PageResponse<Transaction>, LedgerError> {
        let store = self.engine.store();
        if !store.account_exists(account)? {
            return Err(LedgerError::account_not_found(account));
        }

        let filter = TransactionFilter::for_account(account).between(from, until);
        let postings = store.scan_transactions(&filter)?;
        Ok(PageResponse::paginate(postings, page, self.engine.max_page_size()))
    }
}
