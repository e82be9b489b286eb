//! In-memory ledger store.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_core::ledger::{Account, Journal, Transaction};
use tally_core::storage::{
    AccountFilter, AccountStore, JournalFilter, JournalStore, LedgerStore, PostingBatch, StoreError,
    TransactionFilter, TransactionStore,
};
use tally_shared::types::{AccountNumber, JournalId, TransactionId};
use tracing::trace;

use crate::repositories::{AccountRepository, JournalRepository, TransactionRepository};

#[derive(Debug, Default)]
struct Tables {
    accounts: AccountRepository,
    transactions: TransactionRepository,
    journals: JournalRepository,
    next_sequence: u64,
}

impl Tables {
    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Every check `write_batch` relies on; nothing is mutated here.
    fn check_batch(&self, batch: &PostingBatch) -> Result<(), StoreError> {
        self.journals.check_insert(&batch.journal)?;

        let mut seen = HashSet::with_capacity(batch.transactions.len());
        for transaction in &batch.transactions {
            self.transactions.check_insert(&transaction.id)?;
            if !seen.insert(&transaction.id) {
                return Err(StoreError::conflict("transaction", transaction.id.as_str()));
            }
        }

        for update in &batch.balances {
            self.accounts.check_balance_update(update)?;
        }
        Ok(())
    }

    fn write_batch(&mut self, batch: &PostingBatch) -> Result<(), StoreError> {
        let sequence = self.next_sequence();
        self.journals.insert(&batch.journal, sequence)?;
        for transaction in &batch.transactions {
            let sequence = self.next_sequence();
            self.transactions.insert(transaction.clone(), sequence)?;
        }
        for update in &batch.balances {
            self.accounts.apply_balance_update(update)?;
        }
        Ok(())
    }
}

/// Ledger store keeping every table in memory behind one `RwLock`.
///
/// Batches are applied under a single write guard, so a reader sees all of a
/// journal's effects or none of them.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

/// Point-in-time copy of every table, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// All accounts.
    pub accounts: Vec<Account>,
    /// All transactions.
    pub transactions: Vec<Transaction>,
    /// All journal headers.
    pub journals: Vec<Journal>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every table under one read guard.
    ///
    /// # Errors
    ///
    /// Returns `Poisoned` if a writer panicked while holding the lock.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let tables = self.read()?;
        Ok(StoreSnapshot {
            accounts: tables.accounts.scan(&AccountFilter::All),
            transactions: tables.transactions.scan(&TransactionFilter::default()),
            journals: tables.journals.scan(&JournalFilter::default()),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::poisoned("ledger tables"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::poisoned("ledger tables"))
    }
}

impl AccountStore for InMemoryLedgerStore {
    fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.get(number).cloned())
    }

    fn account_exists(&self, number: &AccountNumber) -> Result<bool, StoreError> {
        Ok(self.read()?.accounts.contains(number))
    }

    fn put_account(&self, account: Account) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let sequence = tables.next_sequence();
        tables.accounts.upsert(account, sequence);
        Ok(())
    }

    fn scan_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        Ok(self.read()?.accounts.scan(filter))
    }
}

impl TransactionStore for InMemoryLedgerStore {
    fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.read()?.transactions.get(id).cloned())
    }

    fn transaction_exists(&self, id: &TransactionId) -> Result<bool, StoreError> {
        Ok(self.read()?.transactions.contains(id))
    }

    fn put_transaction(&self, transaction: Transaction) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let sequence = tables.next_sequence();
        tables.transactions.insert(transaction, sequence)
    }

    fn scan_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.read()?.transactions.scan(filter))
    }
}

impl JournalStore for InMemoryLedgerStore {
    fn get_journal(&self, id: &JournalId) -> Result<Option<Journal>, StoreError> {
        Ok(self.read()?.journals.get(id).cloned())
    }

    fn journal_exists(&self, id: &JournalId) -> Result<bool, StoreError> {
        Ok(self.read()?.journals.contains(id))
    }

    fn put_journal(&self, journal: Journal) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let sequence = tables.next_sequence();
        tables.journals.insert(&journal, sequence)
    }

    fn scan_journals(&self, filter: &JournalFilter) -> Result<Vec<Journal>, StoreError> {
        Ok(self.read()?.journals.scan(filter))
    }

    fn reversal_of(&self, target: &JournalId) -> Result<Option<JournalId>, StoreError> {
        Ok(self.read()?.journals.reversal_of(target).cloned())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn apply(&self, batch: &PostingBatch) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.check_batch(batch)?;
        // Cannot fail once check_batch passed under the same guard.
        tables.write_batch(batch)?;

        trace!(
            journal_id = %batch.journal.id,
            transactions = tables.transactions.len(),
            journals = tables.journals.len(),
            "Batch applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tally_core::ledger::Direction;
    use tally_core::storage::BalanceUpdate;

    fn account(number: &str) -> Account {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Account {
            number: AccountNumber::from(number),
            currency: "IDR".to_string(),
            name: number.to_string(),
            description: String::new(),
            base_direction: Direction::Debit,
            balance: 0,
            classification_code: String::new(),
            created_time: t,
            created_by: "tester".to_string(),
            updated_time: t,
            updated_by: "tester".to_string(),
        }
    }

    fn batch(journal: &str, transaction: &str, account: &str) -> PostingBatch {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        PostingBatch {
            journal: Journal {
                id: JournalId::from(journal),
                journaling_time: t,
                description: String::new(),
                amount: 5,
                reversed_journal_id: None,
                created_time: t,
                created_by: "tester".to_string(),
                transactions: Vec::new(),
            },
            transactions: vec![Transaction {
                id: TransactionId::from(transaction),
                transaction_time: t,
                account_number: AccountNumber::from(account),
                journal_id: JournalId::from(journal),
                description: String::new(),
                direction: Direction::Debit,
                amount: 5,
                post_balance: 5,
                created_time: t,
                created_by: "tester".to_string(),
            }],
            balances: vec![BalanceUpdate {
                account_number: AccountNumber::from(account),
                balance: 5,
                updated_time: t,
                updated_by: "tester".to_string(),
            }],
        }
    }

    #[test]
    fn test_apply_writes_everything() {
        let store = InMemoryLedgerStore::new();
        store.put_account(account("A1")).unwrap();

        store.apply(&batch("J1", "T1", "A1")).unwrap();

        assert!(store.journal_exists(&JournalId::from("J1")).unwrap());
        assert!(store.transaction_exists(&TransactionId::from("T1")).unwrap());
        assert_eq!(store.get_account(&AccountNumber::from("A1")).unwrap().unwrap().balance, 5);
    }

    #[test]
    fn test_failed_apply_changes_nothing() {
        let store = InMemoryLedgerStore::new();
        store.put_account(account("A1")).unwrap();
        let before = store.snapshot().unwrap();

        // Unknown account in the balance updates
        let err = store.apply(&batch("J1", "T1", "NOPE")).unwrap_err();
        assert!(matches!(err, StoreError::MissingAccount(_)));
        assert_eq!(store.snapshot().unwrap(), before);

        // Transaction ID already taken
        store.apply(&batch("J1", "T1", "A1")).unwrap();
        let before = store.snapshot().unwrap();
        let err = store.apply(&batch("J2", "T1", "A1")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_journal_headers_drop_postings() {
        let store = InMemoryLedgerStore::new();
        store.put_account(account("A1")).unwrap();
        let mut b = batch("J1", "T1", "A1");
        b.journal.transactions = b.transactions.clone();

        store.apply(&b).unwrap();
        let header = store.get_journal(&JournalId::from("J1")).unwrap().unwrap();
        assert!(header.transactions.is_empty());
    }
}
