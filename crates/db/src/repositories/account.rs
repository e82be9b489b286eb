//! Account table.

use std::collections::HashMap;

use tally_core::ledger::Account;
use tally_core::storage::{AccountFilter, BalanceUpdate, StoreError};
use tally_shared::types::AccountNumber;

use super::Row;

/// Accounts keyed by number.
#[derive(Debug, Clone, Default)]
pub struct AccountRepository {
    rows: HashMap<AccountNumber, Row<Account>>,
}

impl AccountRepository {
    /// Loads an account.
    #[must_use]
    pub fn get(&self, number: &AccountNumber) -> Option<&Account> {
        self.rows.get(number).map(|row| &row.record)
    }

    /// Returns true if the account is stored.
    #[must_use]
    pub fn contains(&self, number: &AccountNumber) -> bool {
        self.rows.contains_key(number)
    }

    /// Inserts or replaces an account. A replaced account keeps its original
    /// position in scans.
    pub fn upsert(&mut self, account: Account, sequence: u64) {
        let sequence = self
            .rows
            .get(&account.number)
            .map_or(sequence, |row| row.sequence);
        self.rows.insert(
            account.number.clone(),
            Row {
                sequence,
                record: account,
            },
        );
    }

    /// Fails if `update` targets an unknown account.
    pub fn check_balance_update(&self, update: &BalanceUpdate) -> Result<(), StoreError> {
        if self.contains(&update.account_number) {
            Ok(())
        } else {
            Err(StoreError::MissingAccount(update.account_number.to_string()))
        }
    }

    /// Writes a new cached balance.
    pub fn apply_balance_update(&mut self, update: &BalanceUpdate) -> Result<(), StoreError> {
        let row = self
            .rows
            .get_mut(&update.account_number)
            .ok_or_else(|| StoreError::MissingAccount(update.account_number.to_string()))?;
        row.record.balance = update.balance;
        row.record.updated_time = update.updated_time;
        row.record.updated_by.clone_from(&update.updated_by);
        Ok(())
    }

    /// Lists matching accounts by creation time, then insertion order.
    #[must_use]
    pub fn scan(&self, filter: &AccountFilter) -> Vec<Account> {
        let mut rows: Vec<&Row<Account>> = self
            .rows
            .values()
            .filter(|row| filter.matches(&row.record))
            .collect();
        rows.sort_by_key(|row| (row.record.created_time, row.sequence));
        rows.into_iter().map(|row| row.record.clone()).collect()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no account is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tally_core::ledger::Direction;

    fn account(number: &str, name: &str, coa: &str, created: DateTime<Utc>) -> Account {
        Account {
            number: AccountNumber::from(number),
            currency: "IDR".to_string(),
            name: name.to_string(),
            description: String::new(),
            base_direction: Direction::Debit,
            balance: 0,
            classification_code: coa.to_string(),
            created_time: created,
            created_by: "tester".to_string(),
            updated_time: created,
            updated_by: "tester".to_string(),
        }
    }

    #[test]
    fn test_scan_orders_by_creation_then_sequence() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut repo = AccountRepository::default();
        repo.upsert(account("C", "Late", "1", t1), 1);
        repo.upsert(account("B", "Tie second", "1", t0), 3);
        repo.upsert(account("A", "Tie first", "2", t0), 2);

        let numbers: Vec<String> = repo
            .scan(&AccountFilter::All)
            .into_iter()
            .map(|a| a.number.into_inner())
            .collect();
        assert_eq!(numbers, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut repo = AccountRepository::default();
        repo.upsert(account("A", "Cash", "1", t0), 1);
        repo.upsert(account("B", "Bank", "1", t0), 2);
        repo.upsert(account("A", "Petty cash", "1", t0), 3);

        let scanned = repo.scan(&AccountFilter::All);
        assert_eq!(scanned[0].name, "Petty cash");
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_filters() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut repo = AccountRepository::default();
        repo.upsert(account("A", "Cash Drawer", "1.1", t0), 1);
        repo.upsert(account("B", "Bank", "1.2", t0), 2);

        assert_eq!(repo.scan(&AccountFilter::Classification("1.2".into())).len(), 1);
        assert_eq!(repo.scan(&AccountFilter::NameContains("drawer".into()))[0].number.as_str(), "A");
        assert!(repo.scan(&AccountFilter::NameContains("loan".into())).is_empty());
    }

    #[test]
    fn test_balance_update_on_missing_account() {
        let repo = AccountRepository::default();
        let update = BalanceUpdate {
            account_number: AccountNumber::from("X"),
            balance: 1,
            updated_time: Utc::now(),
            updated_by: "tester".to_string(),
        };
        assert!(matches!(
            repo.check_balance_update(&update),
            Err(StoreError::MissingAccount(_))
        ));
    }
}
