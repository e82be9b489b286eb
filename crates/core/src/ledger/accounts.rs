//! Account management.
//!
//! Accounts are opened with a zero balance and only ever change balance
//! through persisted journals. Metadata updates and account creation take the
//! engine's writer lock, so they never interleave with a journal write.

use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountNumber, PageRequest, PageResponse, TransactionId};
use tracing::info;

use super::balance::{self, RunningBalance};
use super::draft::{AccountUpdate, NewAccount};
use super::engine::JournalEngine;
use super::error::LedgerError;
use super::types::Account;
use crate::storage::{AccountFilter, LedgerStore, TransactionFilter};

/// Result of replaying an account's postings against its cached balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAudit {
    /// The audited account.
    pub account_number: AccountNumber,
    /// Balance stored on the account.
    pub cached_balance: i64,
    /// Balance obtained by folding every posting from zero.
    pub replayed: RunningBalance,
    /// First posting whose recorded post-balance disagrees with the replay.
    pub first_mismatch: Option<TransactionId>,
}

impl BalanceAudit {
    /// Returns true if every post-balance and the cached balance agree with the replay.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.first_mismatch.is_none() && self.cached_balance == self.replayed.current_balance
    }
}

/// Account operations bound to a journal engine.
pub struct AccountManager<'a, S> {
    engine: &'a JournalEngine<S>,
}

impl<'a, S: LedgerStore> AccountManager<'a, S> {
    pub(crate) fn new(engine: &'a JournalEngine<S>) -> Self {
        Self { engine }
    }

    /// Opens a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error, `AccountAlreadyPersisted`, or a storage error.
    pub fn create_account(&self, input: NewAccount) -> Result<Account, LedgerError> {
        check_fields(&input.number, &input.name, &input.description, &input.created_by)?;

        let mut writer = self.engine.lock_writer();
        let store = self.engine.store();
        if store.account_exists(&input.number)? {
            return Err(LedgerError::AccountAlreadyPersisted(input.number));
        }

        let now = self.engine.stamp(&mut writer);
        let account = Account {
            number: input.number,
            currency: input.currency,
            name: input.name,
            description: input.description,
            base_direction: input.base_direction,
            balance: 0,
            classification_code: input.classification_code,
            created_time: now,
            updated_by: input.created_by.clone(),
            created_by: input.created_by,
            updated_time: now,
        };
        store.put_account(account.clone())?;

        info!(
            account_number = %account.number,
            currency = %account.currency,
            base_direction = %account.base_direction,
            "Account created"
        );
        Ok(account)
    }

    /// Changes an account's name, description and classification code.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error, `AccountNotPersisted`, or a storage error.
    pub fn update_account(&self, update: AccountUpdate) -> Result<Account, LedgerError> {
        check_fields(&update.number, &update.name, &update.description, &update.updated_by)?;

        let mut writer = self.engine.lock_writer();
        let store = self.engine.store();
        let current = store
            .get_account(&update.number)?
            .ok_or_else(|| LedgerError::AccountNotPersisted(update.number.clone()))?;

        let account = Account {
            name: update.name,
            description: update.description,
            classification_code: update.classification_code,
            updated_time: self.engine.stamp(&mut writer),
            updated_by: update.updated_by,
            ..current
        };
        store.put_account(account.clone())?;

        info!(account_number = %account.number, "Account updated");
        Ok(account)
    }

    /// Returns true if the account exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn account_exists(&self, number: &AccountNumber) -> Result<bool, LedgerError> {
        Ok(self.engine.store().account_exists(number)?)
    }

    /// Loads an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown number.
    pub fn get_account(&self, number: &AccountNumber) -> Result<Account, LedgerError> {
        self.engine
            .store()
            .get_account(number)?
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    /// Lists all accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list_accounts(&self, page: &PageRequest) -> Result<PageResponse<Account>, LedgerError> {
        self.scan(&AccountFilter::All, page)
    }

    /// Lists accounts with the given classification code.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list_accounts_by_coa(&self, code: &str, page: &PageRequest) -> Result<PageResponse<Account>, LedgerError> {
        self.scan(&AccountFilter::Classification(code.to_string()), page)
    }

    /// Lists accounts whose name contains `name_like`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn find_accounts(&self, name_like: &str, page: &PageRequest) -> Result<PageResponse<Account>, LedgerError> {
        self.scan(&AccountFilter::NameContains(name_like.to_string()), page)
    }

    /// Replays every posting on the account and compares with the stored balances.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown number, `BalanceOverflow` if the
    /// replay leaves `i64`, or a storage error.
    pub fn audit_balance(&self, number: &AccountNumber) -> Result<BalanceAudit, LedgerError> {
        let account = self.get_account(number)?;
        let postings = self
            .engine
            .store()
            .scan_transactions(&TransactionFilter::for_account(number))?;

        let replayed = balance::replay(
            account.base_direction,
            postings.iter().map(|p| (p.direction, p.amount, p.post_balance)),
        )
        .ok_or_else(|| LedgerError::BalanceOverflow(number.clone()))?;

        Ok(BalanceAudit {
            account_number: account.number,
            cached_balance: account.balance,
            replayed: replayed.running,
            first_mismatch: replayed
                .first_mismatch
                .and_then(|index| postings.get(index))
                .map(|posting| posting.id.clone()),
        })
    }

    fn scan(&self, filter: &AccountFilter, page: &PageRequest) -> Result<PageResponse<Account>, LedgerError> {
        let accounts = self.engine.store().scan_accounts(filter)?;
        Ok(PageResponse::paginate(accounts, page, self.engine.max_page_size()))
    }
}

fn check_fields(number: &AccountNumber, name: &str, description: &str, author: &str) -> Result<(), LedgerError> {
    if number.is_blank() {
        return Err(LedgerError::AccountMissingNumber);
    }
    if name.trim().is_empty() {
        return Err(LedgerError::AccountMissingName);
    }
    if description.trim().is_empty() {
        return Err(LedgerError::AccountMissingDescription);
    }
    if author.trim().is_empty() {
        return Err(LedgerError::AccountMissingCreator);
    }
    Ok(())
}
