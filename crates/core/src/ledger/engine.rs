//! Journal engine.
//!
//! The engine validates journals, computes post-transaction balances and hands
//! the resulting [`PostingBatch`] to the store in one atomic `apply`.
//!
//! # Concurrency
//!
//! Every write (journal persist, commit, cancel, account create/update) runs
//! under one writer mutex, held from the first validation read until the
//! store has applied the batch. Reads go straight to the store and never
//! wait on the writer.
//!
//! Audit timestamps are taken under the writer lock and never run backwards,
//! even if the clock does, so creation time order is write order.
//!
//! # Commit modes
//!
//! - [`CommitMode::Immediate`]: persist applies the journal at once and commit is a no-op
//! - [`CommitMode::Staged`]: persist reserves the journal's IDs and keeps it aside
//!   until `commit_journal` applies it or `cancel_journal` drops it

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountNumber, JournalId, PageRequest, PageResponse, TransactionId};
use tally_shared::{Clock, CommitMode};
use tracing::{debug, info, warn};

use super::accounts::AccountManager;
use super::balance;
use super::draft::JournalDraft;
use super::error::LedgerError;
use super::transactions::TransactionManager;
use super::types::{Account, Journal, Transaction};
use super::validation::{LedgerView, ValidatedJournal, validate_accounts, validate_journal};
use crate::storage::{BalanceUpdate, JournalFilter, LedgerStore, PostingBatch, TransactionFilter};

/// Result of [`JournalEngine::persist_journal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The journal is applied and visible.
    Committed(Journal),
    /// The journal is validated and reserved, waiting for commit or cancel.
    Staged {
        /// The staged journal.
        journal_id: JournalId,
        /// Journal amount.
        amount: i64,
    },
}

impl PersistOutcome {
    /// ID of the persisted or staged journal.
    #[must_use]
    pub fn journal_id(&self) -> &JournalId {
        match self {
            Self::Committed(journal) => &journal.id,
            Self::Staged { journal_id, .. } => journal_id,
        }
    }

    /// The applied journal, if the outcome is `Committed`.
    #[must_use]
    pub fn into_committed(self) -> Option<Journal> {
        match self {
            Self::Committed(journal) => Some(journal),
            Self::Staged { .. } => None,
        }
    }

    /// Returns true if the journal is waiting for commit.
    #[must_use]
    pub fn is_staged(&self) -> bool {
        matches!(self, Self::Staged { .. })
    }
}

/// A validated journal waiting for commit.
#[derive(Debug, Clone)]
struct StagedJournal {
    draft: JournalDraft,
    amount: i64,
}

/// Writer state: reservations held by staged journals and the last audit
/// timestamp handed out. Guarded by the writer mutex.
#[derive(Debug, Default)]
pub(crate) struct StagingArea {
    journals: HashMap<JournalId, StagedJournal>,
    transactions: HashSet<TransactionId>,
    reversal_targets: HashSet<JournalId>,
    last_stamp: Option<DateTime<Utc>>,
}

impl StagingArea {
    /// Returns `now`, or the previous stamp if the clock went backwards.
    fn stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = self.last_stamp.map_or(now, |last| last.max(now));
        self.last_stamp = Some(stamp);
        stamp
    }

    fn stage(&mut self, draft: JournalDraft, amount: i64) {
        self.transactions
            .extend(draft.transactions.iter().map(|line| line.id.clone()));
        if let Some(target) = &draft.reverses {
            self.reversal_targets.insert(target.clone());
        }
        self.journals
            .insert(draft.id.clone(), StagedJournal { draft, amount });
    }

    fn release(&mut self, id: &JournalId) -> Option<StagedJournal> {
        let staged = self.journals.remove(id)?;
        for line in &staged.draft.transactions {
            self.transactions.remove(&line.id);
        }
        if let Some(target) = &staged.draft.reverses {
            self.reversal_targets.remove(target);
        }
        Some(staged)
    }
}

/// Store state overlaid with staging reservations.
struct StagedView<'a, S> {
    store: &'a S,
    staging: &'a StagingArea,
}

impl<S: LedgerStore> LedgerView for StagedView<'_, S> {
    fn journal_taken(&self, id: &JournalId) -> Result<bool, LedgerError> {
        Ok(self.staging.journals.contains_key(id) || self.store.journal_exists(id)?)
    }

    fn journal_persisted(&self, id: &JournalId) -> Result<bool, LedgerError> {
        Ok(self.store.journal_exists(id)?)
    }

    fn transaction_taken(&self, id: &TransactionId) -> Result<bool, LedgerError> {
        Ok(self.staging.transactions.contains(id) || self.store.transaction_exists(id)?)
    }

    fn account(&self, number: &AccountNumber) -> Result<Option<Account>, LedgerError> {
        Ok(self.store.get_account(number)?)
    }

    fn is_reversed(&self, target: &JournalId) -> Result<bool, LedgerError> {
        Ok(self.staging.reversal_targets.contains(target) || self.store.reversal_of(target)?.is_some())
    }
}

/// The journal engine.
pub struct JournalEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: LedgerConfig,
    writer: Mutex<StagingArea>,
}

impl<S: LedgerStore> JournalEngine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, settings: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            settings,
            writer: Mutex::new(StagingArea::default()),
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configured commit mode.
    #[must_use]
    pub fn commit_mode(&self) -> CommitMode {
        self.settings.commit_mode
    }

    /// Account management over the same store and writer lock.
    #[must_use]
    pub fn accounts(&self) -> AccountManager<'_, S> {
        AccountManager::new(self)
    }

    /// Transaction queries.
    #[must_use]
    pub fn transactions(&self) -> TransactionManager<'_, S> {
        TransactionManager::new(self)
    }

    // ========== Writes ==========

    /// Validates `draft` and persists it, or stages it in staged mode.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation check, or a storage error. On
    /// any error nothing is written.
    pub fn persist_journal(&self, draft: &JournalDraft) -> Result<PersistOutcome, LedgerError> {
        let mut staging = self.lock_writer();
        let validated = {
            let view = StagedView {
                store: self.store.as_ref(),
                staging: &staging,
            };
            validate_journal(Some(draft), &view).map_err(|e| rejected(&draft.id, e))?
        };

        match self.settings.commit_mode {
            CommitMode::Immediate => {
                let now = self.stamp(&mut staging);
                let journal = self.apply(draft, &validated, now).map_err(|e| rejected(&draft.id, e))?;
                Ok(PersistOutcome::Committed(journal))
            }
            CommitMode::Staged => {
                staging.stage(draft.clone(), validated.amount);
                debug!(journal_id = %draft.id, amount = validated.amount, "Journal staged");
                Ok(PersistOutcome::Staged {
                    journal_id: draft.id.clone(),
                    amount: validated.amount,
                })
            }
        }
    }

    /// Parses a JSON journal and persists it.
    ///
    /// # Errors
    ///
    /// Returns `NilJournal` for `null`, `MalformedJournal` for unparseable
    /// input, otherwise as [`JournalEngine::persist_journal`].
    pub fn persist_journal_json(&self, input: &str) -> Result<PersistOutcome, LedgerError> {
        let draft = JournalDraft::from_json(input).map_err(|e| {
            warn!(error_code = e.error_code(), error = %e, "Journal rejected");
            e
        })?;
        self.persist_journal(&draft)
    }

    /// Makes a persisted or staged journal final.
    ///
    /// In immediate mode, or for a journal that is already applied, this is a
    /// no-op that returns the journal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID. For a staged journal, returns
    /// `AccountNotPersisted`, `MixedCurrency` or `BalanceOverflow` when the
    /// ledger changed since staging; the journal then stays staged.
    pub fn commit_journal(&self, id: &JournalId) -> Result<Journal, LedgerError> {
        let mut staging = self.lock_writer();

        let Some(staged) = staging.journals.get(id).cloned() else {
            drop(staging);
            return self.get_journal(id);
        };

        let accounts = {
            let view = StagedView {
                store: self.store.as_ref(),
                staging: &staging,
            };
            validate_accounts(&staged.draft, &view).map_err(|e| rejected(id, e))?
        };
        let validated = ValidatedJournal {
            amount: staged.amount,
            accounts,
        };
        let now = self.stamp(&mut staging);
        let journal = self.apply(&staged.draft, &validated, now).map_err(|e| rejected(id, e))?;
        staging.release(id);
        debug!(journal_id = %id, "Staged journal committed");
        Ok(journal)
    }

    /// Discards a staged journal and releases its reservations.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCommitted` for an applied journal and `NotFound` for
    /// an unknown ID.
    pub fn cancel_journal(&self, id: &JournalId) -> Result<(), LedgerError> {
        let mut staging = self.lock_writer();
        if staging.release(id).is_some() {
            debug!(journal_id = %id, "Staged journal cancelled");
            return Ok(());
        }
        if self.store.journal_exists(id)? {
            return Err(LedgerError::AlreadyCommitted(id.clone()));
        }
        Err(LedgerError::journal_not_found(id))
    }

    /// IDs of journals waiting for commit.
    #[must_use]
    pub fn staged_journals(&self) -> Vec<JournalId> {
        let mut ids: Vec<JournalId> = self.lock_writer().journals.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ========== Reads ==========

    /// Returns true if the journal is persisted.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn journal_exists(&self, id: &JournalId) -> Result<bool, LedgerError> {
        Ok(self.store.journal_exists(id)?)
    }

    /// Returns true if some persisted journal reverses `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not persisted.
    pub fn is_journal_reversed(&self, id: &JournalId) -> Result<bool, LedgerError> {
        Ok(self.reversing_journal(id)?.is_some())
    }

    /// ID of the journal that reverses `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not persisted.
    pub fn reversing_journal(&self, id: &JournalId) -> Result<Option<JournalId>, LedgerError> {
        if !self.store.journal_exists(id)? {
            return Err(LedgerError::journal_not_found(id));
        }
        Ok(self.store.reversal_of(id)?)
    }

    /// Loads a journal with its postings in creation order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID and `ReversalChainInconsistent`
    /// for a reversal whose target cannot be loaded.
    pub fn get_journal(&self, id: &JournalId) -> Result<Journal, LedgerError> {
        let header = self
            .store
            .get_journal(id)?
            .ok_or_else(|| LedgerError::journal_not_found(id))?;

        if let Some(target) = &header.reversed_journal_id
            && !self.store.journal_exists(target)?
        {
            return Err(LedgerError::ReversalChainInconsistent {
                journal: id.clone(),
                target: target.clone(),
            });
        }

        self.with_transactions(header)
    }

    /// Loads the journal that `id` reverses.
    ///
    /// Returns `None` when `id` is not a reversal.
    ///
    /// # Errors
    ///
    /// Same as [`JournalEngine::get_journal`].
    pub fn reversed_journal(&self, id: &JournalId) -> Result<Option<Journal>, LedgerError> {
        let journal = self.get_journal(id)?;
        let Some(target) = journal.reversed_journal_id else {
            return Ok(None);
        };
        match self.get_journal(&target) {
            Ok(reversed) => Ok(Some(reversed)),
            Err(e) if e.is_not_found() => Err(LedgerError::ReversalChainInconsistent {
                journal: id.clone(),
                target,
            }),
            Err(e) => Err(e),
        }
    }

    /// Lists journals whose journaling time lies in `from..=until`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list_journals(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        page: &PageRequest,
    ) -> Result<PageResponse<Journal>, LedgerError> {
        let filter = JournalFilter {
            from: Some(from),
            until: Some(until),
        };
        let headers = self.store.scan_journals(&filter)?;
        let page = PageResponse::paginate(headers, page, self.settings.max_page_size);

        let data = page
            .data
            .into_iter()
            .map(|header| self.with_transactions(header))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse { data, meta: page.meta })
    }

    // ========== Internals ==========

    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, StagingArea> {
        // The store applies batches atomically, so a writer that panicked
        // cannot have left a partial journal behind.
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Audit timestamp for a write. Caller holds the writer lock.
    pub(crate) fn stamp(&self, writer: &mut StagingArea) -> DateTime<Utc> {
        writer.stamp(self.clock.now())
    }

    pub(crate) fn max_page_size(&self) -> u32 {
        self.settings.max_page_size
    }

    fn with_transactions(&self, header: Journal) -> Result<Journal, LedgerError> {
        let transactions = self
            .store
            .scan_transactions(&TransactionFilter::for_journal(&header.id))?;
        Ok(Journal {
            transactions,
            ..header
        })
    }

    /// Computes post-balances and writes the journal. Caller holds the writer lock.
    fn apply(&self, draft: &JournalDraft, validated: &ValidatedJournal, now: DateTime<Utc>) -> Result<Journal, LedgerError> {
        let batch = build_batch(draft, validated, now)?;
        self.store.apply(&batch)?;

        info!(
            journal_id = %batch.journal.id,
            amount = batch.journal.amount,
            postings = batch.transactions.len(),
            reversal_of = ?batch.journal.reversed_journal_id,
            "Journal persisted"
        );

        Ok(Journal {
            transactions: batch.transactions,
            ..batch.journal
        })
    }
}

fn rejected(journal_id: &JournalId, error: LedgerError) -> LedgerError {
    warn!(
        journal_id = %journal_id,
        error_code = error.error_code(),
        error = %error,
        "Journal rejected"
    );
    error
}

/// Builds the write batch for a validated draft.
///
/// `validated.accounts` must be aligned with `draft.transactions`.
fn build_batch(
    draft: &JournalDraft,
    validated: &ValidatedJournal,
    now: DateTime<Utc>,
) -> Result<PostingBatch, LedgerError> {
    let journaling_time = draft.journaling_time.unwrap_or(now);
    let mut transactions = Vec::with_capacity(draft.transactions.len());
    let mut balances = Vec::with_capacity(draft.transactions.len());

    for (line, account) in draft.transactions.iter().zip(&validated.accounts) {
        let post_balance = balance::propagate(account.balance, account.base_direction, line.direction, line.amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(account.number.clone()))?;

        transactions.push(Transaction {
            id: line.id.clone(),
            transaction_time: line.transaction_time.unwrap_or(journaling_time),
            account_number: account.number.clone(),
            journal_id: draft.id.clone(),
            description: line.description.clone(),
            direction: line.direction,
            amount: line.amount,
            post_balance,
            created_time: now,
            created_by: draft.created_by.clone(),
        });
        balances.push(BalanceUpdate {
            account_number: account.number.clone(),
            balance: post_balance,
            updated_time: now,
            updated_by: draft.created_by.clone(),
        });
    }

    let journal = Journal {
        id: draft.id.clone(),
        journaling_time,
        description: draft.description.clone(),
        amount: validated.amount,
        reversed_journal_id: draft.reverses.clone(),
        created_time: now,
        created_by: draft.created_by.clone(),
        transactions: Vec::new(),
    };

    Ok(PostingBatch {
        journal,
        transactions,
        balances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::draft::TransactionDraft;
    use crate::ledger::types::Direction;
    use chrono::TimeZone;

    fn account(number: &str, base: Direction, balance: i64) -> Account {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Account {
            number: AccountNumber::from(number),
            currency: "IDR".to_string(),
            name: number.to_string(),
            description: String::new(),
            base_direction: base,
            balance,
            classification_code: String::new(),
            created_time: t,
            created_by: "tester".to_string(),
            updated_time: t,
            updated_by: "tester".to_string(),
        }
    }

    #[test]
    fn test_build_batch_computes_post_balances() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let draft = JournalDraft::new("J1", "alice")
            .posting(TransactionDraft::debit("T1", "CASH", 100))
            .posting(TransactionDraft::credit("T2", "CAPITAL", 100));
        let validated = ValidatedJournal {
            amount: 100,
            accounts: vec![
                account("CASH", Direction::Debit, 50),
                account("CAPITAL", Direction::Debit, 50),
            ],
        };

        let batch = build_batch(&draft, &validated, now).unwrap();

        assert_eq!(batch.journal.amount, 100);
        assert_eq!(batch.journal.journaling_time, now);
        assert_eq!(batch.transactions[0].post_balance, 150);
        assert_eq!(batch.transactions[1].post_balance, -50);
        assert_eq!(batch.transactions[1].transaction_time, now);
        assert_eq!(batch.balances[1].balance, -50);
        assert_eq!(batch.balances[1].updated_by, "alice");
    }

    #[test]
    fn test_build_batch_keeps_caller_times() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let booked = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap();
        let draft = JournalDraft::new("J1", "alice")
            .at(booked)
            .posting(TransactionDraft::debit("T1", "CASH", 5))
            .posting(TransactionDraft::credit("T2", "CAPITAL", 5).at(now));
        let validated = ValidatedJournal {
            amount: 5,
            accounts: vec![
                account("CASH", Direction::Debit, 0),
                account("CAPITAL", Direction::Credit, 0),
            ],
        };

        let batch = build_batch(&draft, &validated, now).unwrap();
        assert_eq!(batch.journal.journaling_time, booked);
        assert_eq!(batch.transactions[0].transaction_time, booked);
        assert_eq!(batch.transactions[1].transaction_time, now);
        assert_eq!(batch.journal.created_time, now);
    }

    #[test]
    fn test_build_batch_rejects_overflow() {
        let draft = JournalDraft::new("J1", "alice")
            .posting(TransactionDraft::debit("T1", "CASH", 1))
            .posting(TransactionDraft::credit("T2", "CAPITAL", 1));
        let validated = ValidatedJournal {
            amount: 1,
            accounts: vec![
                account("CASH", Direction::Debit, i64::MAX),
                account("CAPITAL", Direction::Credit, 0),
            ],
        };

        assert!(matches!(
            build_batch(&draft, &validated, Utc::now()),
            Err(LedgerError::BalanceOverflow(n)) if n.as_str() == "CASH"
        ));
    }

    #[test]
    fn test_staging_area_release_frees_reservations() {
        let mut staging = StagingArea::default();
        let draft = JournalDraft::new("J2", "alice")
            .reversing("J1")
            .posting(TransactionDraft::debit("T1", "CASH", 1))
            .posting(TransactionDraft::credit("T2", "CAPITAL", 1));
        staging.stage(draft, 1);

        assert!(staging.transactions.contains(&TransactionId::from("T1")));
        assert!(staging.reversal_targets.contains(&JournalId::from("J1")));

        let released = staging.release(&JournalId::from("J2")).unwrap();
        assert_eq!(released.amount, 1);
        assert!(staging.transactions.is_empty());
        assert!(staging.reversal_targets.is_empty());
        assert!(staging.release(&JournalId::from("J2")).is_none());
    }

    #[test]
    fn test_stamp_never_runs_backwards() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 10, 0).unwrap();
        let mut staging = StagingArea::default();

        assert_eq!(staging.stamp(t), t);
        assert_eq!(staging.stamp(t - chrono::Duration::minutes(5)), t);
        assert_eq!(staging.stamp(t + chrono::Duration::minutes(1)), t + chrono::Duration::minutes(1));
    }

    #[test]
    fn test_persist_outcome_accessors() {
        let staged = PersistOutcome::Staged {
            journal_id: JournalId::from("J1"),
            amount: 10,
        };
        assert!(staged.is_staged());
        assert_eq!(staged.journal_id().as_str(), "J1");
        assert!(staged.into_committed().is_none());
    }
}
