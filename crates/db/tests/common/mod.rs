//! Shared setup for ledger integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tally_core::ledger::{Account, Direction, JournalDraft, JournalEngine, NewAccount, TransactionDraft};
use tally_db::InMemoryLedgerStore;
use tally_shared::config::LedgerConfig;
use tally_shared::{CommitMode, ManualClock};

/// Engine over a fresh in-memory store with a controllable clock.
pub struct Harness {
    pub engine: JournalEngine<InMemoryLedgerStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(mode: CommitMode) -> Self {
        Self::with_settings(LedgerConfig {
            commit_mode: mode,
            ..LedgerConfig::default()
        })
    }

    pub fn with_settings(settings: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let engine = JournalEngine::new(Arc::new(InMemoryLedgerStore::new()), clock.clone(), settings);
        Self { engine, clock }
    }

    /// Opens an account in IDR.
    pub fn open(&self, number: &str, base: Direction) -> Account {
        self.open_in(number, "IDR", base)
    }

    pub fn open_in(&self, number: &str, currency: &str, base: Direction) -> Account {
        self.engine
            .accounts()
            .create_account(NewAccount {
                number: number.into(),
                currency: currency.to_string(),
                name: format!("Account {number}"),
                description: format!("Test account {number}"),
                base_direction: base,
                classification_code: "1.1".to_string(),
                created_by: "tester".to_string(),
            })
            .unwrap()
    }

    pub fn balance(&self, number: &str) -> i64 {
        self.engine.accounts().get_account(&number.into()).unwrap().balance
    }

    /// Moves the clock forward one minute.
    pub fn tick(&self) {
        self.clock.advance(Duration::minutes(1));
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

/// Two-line journal: debit `debit_account`, credit `credit_account`.
pub fn transfer(id: &str, debit_account: &str, credit_account: &str, amount: i64) -> JournalDraft {
    JournalDraft::new(id, "tester")
        .with_description(format!("Transfer {id}"))
        .posting(TransactionDraft::debit(format!("{id}-D"), debit_account, amount))
        .posting(TransactionDraft::credit(format!("{id}-C"), credit_account, amount))
}
