//! Ledger scenarios: accounts to open, journals to post, reversals to draft.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Value, json};
use tally_core::ledger::{Direction, JournalDraft, JournalEngine, LedgerError, NewAccount, ReversalBuilder};
use tally_core::storage::LedgerStore;
use tally_shared::types::JournalId;
use tracing::{info, warn};

/// A scenario file.
///
/// Journals stay raw JSON so that `null` or malformed entries reach the
/// ledger's own decoding and are reported like any other rejection.
#[derive(Debug, Default, Deserialize)]
pub struct Scenario {
    /// Accounts opened first, in order.
    #[serde(default)]
    pub accounts: Vec<NewAccount>,
    /// Journal drafts, persisted in order.
    #[serde(default)]
    pub journals: Vec<Value>,
    /// Reversals drafted from persisted journals, after all journals.
    #[serde(default)]
    pub reversals: Vec<ReversalRequest>,
}

/// Request to reverse a persisted journal.
#[derive(Debug, Clone, Deserialize)]
pub struct ReversalRequest {
    /// Journal to reverse.
    pub journal_id: JournalId,
    /// ID of the reversal journal.
    pub reversal_id: JournalId,
    /// Reversal description.
    #[serde(default)]
    pub reason: Option<String>,
    /// Author; defaults to the source journal's author.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// What happened while replaying a scenario.
#[derive(Debug, Default)]
pub struct Replay {
    /// Journals applied, in order.
    pub persisted: Vec<JournalId>,
    /// Rejected entries with the error that stopped them.
    pub rejected: Vec<(String, LedgerError)>,
}

impl Scenario {
    /// Reads a scenario from a JSON file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Two accounts, one transfer, its reversal, and a rejected second reversal.
    pub fn builtin() -> Self {
        let account = |number: &str, name: &str, base| NewAccount {
            number: number.into(),
            currency: "IDR".to_string(),
            name: name.to_string(),
            description: format!("{name} account"),
            base_direction: base,
            classification_code: "1.1".to_string(),
            created_by: "demo".to_string(),
        };

        Self {
            accounts: vec![
                account("A1", "Cash", Direction::Debit),
                account("A2", "Owner capital", Direction::Credit),
            ],
            journals: vec![
                json!({
                    "id": "J1",
                    "description": "Owner capital injection",
                    "created_by": "demo",
                    "transactions": [
                        { "id": "J1-1", "account_number": "A1", "direction": "debit", "amount": 100, "description": "Cash in" },
                        { "id": "J1-2", "account_number": "A2", "direction": "credit", "amount": 100, "description": "Capital" }
                    ]
                }),
                Value::Null,
            ],
            reversals: vec![
                ReversalRequest {
                    journal_id: "J1".into(),
                    reversal_id: "J2".into(),
                    reason: Some("Capital injection entered twice".to_string()),
                    created_by: None,
                },
                ReversalRequest {
                    journal_id: "J1".into(),
                    reversal_id: "J3".into(),
                    reason: None,
                    created_by: None,
                },
            ],
        }
    }

    /// Opens the accounts, then persists journals and reversals.
    ///
    /// Rejections are collected rather than returned; only a storage failure
    /// stops the replay.
    pub fn replay<S: LedgerStore>(self, engine: &JournalEngine<S>) -> Result<Replay, LedgerError> {
        let mut replay = Replay::default();

        for input in self.accounts {
            let number = input.number.to_string();
            match engine.accounts().create_account(input) {
                Ok(_) => {}
                Err(e @ LedgerError::Storage(_)) => return Err(e),
                Err(e) => {
                    warn!(account = %number, error_code = e.error_code(), "Account rejected");
                    replay.rejected.push((format!("account {number}"), e));
                }
            }
        }

        for (index, value) in self.journals.into_iter().enumerate() {
            let label = format!("journal #{}", index + 1);
            let draft = match JournalDraft::from_value(value) {
                Ok(draft) => draft,
                Err(e) => {
                    warn!(entry = index + 1, error_code = e.error_code(), "Journal entry not decodable");
                    replay.rejected.push((label, e));
                    continue;
                }
            };
            replay.record(label, post(engine, &draft))?;
        }

        for request in self.reversals {
            let label = format!("reversal {} of {}", request.reversal_id, request.journal_id);
            let source = match engine.get_journal(&request.journal_id) {
                Ok(source) => source,
                Err(e) => {
                    replay.record(label, Err(e))?;
                    continue;
                }
            };

            let mut builder = ReversalBuilder::for_journal(&source).journal_id(request.reversal_id);
            if let Some(reason) = request.reason {
                builder = builder.description(reason);
            }
            if let Some(author) = request.created_by {
                builder = builder.created_by(author);
            }
            replay.record(label, post(engine, &builder.build()))?;
        }

        info!(
            persisted = replay.persisted.len(),
            rejected = replay.rejected.len(),
            "Scenario replayed"
        );
        Ok(replay)
    }
}

impl Replay {
    fn record(&mut self, label: String, result: Result<JournalId, LedgerError>) -> Result<(), LedgerError> {
        match result {
            Ok(id) => self.persisted.push(id),
            Err(e @ LedgerError::Storage(_)) => return Err(e),
            Err(e) => self.rejected.push((label, e)),
        }
        Ok(())
    }
}

/// Persists a draft and commits it straight away in staged mode.
///
/// A staged journal whose commit fails is cancelled, so its IDs are not left
/// reserved.
fn post<S: LedgerStore>(engine: &JournalEngine<S>, draft: &JournalDraft) -> Result<JournalId, LedgerError> {
    let outcome = engine.persist_journal(draft)?;
    if outcome.is_staged() {
        if let Err(e) = engine.commit_journal(outcome.journal_id()) {
            if let Err(cancel) = engine.cancel_journal(outcome.journal_id()) {
                warn!(journal_id = %outcome.journal_id(), error_code = cancel.error_code(), "Cancel after failed commit");
            }
            return Err(e);
        }
    }
    Ok(outcome.journal_id().clone())
}
