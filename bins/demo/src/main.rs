//! Tally demo runner
//!
//! Replays a ledger scenario against the in-memory store and prints every
//! persisted journal followed by each account's statement.

mod scenario;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_core::ledger::JournalEngine;
use tally_core::reports::{render_account_statement, render_journal};
use tally_db::InMemoryLedgerStore;
use tally_shared::config::LoggingConfig;
use tally_shared::types::PageRequest;
use tally_shared::{AppConfig, Clock, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scenario::Scenario;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemoryLedgerStore::new());
    let engine = JournalEngine::new(store, clock.clone(), config.ledger.clone());
    info!(commit_mode = ?engine.commit_mode(), "Ledger ready");

    let scenario = match &config.demo.scenario_path {
        Some(path) => {
            info!(path = %path.display(), "Loading scenario");
            Scenario::from_path(path)?
        }
        None => Scenario::builtin(),
    };

    let replay = scenario.replay(&engine)?;
    for (label, error) in &replay.rejected {
        println!("REJECTED {label}: [{}] {error}", error.error_code());
    }
    println!();

    for id in &replay.persisted {
        println!("{}", render_journal(&engine.get_journal(id)?));
    }

    let page = PageRequest::new(0, config.ledger.max_page_size);
    print_statements(&engine, &page, DateTime::<Utc>::UNIX_EPOCH, clock.now())?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Prints the first statement page and a balance audit for every account.
fn print_statements(
    engine: &JournalEngine<InMemoryLedgerStore>,
    page: &PageRequest,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> anyhow::Result<()> {
    let accounts = engine.accounts();

    for account in accounts.list_accounts(page)?.data {
        let postings = engine
            .transactions()
            .list_transactions_on_account(from, until, &account.number, page)?;
        println!("{}", render_account_statement(&account, from, until, &postings));

        let audit = accounts.audit_balance(&account.number)?;
        if audit.is_consistent() {
            println!("Balance audit: OK ({} postings)\n", audit.replayed.posting_count);
        } else {
            warn!(account = %account.number, ?audit, "Balance audit failed");
            println!(
                "Balance audit: MISMATCH cached={} replayed={}\n",
                audit.cached_balance, audit.replayed.current_balance
            );
        }
    }
    Ok(())
}
