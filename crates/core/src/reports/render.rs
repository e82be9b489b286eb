//! Text rendering of journals and account statements.

use chrono::{DateTime, Utc};
use prettytable::{Table, row};
use tally_shared::types::PageResponse;

use crate::ledger::types::{Account, Direction, Journal, Transaction};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Renders a journal: a short header followed by its postings, debits first,
/// then credits, with a totals row at the bottom.
#[must_use]
pub fn render_journal(journal: &Journal) -> String {
    let mut table = Table::new();
    table.set_titles(row!["TRX ID", "Account", "Description", "DEBIT", "CREDIT"]);

    for posting in journal.transactions.iter().filter(|t| t.direction == Direction::Debit) {
        table.add_row(row![posting.id, posting.account_number, posting.description, posting.amount, ""]);
    }
    for posting in journal.transactions.iter().filter(|t| t.direction == Direction::Credit) {
        table.add_row(row![posting.id, posting.account_number, posting.description, "", posting.amount]);
    }
    table.add_row(row!["", "", "TOTAL", journal.total_debit(), journal.total_credit()]);

    let mut out = format!(
        "Journal Entry : {}\nJournal Date  : {}\nDescription   : {}\n",
        journal.id,
        format_time(&journal.journaling_time),
        journal.description
    );
    if let Some(target) = &journal.reversed_journal_id {
        out.push_str(&format!("Reverses      : {target}\n"));
    }
    out.push_str(&table.to_string());
    out
}

/// Renders one page of an account's postings with the account header.
#[must_use]
pub fn render_account_statement(
    account: &Account,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    page: &PageResponse<Transaction>,
) -> String {
    let mut table = Table::new();
    table.set_titles(row!["TRX ID", "TIME", "JOURNAL ID", "Description", "DEBIT", "CREDIT", "BALANCE"]);

    for posting in &page.data {
        let (debit, credit) = match posting.direction {
            Direction::Debit => (posting.amount.to_string(), String::new()),
            Direction::Credit => (String::new(), posting.amount.to_string()),
        };
        table.add_row(row![
            posting.id,
            format_time(&posting.transaction_time),
            posting.journal_id,
            posting.description,
            debit,
            credit,
            posting.post_balance
        ]);
    }

    let header = [
        format!("Account Number    : {}", account.number),
        format!("Account Name      : {}", account.name),
        format!("Description       : {}", account.description),
        format!("Currency          : {}", account.currency),
        format!("COA               : {}", account.classification_code),
        format!("Transactions From : {}", format_time(&from)),
        format!("Transactions To   : {}", format_time(&until)),
        format!("#Transactions     : {}", page.meta.total),
        format!(
            "Showing page      : {}/{}",
            u64::from(page.meta.page) + 1,
            page.meta.total_pages
        ),
    ];

    let mut out = header.join("\n");
    out.push('\n');
    out.push_str(&table.to_string());
    out
}
