//! Property-based tests for journal validation.

use proptest::prelude::*;
use tally_shared::types::JournalId;

use super::draft::{JournalDraft, TransactionDraft};
use super::error::LedgerError;
use super::types::Direction;
use super::validation::fixtures::MapView;
use super::validation::validate_journal;

const ACCOUNTS: [&str; 6] = ["A0", "A1", "A2", "A3", "A4", "A5"];

fn view() -> MapView {
    ACCOUNTS
        .iter()
        .enumerate()
        .fold(MapView::default(), |view, (i, number)| {
            let base = if i % 2 == 0 { Direction::Debit } else { Direction::Credit };
            view.with_account(number, "IDR", base)
        })
}

/// Strategy for a positive amount.
fn amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000
}

/// Debit amounts on some accounts, balanced by one credit on a different account.
fn balanced_lines() -> impl Strategy<Value = Vec<TransactionDraft>> {
    prop::collection::vec(amount(), 1..ACCOUNTS.len()).prop_map(|debits| {
        let total: i64 = debits.iter().sum();
        let credit_account = ACCOUNTS[debits.len()];
        let mut lines: Vec<TransactionDraft> = debits
            .iter()
            .enumerate()
            .map(|(i, &amt)| TransactionDraft::debit(format!("T{i}"), ACCOUNTS[i], amt))
            .collect();
        lines.push(TransactionDraft::credit("TC", credit_account, total));
        lines
    })
}

fn journal(lines: Vec<TransactionDraft>) -> JournalDraft {
    lines
        .into_iter()
        .fold(JournalDraft::new("J1", "tester"), JournalDraft::posting)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced journals over distinct accounts are accepted and carry their debit total.
    #[test]
    fn prop_balanced_journal_accepted(lines in balanced_lines()) {
        let debit_total: i64 = lines
            .iter()
            .filter(|l| l.direction == Direction::Debit)
            .map(|l| l.amount)
            .sum();
        let validated = validate_journal(Some(&journal(lines)), &view());
        prop_assert!(validated.is_ok(), "expected ok, got {:?}", validated);
        prop_assert_eq!(validated.unwrap().amount, debit_total);
    }

    /// Any nonzero skew between debits and credits is rejected as unbalanced.
    #[test]
    fn prop_skewed_journal_rejected(lines in balanced_lines(), skew in 1i64..1000) {
        let mut lines = lines;
        if let Some(last) = lines.last_mut() {
            last.amount += skew;
        }
        let result = validate_journal(Some(&journal(lines)), &view());
        prop_assert!(
            matches!(result, Err(LedgerError::JournalNotBalanced { .. })),
            "expected unbalanced, got {:?}",
            result
        );
    }

    /// A negative amount anywhere is rejected before balance is compared.
    #[test]
    fn prop_negative_amount_rejected(lines in balanced_lines(), index in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let i = index.index(lines.len());
        lines[i].amount = -lines[i].amount;
        let result = validate_journal(Some(&journal(lines)), &view());
        prop_assert!(matches!(result, Err(LedgerError::NegativeAmount(_))), "got {:?}", result);
    }

    /// Validation never depends on the order of lines for balanced input.
    #[test]
    fn prop_line_order_irrelevant(lines in balanced_lines()) {
        let mut reversed = lines.clone();
        reversed.reverse();
        let forward = validate_journal(Some(&journal(lines)), &view()).map(|v| v.amount);
        let backward = validate_journal(Some(&journal(reversed)), &view()).map(|v| v.amount);
        prop_assert_eq!(forward.ok(), backward.ok());
    }

    /// A taken journal ID wins over every later check.
    #[test]
    fn prop_taken_id_checked_before_lines(lines in balanced_lines(), skew in 0i64..1000) {
        let mut lines = lines;
        lines[0].amount += skew;
        let mut view = view();
        view.journals.insert(JournalId::from("J1"));
        let result = validate_journal(Some(&journal(lines)), &view);
        prop_assert!(matches!(result, Err(LedgerError::JournalAlreadyPersisted(_))), "got {:?}", result);
    }
}
