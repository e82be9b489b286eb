//! Journal validation.
//!
//! A draft passes through nine checks in a fixed order and the first failure
//! is reported:
//!
//! 1. a journal is present with an ID, an author and at least one posting
//! 2. the journal ID is not taken
//! 3. every posting has an ID
//! 4. no posting ID is taken, within the ledger or within the draft
//! 5. amounts are non-negative, their sums fit, and debits equal credits
//! 6. no account is posted twice
//! 7. every account exists
//! 8. every account shares one currency
//! 9. a reversal targets an existing, not yet reversed journal
//!
//! Validation only reads; it never writes.

use std::collections::HashSet;

use tally_shared::types::{AccountNumber, JournalId, TransactionId};

use super::draft::JournalDraft;
use super::error::LedgerError;
use super::types::{Account, Direction};

/// Read access to ledger state that validation needs.
///
/// The journal engine answers these from the store plus any journals it holds
/// staged, so staged IDs and reversal targets count as taken.
pub trait LedgerView {
    /// Returns true if the journal ID is taken.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    fn journal_taken(&self, id: &JournalId) -> Result<bool, LedgerError>;

    /// Returns true if the journal is persisted (a valid reversal target).
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    fn journal_persisted(&self, id: &JournalId) -> Result<bool, LedgerError>;

    /// Returns true if the transaction ID is taken.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    fn transaction_taken(&self, id: &TransactionId) -> Result<bool, LedgerError>;

    /// Loads an account.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    fn account(&self, number: &AccountNumber) -> Result<Option<Account>, LedgerError>;

    /// Returns true if some journal already reverses `target`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    fn is_reversed(&self, target: &JournalId) -> Result<bool, LedgerError>;
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedJournal {
    /// Journal amount (sum of debits).
    pub amount: i64,
    /// The posted accounts, aligned with the draft's postings.
    pub accounts: Vec<Account>,
}

/// Runs every check against `draft`.
///
/// # Errors
///
/// Returns the error of the first failing check.
pub fn validate_journal(
    draft: Option<&JournalDraft>,
    view: &impl LedgerView,
) -> Result<ValidatedJournal, LedgerError> {
    let draft = draft.ok_or(LedgerError::NilJournal)?;
    check_structure(draft)?;

    if view.journal_taken(&draft.id)? {
        return Err(LedgerError::JournalAlreadyPersisted(draft.id.clone()));
    }

    if draft.transactions.iter().any(|line| line.id.is_blank()) {
        return Err(LedgerError::TransactionMissingId);
    }

    check_transaction_ids(draft, view)?;
    let amount = check_balanced(draft)?;
    check_distinct_accounts(draft)?;
    let accounts = validate_accounts(draft, view)?;

    if let Some(target) = &draft.reverses {
        check_reversal_target(target, view)?;
    }

    Ok(ValidatedJournal { amount, accounts })
}

/// Re-runs the account checks (existence and shared currency) and returns the
/// current accounts aligned with the draft's postings.
///
/// # Errors
///
/// Returns `AccountNotPersisted` or `MixedCurrency`.
pub fn validate_accounts(draft: &JournalDraft, view: &impl LedgerView) -> Result<Vec<Account>, LedgerError> {
    let accounts = load_accounts(draft, view)?;
    check_single_currency(&accounts)?;
    Ok(accounts)
}

fn check_structure(draft: &JournalDraft) -> Result<(), LedgerError> {
    if draft.id.is_blank() {
        return Err(LedgerError::MissingJournalId);
    }
    if draft.transactions.is_empty() {
        return Err(LedgerError::NoTransactions);
    }
    if draft.created_by.trim().is_empty() {
        return Err(LedgerError::MissingAuthor);
    }
    Ok(())
}

fn check_transaction_ids(draft: &JournalDraft, view: &impl LedgerView) -> Result<(), LedgerError> {
    let mut seen = HashSet::with_capacity(draft.transactions.len());
    for line in &draft.transactions {
        if view.transaction_taken(&line.id)? {
            return Err(LedgerError::TransactionAlreadyPersisted(line.id.clone()));
        }
        if !seen.insert(&line.id) {
            return Err(LedgerError::DuplicateTransactionInJournal(line.id.clone()));
        }
    }
    Ok(())
}

/// Returns the journal amount when debits equal credits.
fn check_balanced(draft: &JournalDraft) -> Result<i64, LedgerError> {
    let mut debit: i64 = 0;
    let mut credit: i64 = 0;

    for line in &draft.transactions {
        if line.amount < 0 {
            return Err(LedgerError::NegativeAmount(line.id.clone()));
        }
        let total = match line.direction {
            Direction::Debit => &mut debit,
            Direction::Credit => &mut credit,
        };
        *total = total.checked_add(line.amount).ok_or(LedgerError::AmountOverflow)?;
    }

    if debit != credit {
        return Err(LedgerError::JournalNotBalanced { debit, credit });
    }
    Ok(debit)
}

fn check_distinct_accounts(draft: &JournalDraft) -> Result<(), LedgerError> {
    let mut seen = HashSet::with_capacity(draft.transactions.len());
    for line in &draft.transactions {
        if !seen.insert(&line.account_number) {
            return Err(LedgerError::DuplicateAccountInJournal(line.account_number.clone()));
        }
    }
    Ok(())
}

fn load_accounts(draft: &JournalDraft, view: &impl LedgerView) -> Result<Vec<Account>, LedgerError> {
    draft
        .transactions
        .iter()
        .map(|line| {
            view.account(&line.account_number)?
                .ok_or_else(|| LedgerError::AccountNotPersisted(line.account_number.clone()))
        })
        .collect()
}

fn check_single_currency(accounts: &[Account]) -> Result<(), LedgerError> {
    let Some(first) = accounts.first() else {
        return Ok(());
    };
    match accounts.iter().find(|a| a.currency != first.currency) {
        Some(other) => Err(LedgerError::MixedCurrency {
            account: other.number.clone(),
            expected: first.currency.clone(),
            found: other.currency.clone(),
        }),
        None => Ok(()),
    }
}

fn check_reversal_target(target: &JournalId, view: &impl LedgerView) -> Result<(), LedgerError> {
    if !view.journal_persisted(target)? {
        return Err(LedgerError::ReversalTargetNotFound(target.clone()));
    }
    if view.is_reversed(target)? {
        return Err(LedgerError::DoubleReversalRejected(target.clone()));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::MapView;
    use super::*;
    use crate::ledger::draft::TransactionDraft;
    use rstest::rstest;

    fn view() -> MapView {
        MapView::default()
            .with_account("A1", "IDR", Direction::Debit)
            .with_account("A2", "IDR", Direction::Credit)
            .with_account("U1", "USD", Direction::Debit)
    }

    fn balanced(id: &str) -> JournalDraft {
        JournalDraft::new(id, "tester")
            .posting(TransactionDraft::debit(format!("{id}-T1"), "A1", 100))
            .posting(TransactionDraft::credit(format!("{id}-T2"), "A2", 100))
    }

    #[test]
    fn test_valid_journal() {
        let validated = validate_journal(Some(&balanced("J1")), &view()).unwrap();
        assert_eq!(validated.amount, 100);
        assert_eq!(validated.accounts.len(), 2);
        assert_eq!(validated.accounts[1].number.as_str(), "A2");
    }

    #[test]
    fn test_nil_journal() {
        assert!(matches!(validate_journal(None, &view()), Err(LedgerError::NilJournal)));
    }

    #[test]
    fn test_journal_already_persisted() {
        let mut view = view();
        view.journals.insert(JournalId::from("J1"));
        assert!(matches!(
            validate_journal(Some(&balanced("J1")), &view),
            Err(LedgerError::JournalAlreadyPersisted(_))
        ));
    }

    #[test]
    fn test_no_transactions() {
        let draft = JournalDraft::new("J1", "tester");
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::NoTransactions)
        ));
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   ")]
    fn test_missing_journal_id(#[case] id: &str) {
        let mut draft = balanced("J1");
        draft.id = JournalId::from(id);
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::MissingJournalId)
        ));
    }

    #[test]
    fn test_missing_author() {
        let mut draft = balanced("J1");
        draft.created_by = "  ".to_string();
        assert!(matches!(validate_journal(Some(&draft), &view()), Err(LedgerError::MissingAuthor)));
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace(" \t ")]
    fn test_transaction_missing_id(#[case] id: &str) {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit(id, "A2", 100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::TransactionMissingId)
        ));
    }

    #[test]
    fn test_structure_checked_before_id_collision() {
        let mut view = view();
        view.journals.insert(JournalId::from("J1"));
        let draft = JournalDraft::new("J1", "tester");
        assert!(matches!(validate_journal(Some(&draft), &view), Err(LedgerError::NoTransactions)));
    }

    #[test]
    fn test_transaction_already_persisted() {
        let mut view = view();
        view.transactions.insert(TransactionId::from("J1-T2"));
        assert!(matches!(
            validate_journal(Some(&balanced("J1")), &view),
            Err(LedgerError::TransactionAlreadyPersisted(id)) if id.as_str() == "J1-T2"
        ));
    }

    #[test]
    fn test_duplicate_transaction_in_draft() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit("T1", "A2", 100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::DuplicateTransactionInJournal(_))
        ));
    }

    #[test]
    fn test_negative_amount() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", -100))
            .posting(TransactionDraft::credit("T2", "A2", -100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_amount_overflow() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", i64::MAX))
            .posting(TransactionDraft::debit("T2", "A2", 1));
        assert!(matches!(validate_journal(Some(&draft), &view()), Err(LedgerError::AmountOverflow)));
    }

    #[test]
    fn test_not_balanced() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit("T2", "A2", 90));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::JournalNotBalanced { debit: 100, credit: 90 })
        ));
    }

    #[test]
    fn test_zero_amount_journal_is_balanced() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 0))
            .posting(TransactionDraft::credit("T2", "A2", 0));
        assert_eq!(validate_journal(Some(&draft), &view()).unwrap().amount, 0);
    }

    #[test]
    fn test_duplicate_account() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit("T2", "A1", 100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::DuplicateAccountInJournal(_))
        ));
    }

    #[test]
    fn test_account_not_persisted() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit("T2", "NOPE", 100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::AccountNotPersisted(n)) if n.as_str() == "NOPE"
        ));
    }

    #[test]
    fn test_mixed_currency() {
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "A1", 100))
            .posting(TransactionDraft::credit("T2", "U1", 100));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::MixedCurrency { .. })
        ));
    }

    #[test]
    fn test_reversal_target_not_found() {
        let draft = balanced("J2").reversing("J1");
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::ReversalTargetNotFound(_))
        ));
    }

    #[test]
    fn test_double_reversal() {
        let mut view = view();
        view.journals.insert(JournalId::from("J1"));
        view.reversed.insert(JournalId::from("J1"));
        let draft = balanced("J3").reversing("J1");
        assert!(matches!(
            validate_journal(Some(&draft), &view),
            Err(LedgerError::DoubleReversalRejected(_))
        ));
    }

    #[test]
    fn test_reversal_of_unreversed_journal() {
        let mut view = view();
        view.journals.insert(JournalId::from("J1"));
        assert!(validate_journal(Some(&balanced("J2").reversing("J1")), &view).is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        // Unbalanced AND duplicate account AND unknown account: balance check runs first
        let draft = JournalDraft::new("J1", "tester")
            .posting(TransactionDraft::debit("T1", "NOPE", 100))
            .posting(TransactionDraft::credit("T2", "NOPE", 50));
        assert!(matches!(
            validate_journal(Some(&draft), &view()),
            Err(LedgerError::JournalNotBalanced { .. })
        ));
    }
}
