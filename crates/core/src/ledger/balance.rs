//! Balance propagation.
//!
//! A posting in the account's base direction adds its amount to the balance;
//! a posting in the opposite direction subtracts it. All arithmetic is
//! checked: `None` means the result does not fit in an `i64`.

use serde::{Deserialize, Serialize};

use super::types::Direction;

/// Applies one posting to `balance`.
#[must_use]
pub fn propagate(balance: i64, base: Direction, direction: Direction, amount: i64) -> Option<i64> {
    if direction == base {
        balance.checked_add(amount)
    } else {
        balance.checked_sub(amount)
    }
}

/// Running balance information for a posting.
///
/// - `posting_count`: monotonically increasing per account
/// - `previous_balance`: balance before the posting
/// - `current_balance`: balance after the posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Number of postings folded so far.
    pub posting_count: u64,
    /// Balance before the last posting.
    pub previous_balance: i64,
    /// Balance after the last posting.
    pub current_balance: i64,
}

impl RunningBalance {
    /// State of a freshly opened account.
    #[must_use]
    pub const fn opening() -> Self {
        Self {
            posting_count: 0,
            previous_balance: 0,
            current_balance: 0,
        }
    }

    /// Folds the next posting in.
    #[must_use]
    pub fn next(&self, base: Direction, direction: Direction, amount: i64) -> Option<Self> {
        Some(Self {
            posting_count: self.posting_count + 1,
            previous_balance: self.current_balance,
            current_balance: propagate(self.current_balance, base, direction, amount)?,
        })
    }
}

/// Result of [`replay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replayed {
    /// Balance after the last posting.
    pub running: RunningBalance,
    /// Index of the first posting whose recorded post-balance disagrees.
    pub first_mismatch: Option<usize>,
}

/// Replays `(direction, amount, recorded post-balance)` postings from the
/// opening balance, in order, checking each recorded post-balance.
#[must_use]
pub fn replay(base: Direction, postings: impl IntoIterator<Item = (Direction, i64, i64)>) -> Option<Replayed> {
    let mut running = RunningBalance::opening();
    let mut first_mismatch = None;
    for (index, (direction, amount, recorded)) in postings.into_iter().enumerate() {
        running = running.next(base, direction, amount)?;
        if first_mismatch.is_none() && recorded != running.current_balance {
            first_mismatch = Some(index);
        }
    }
    Some(Replayed { running, first_mismatch })
}
