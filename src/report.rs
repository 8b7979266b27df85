//! Per-participant and per-category summaries of a group's expenses.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::balance::expense_shares;
use crate::error::LedgerError;
use crate::types::{Amount, Balances, Expense, ParticipantId, Roster};

pub const UNCATEGORIZED: &str = "uncategorized";

/// One row of the balance summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceLine {
    pub id: ParticipantId,
    pub display_name: String,
    pub balance: Amount,
}

/// What a participant paid and the total of the shares they owe.
/// Their balance is `paid - owed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Spending {
    pub paid: Amount,
    pub owed: Amount,
}

/// One line per roster participant, ordered by participant id. Participants
/// missing from `balances` have a zero balance.
pub fn balance_summary(roster: &Roster, balances: &Balances) -> Vec<BalanceLine> {
    roster
        .iter()
        .map(|p| BalanceLine {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            balance: balances.get(&p.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Totals paid and owed by everyone appearing in `expenses`.
///
/// Expenses are expected to be valid, e.g. already accepted by
/// [`compute_balances`](crate::compute_balances).
pub fn spending_totals(expenses: &[Expense]) -> Result<BTreeMap<ParticipantId, Spending>, LedgerError> {
    let mut totals: BTreeMap<ParticipantId, Spending> = BTreeMap::new();
    for (index, expense) in expenses.iter().enumerate() {
        let overflow = || LedgerError::Overflow { expense: index };

        let payer = totals.entry(expense.paid_by.clone()).or_default();
        payer.paid = payer.paid.checked_add(expense.amount).ok_or_else(overflow)?;
        for (participant, share) in expense_shares(expense) {
            let member = totals.entry(participant).or_default();
            member.owed = member.owed.checked_add(share).ok_or_else(overflow)?;
        }
    }
    Ok(totals)
}

/// Total amount spent per category.
pub fn category_totals(expenses: &[Expense]) -> Result<BTreeMap<String, Amount>, LedgerError> {
    let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
    for (index, expense) in expenses.iter().enumerate() {
        let category = expense.category.as_deref().unwrap_or(UNCATEGORIZED);
        let total = totals.entry(category.to_string()).or_insert(0);
        *total = total
            .checked_add(expense.amount)
            .ok_or(LedgerError::Overflow { expense: index })?;
    }
    Ok(totals)
}

/// Expenses ordered by date, newest first. Undated expenses come last and
/// expenses on the same date keep their input order.
pub fn expenses_newest_first(expenses: &[Expense]) -> Vec<&Expense> {
    let mut sorted: Vec<_> = expenses.iter().collect();
    sorted.sort_by(|x, y| match (x.date, y.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}

/// Hash of an expense list, usable together with the group id as a cache key
/// for computed balances. Equal lists always give the same fingerprint within
/// one build of the program.
pub fn ledger_fingerprint(expenses: &[Expense]) -> u64 {
    let mut hasher = DefaultHasher::new();
    expenses.hash(&mut hasher);
    hasher.finish()
}
