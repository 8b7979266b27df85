//! Net balance of every participant, computed from the list of expenses.
//!
//! For each expense the payer is credited with the whole amount and every
//! member of the split is debited with their share. Shares are computed in
//! minor units with `split_evenly`, so each expense moves exactly its amount
//! and the balances always sum to zero.

use std::collections::HashSet;

use log::{debug, log_enabled, Level::Debug};

use crate::error::{LedgerError, ReferentialError};
use crate::money::split_evenly;
use crate::types::{Amount, Balances, Expense, ParticipantId, Roster};

/// Compute the balance of every roster participant.
///
/// Participants that never appear in an expense are reported with a zero
/// balance. Expenses are processed in input order, although the result does
/// not depend on it. An expense whose amount is zero contributes nothing.
///
/// Fails with `LedgerError::Referential` when an expense names someone outside
/// the roster, and with `LedgerError::Overflow` when a balance would not fit
/// in an `Amount`.
pub fn compute_balances(roster: &Roster, expenses: &[Expense]) -> Result<Balances, LedgerError> {
    let mut balances: Balances = roster.ids().map(|id| (id.clone(), 0)).collect();

    for (index, expense) in expenses.iter().enumerate() {
        validate_references(index, expense, roster)?;
        let overflow = || LedgerError::Overflow { expense: index };

        let balance = balances.entry(expense.paid_by.clone()).or_insert(0);
        *balance = balance.checked_add(expense.amount).ok_or_else(overflow)?;
        for (participant, share) in expense_shares(expense) {
            let balance = balances.entry(participant).or_insert(0);
            *balance = balance.checked_sub(share).ok_or_else(overflow)?;
        }
    }

    if log_enabled!(Debug) {
        let sum: i128 = balances.values().map(|&b| i128::from(b)).sum();
        debug!(
            "computed {} balances from {} expenses, total {sum}",
            balances.len(),
            expenses.len()
        );
    }

    Ok(balances)
}

/// The share owed by each member of the split, in split order.
///
/// Leftover minor units go to the first members, one each.
pub fn expense_shares(expense: &Expense) -> Vec<(ParticipantId, Amount)> {
    let shares = split_evenly(expense.amount, expense.split_with.len());
    expense.split_with.iter().cloned().zip(shares).collect()
}

fn validate_references(
    index: usize,
    expense: &Expense,
    roster: &Roster,
) -> Result<(), ReferentialError> {
    if expense.split_with.is_empty() {
        return Err(ReferentialError::EmptySplit { expense: index });
    }

    if !roster.contains(&expense.paid_by) {
        return Err(ReferentialError::UnknownParticipant {
            expense: index,
            participant: expense.paid_by.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(expense.split_with.len());
    for participant in &expense.split_with {
        if !roster.contains(participant) {
            return Err(ReferentialError::UnknownParticipant {
                expense: index,
                participant: participant.clone(),
            });
        }
        if !seen.insert(participant) {
            return Err(ReferentialError::DuplicateSplitMember {
                expense: index,
                participant: participant.clone(),
            });
        }
    }

    Ok(())
}
