//! Balances and settlement plans for groups sharing expenses.
//!
//! The engine is made of two pure functions: [`compute_balances`] folds a
//! group's expenses into the net balance of each participant, and
//! [`plan_settlement`] turns those balances into the transfers that bring
//! everybody back to zero. All amounts are integers in minor currency units.

pub mod balance;
pub mod config;
pub mod error;
pub mod formatter;
pub mod money;
pub mod parser;
pub mod report;
pub mod settlement;
pub mod types;

pub use balance::{compute_balances, expense_shares};
pub use config::LedgerConfig;
pub use error::{ConfigError, InputError, LedgerError, ReferentialError, UnbalancedLedgerError};
pub use settlement::{apply_transfers, plan_settlement, SettlementPlanner};
pub use types::{Amount, Balances, Expense, Participant, ParticipantId, Roster, Transfer};

/// Compute balances and the settlement plan in one go.
pub fn settle(
    roster: &Roster,
    expenses: &[Expense],
    planner: &SettlementPlanner,
) -> Result<(Balances, Vec<Transfer>), LedgerError> {
    let balances = compute_balances(roster, expenses)?;
    let transfers = planner.plan(&balances)?;
    Ok((balances, transfers))
}
