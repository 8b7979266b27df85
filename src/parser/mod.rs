//! Parse a ledger snapshot: the roster of a group followed by its expenses.
//!
//! ```text
//! # comment
//! member 1 Alice
//! member ext:carol Carol Smith
//! 1 30.00 1 ext:carol #food @2024-05-01 - dinner
//! ```

mod expense;

use chrono::NaiveDate;
use log::debug;

pub use expense::{amount_to_minor_units, parse_expense, parse_member, ParsedExpense};

use crate::error::InputError;
use crate::types::{Expense, Participant, ParticipantId, Roster};

/// Everything the engine needs to compute the settlement of one group.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub roster: Roster,
    pub expenses: Vec<Expense>,
}

/// Parse a whole snapshot. Amounts are converted to minor units with
/// `minor_digits` fractional digits.
pub fn parse_snapshot(source: &str, minor_digits: u32) -> Result<Snapshot, InputError> {
    let mut snapshot = Snapshot::default();

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("member") {
            snapshot.roster.add(parse_member_line(line, line_number)?)?;
        } else {
            let expense = parse_expense_line(line, line_number, minor_digits)?;
            snapshot.expenses.push(expense);
        }
    }

    debug!(
        "parsed snapshot with {} participants and {} expenses",
        snapshot.roster.len(),
        snapshot.expenses.len()
    );

    Ok(snapshot)
}

fn parse_member_line(line: &str, line_number: usize) -> Result<Participant, InputError> {
    let (rest, (id, name)) =
        parse_member(line).map_err(|e| InputError::invalid_syntax(line_number, e))?;
    expect_end_of_line(rest, line_number)?;

    let id: ParticipantId = id.parse()?;
    Ok(Participant::new(id, name))
}

fn parse_expense_line(
    line: &str,
    line_number: usize,
    minor_digits: u32,
) -> Result<Expense, InputError> {
    let (rest, parsed) =
        parse_expense(line).map_err(|e| InputError::invalid_syntax(line_number, e))?;
    expect_end_of_line(rest, line_number)?;

    let amount = match amount_to_minor_units(parsed.amount, minor_digits) {
        Some(amount) if amount > 0 => amount,
        _ => return Err(InputError::invalid_amount(line_number, parsed.amount.to_string())),
    };

    let mut expense = Expense::new(amount, parsed.paid_by, parsed.split_with);
    expense.category = parsed.category.map(|c| c.to_string());
    expense.description = parsed.description.map(|d| d.trim().to_string());
    if let Some(date) = parsed.date {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| InputError::invalid_date(line_number, date.to_string()))?;
        expense.date = Some(date);
    }

    Ok(expense)
}

fn expect_end_of_line(rest: &str, line_number: usize) -> Result<(), InputError> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(InputError::InvalidSyntax {
            line: line_number,
            reason: format!("unexpected `{}`", rest.trim()),
        })
    }
}
