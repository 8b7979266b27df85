//! Produce the text shown to users: amounts, balance tables and settlement plans.
//!
//! Amounts are kept in minor units until here and are rendered with integer
//! arithmetic only.

use crate::money::minor_units_per_major;
use std::collections::BTreeMap;

use crate::report::{BalanceLine, Spending};
use crate::types::{Amount, ParticipantId, Roster, Transfer};

/// Render `amount` minor units as a decimal with `digits` fractional digits.
pub fn format_amount(amount: Amount, digits: u32) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let unit = minor_units_per_major(digits).unsigned_abs();
    let magnitude = amount.unsigned_abs();
    let integer_part = magnitude / unit;

    if digits == 0 {
        format!("{sign}{integer_part}")
    } else {
        let fractional_part = magnitude % unit;
        let width = digits as usize;
        format!("{sign}{integer_part}.{fractional_part:0width$}")
    }
}

/// One line per participant: name, paid, owed and net balance, in aligned columns.
/// Participants missing from `spending` paid and owe nothing.
pub fn format_balances(
    lines: &[BalanceLine],
    spending: &BTreeMap<ParticipantId, Spending>,
    digits: u32,
) -> String {
    if lines.is_empty() {
        return "Nothing to show!".to_string();
    }

    let rows: Vec<_> = lines
        .iter()
        .map(|l| {
            let spent = spending.get(&l.id).copied().unwrap_or_default();
            (
                l.display_name.as_str(),
                format_amount(spent.paid, digits),
                format_amount(spent.owed, digits),
                format_signed(l.balance, digits),
            )
        })
        .collect();

    let name_width = column_width(rows.iter().map(|r| r.0), "name");
    let paid_width = column_width(rows.iter().map(|r| r.1.as_str()), "paid");
    let owed_width = column_width(rows.iter().map(|r| r.2.as_str()), "owed");
    let balance_width = column_width(rows.iter().map(|r| r.3.as_str()), "balance");

    let header = format!(
        "{:<name_width$}  {:>paid_width$}  {:>owed_width$}  {:>balance_width$}\n",
        "name", "paid", "owed", "balance"
    );
    rows.iter().fold(header, |a, (name, paid, owed, balance)| {
        a + &format!(
            "{name:<name_width$}  {paid:>paid_width$}  {owed:>owed_width$}  {balance:>balance_width$}\n"
        )
    })
}

/// One line per transfer, debtor names padded so that amounts are aligned.
pub fn format_settlement(transfers: &[Transfer], roster: &Roster, digits: u32) -> String {
    if transfers.is_empty() {
        return "All clean!".to_string();
    }

    let debtors: Vec<_> = transfers
        .iter()
        .map(|t| roster.display_name(&t.from))
        .collect();
    let target_length = debtors
        .iter()
        .map(|d| d.chars().count())
        .max()
        .unwrap_or(0);

    transfers
        .iter()
        .zip(debtors)
        .map(|(t, debtor)| {
            format!(
                "{debtor:<target_length$} pays {} to {}",
                format_amount(t.amount, digits),
                roster.display_name(&t.to)
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n")
}

fn format_signed(amount: Amount, digits: u32) -> String {
    if amount > 0 {
        format!("+{}", format_amount(amount, digits))
    } else {
        format_amount(amount, digits)
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}
