//! Arithmetic on amounts expressed in minor currency units.

use crate::types::Amount;

/// Split `amount` into `parts` shares that sum exactly to `amount`.
///
/// When the division is not exact, the remainder is handed out one minor unit
/// at a time to the first shares, so `split_evenly(1000, 3)` is `[334, 333, 333]`.
/// Negative amounts are split symmetrically. Zero parts yield no shares.
pub fn split_evenly(amount: Amount, parts: usize) -> Vec<Amount> {
    if parts == 0 {
        return vec![];
    }
    let n = parts as Amount;
    let base = amount / n;
    let remainder = (amount % n).unsigned_abs() as usize;
    let step = amount.signum();

    (0..parts)
        .map(|i| if i < remainder { base + step } else { base })
        .collect()
}

/// Multiplier from major to minor units for the given number of fractional digits.
pub fn minor_units_per_major(digits: u32) -> Amount {
    10_i64.pow(digits)
}
