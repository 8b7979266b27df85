//! The core of the engine. It contains the algorithm that computes
//! the transfers needed to settle all balances.

use log::{debug, warn};

use crate::error::UnbalancedLedgerError;
use crate::types::{Amount, Balances, ParticipantId, Transfer};

/// Greedy settlement of a balance map.
///
/// The algorithm works as follows:
/// - split participants into creditors (positive balance) and debtors
///   (negative balance); everybody at zero is settled
/// - pick the largest creditor and the largest debtor
/// - let the debtor pay the smaller of debt (*d*) and credit (*c*):
///     * if *d* < *c*: the debtor is done, pick a new debtor
///     * if *d* > *c*: the creditor is done, pick a new creditor
///     * if equal: pick a new debtor and a new creditor
/// - stop when there are no more debtors/creditors
///
/// The solution is correct but not necessarily optimal, in the sense that it may
/// require more transfers than needed. However, the optimal solution is
/// NP-complete and this approximation is normally good enough: it never needs
/// more than `creditors + debtors - 1` transfers.
///
/// Ties between equal balances are broken by participant id, lowest first, so
/// the same balances always give the same plan.
///
/// The tolerance is how far from zero the sum of the balances may be. Whatever
/// is left on one side once the other runs out is at most that far off, and is
/// dropped instead of being paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettlementPlanner {
    tolerance: Amount,
}

impl SettlementPlanner {
    pub fn new() -> SettlementPlanner {
        SettlementPlanner::default()
    }

    /// Accept balances whose sum is within `tolerance` minor units of zero.
    pub fn with_tolerance(tolerance: Amount) -> SettlementPlanner {
        SettlementPlanner {
            tolerance: tolerance.max(0),
        }
    }

    pub fn tolerance(&self) -> Amount {
        self.tolerance
    }

    /// Compute the transfers that settle `balances`. The input is left untouched.
    pub fn plan(&self, balances: &Balances) -> Result<Vec<Transfer>, UnbalancedLedgerError> {
        let tolerance = self.tolerance.unsigned_abs();
        let sum: i128 = balances.values().map(|&b| i128::from(b)).sum();
        if sum.unsigned_abs() > u128::from(tolerance) {
            warn!("Total sum of balances should be 0. In reality it is {sum}");
            return Err(UnbalancedLedgerError::NonZeroSum { sum });
        }

        // Both lists hold magnitudes. They are sorted so that the participant
        // to process first is at the end, because we work from the back.
        let mut creditors: Vec<_> = balances
            .iter()
            .filter(|&(_, &b)| b > 0)
            .map(|(p, &b)| (p, b.unsigned_abs()))
            .collect();
        let mut debtors: Vec<_> = balances
            .iter()
            .filter(|&(_, &b)| b < 0)
            .map(|(p, &b)| (p, b.unsigned_abs()))
            .collect();
        creditors.sort_by(processing_order);
        debtors.sort_by(processing_order);

        let mut transfers = Vec::with_capacity(creditors.len() + debtors.len());

        while let (Some(creditor), Some(debtor)) = (creditors.last_mut(), debtors.last_mut()) {
            let amount = creditor.1.min(debtor.1);
            debug!("{} pays {amount} to {}", debtor.0, creditor.0);
            // Bounded by a creditor's balance, so it fits in an Amount.
            transfers.push(Transfer::new(debtor.0, creditor.0, amount as Amount));

            creditor.1 -= amount;
            debtor.1 -= amount;
            let creditor_settled = creditor.1 == 0;
            let debtor_settled = debtor.1 == 0;

            if creditor_settled {
                creditors.pop();
            }
            if debtor_settled {
                debtors.pop();
            }
        }

        let leftover: u128 = creditors
            .iter()
            .chain(&debtors)
            .map(|&(_, b)| u128::from(b))
            .sum();
        if leftover > u128::from(tolerance) {
            if let Some(&(participant, remaining)) = creditors.last() {
                warn!("We ran out of debtors but we still have creditors: {creditors:?}");
                return Err(UnbalancedLedgerError::Exhausted {
                    participant: participant.clone(),
                    remaining: remaining as Amount,
                });
            }
            if let Some(&(participant, remaining)) = debtors.last() {
                warn!("We ran out of creditors but we still have debtors: {debtors:?}");
                return Err(UnbalancedLedgerError::Exhausted {
                    participant: participant.clone(),
                    remaining: (-i128::from(remaining)) as Amount,
                });
            }
        } else if leftover > 0 {
            debug!("Dropping {leftover} left over within tolerance");
        }

        Ok(transfers)
    }
}

/// Plan the settlement of `balances` with no tolerance.
pub fn plan_settlement(balances: &Balances) -> Result<Vec<Transfer>, UnbalancedLedgerError> {
    SettlementPlanner::default().plan(balances)
}

/// Return a copy of `balances` after executing every transfer.
pub fn apply_transfers(balances: &Balances, transfers: &[Transfer]) -> Balances {
    let mut result = balances.clone();
    for transfer in transfers {
        *result.entry(transfer.from.clone()).or_insert(0) += transfer.amount;
        *result.entry(transfer.to.clone()).or_insert(0) -= transfer.amount;
    }
    result
}

/// Smallest amount first; on equal amounts the higher id first, so that
/// popping from the back yields the largest amount with the lowest id.
fn processing_order(x: &(&ParticipantId, u64), y: &(&ParticipantId, u64)) -> std::cmp::Ordering {
    x.1.cmp(&y.1).then_with(|| y.0.cmp(x.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::Account(n)
    }

    fn ext(name: &str) -> ParticipantId {
        ParticipantId::external(name)
    }

    fn make_balances() -> Balances {
        Balances::from([
            (id(1), -3140),
            (id(2), -1300),
            (ext("p1"), -550),
            (id(4), 2200),
            (id(5), 1790),
            (ext("p4"), 1000),
        ])
    }

    #[test]
    fn test_plan_settlement() -> anyhow::Result<()> {
        let transfers = plan_settlement(&make_balances())?;

        assert_eq!(
            transfers,
            vec![
                Transfer::new(&id(1), &id(4), 2200),
                Transfer::new(&id(1), &id(5), 940),
                Transfer::new(&id(2), &id(5), 850),
                Transfer::new(&id(2), &ext("p4"), 450),
                Transfer::new(&ext("p1"), &ext("p4"), 550),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_three_participants_scenario() -> anyhow::Result<()> {
        let balances = Balances::from([(id(1), 2000), (id(2), -500), (id(3), -1500)]);
        let transfers = plan_settlement(&balances)?;

        assert_eq!(
            transfers,
            vec![
                Transfer::new(&id(3), &id(1), 1500),
                Transfer::new(&id(2), &id(1), 500),
            ]
        );
        let total: Amount = transfers.iter().map(|t| t.amount).sum();
        assert_eq!(total, 2000);
        Ok(())
    }

    #[test]
    fn test_ties_are_broken_by_id() -> anyhow::Result<()> {
        let balances = Balances::from([(id(2), 500), (id(1), 500), (id(3), -1000)]);
        assert_eq!(
            plan_settlement(&balances)?,
            vec![
                Transfer::new(&id(3), &id(1), 500),
                Transfer::new(&id(3), &id(2), 500),
            ]
        );

        let balances = Balances::from([(id(1), 1000), (ext("b"), -500), (id(2), -500)]);
        assert_eq!(
            plan_settlement(&balances)?,
            vec![
                Transfer::new(&id(2), &id(1), 500),
                Transfer::new(&ext("b"), &id(1), 500),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_settled_participants_are_skipped() -> anyhow::Result<()> {
        let balances = Balances::from([(id(1), 0), (id(2), 0)]);
        assert!(plan_settlement(&balances)?.is_empty());
        assert!(plan_settlement(&Balances::new())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unbalanced_ledger() {
        let balances = Balances::from([(id(1), 100), (id(2), -50)]);
        assert_eq!(
            plan_settlement(&balances),
            Err(UnbalancedLedgerError::NonZeroSum { sum: 50 })
        );
    }

    #[test]
    fn test_tolerance() -> anyhow::Result<()> {
        let planner = SettlementPlanner::with_tolerance(1);

        let balances = Balances::from([(id(1), 101), (id(2), -100)]);
        assert_eq!(
            planner.plan(&balances)?,
            vec![Transfer::new(&id(2), &id(1), 100)]
        );

        let balances = Balances::from([(id(1), 100), (id(2), -101), (id(3), 0)]);
        assert_eq!(
            planner.plan(&balances)?,
            vec![Transfer::new(&id(2), &id(1), 100)]
        );

        let balances = Balances::from([(id(1), 102), (id(2), -100)]);
        assert_eq!(
            planner.plan(&balances),
            Err(UnbalancedLedgerError::NonZeroSum { sum: 2 })
        );

        assert_eq!(SettlementPlanner::with_tolerance(-5).tolerance(), 0);
        Ok(())
    }

    #[test]
    fn test_tolerance_keeps_small_balances() -> anyhow::Result<()> {
        let balances = Balances::from([(id(1), 2), (id(2), -1), (id(3), -1)]);
        let expected = vec![
            Transfer::new(&id(2), &id(1), 1),
            Transfer::new(&id(3), &id(1), 1),
        ];

        assert_eq!(SettlementPlanner::with_tolerance(1).plan(&balances)?, expected);
        assert_eq!(SettlementPlanner::with_tolerance(5).plan(&balances)?, expected);
        assert_eq!(plan_settlement(&balances)?, expected);
        Ok(())
    }

    #[test]
    fn test_extreme_balances() -> anyhow::Result<()> {
        let balances = Balances::from([
            (id(1), Amount::MAX),
            (id(2), Amount::MAX),
            (id(3), Amount::MIN),
            (id(4), Amount::MIN + 2),
        ]);
        let transfers = plan_settlement(&balances)?;

        assert_eq!(transfers.len(), 3);
        assert_eq!(transfers[0], Transfer::new(&id(3), &id(1), Amount::MAX));
        assert_eq!(transfers[1], Transfer::new(&id(3), &id(2), 1));
        assert_eq!(transfers[2], Transfer::new(&id(4), &id(2), Amount::MAX - 1));

        let balances = Balances::from([(id(1), Amount::MAX), (id(2), Amount::MAX)]);
        assert_eq!(
            plan_settlement(&balances),
            Err(UnbalancedLedgerError::NonZeroSum {
                sum: 2 * i128::from(Amount::MAX),
            })
        );
        Ok(())
    }

    #[test]
    fn test_apply_transfers() -> anyhow::Result<()> {
        let balances = make_balances();
        let transfers = plan_settlement(&balances)?;
        let settled = apply_transfers(&balances, &transfers);

        assert_eq!(settled.len(), balances.len());
        assert!(settled.values().all(|&b| b == 0));
        Ok(())
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn arb_balances() -> impl Strategy<Value = Balances> {
            prop::collection::vec(-100_000i64..=100_000, 0..12).prop_map(|amounts| {
                let sum: Amount = amounts.iter().sum();
                let mut balances: Balances = amounts
                    .into_iter()
                    .enumerate()
                    .map(|(i, a)| (ParticipantId::Account(i as u64), a))
                    .collect();
                balances.insert(ParticipantId::external("last"), -sum);
                balances
            })
        }

        proptest! {
            #[test]
            fn plan_settles_everything(balances in arb_balances()) {
                let before = balances.clone();
                let transfers = plan_settlement(&balances).expect("balanced input");

                prop_assert_eq!(&balances, &before);
                prop_assert!(transfers.iter().all(|t| t.amount >= 1 && t.from != t.to));

                let settled = apply_transfers(&balances, &transfers);
                prop_assert!(settled.values().all(|&b| b == 0));
            }

            #[test]
            fn plan_respects_the_transfer_bound(balances in arb_balances()) {
                let creditors = balances.values().filter(|&&b| b > 0).count();
                let debtors = balances.values().filter(|&&b| b < 0).count();
                let transfers = plan_settlement(&balances).expect("balanced input");

                if creditors + debtors == 0 {
                    prop_assert!(transfers.is_empty());
                } else {
                    prop_assert!(transfers.len() < creditors + debtors);
                }

                let moved: Amount = transfers.iter().map(|t| t.amount).sum();
                let owed: Amount = balances.values().filter(|&&b| b > 0).sum();
                prop_assert_eq!(moved, owed);
            }

            #[test]
            fn plan_depends_only_on_amounts_and_id_order(
                amounts in prop::collection::vec(prop::sample::select(vec![-300i64, -100, 100, 200]), 1..10),
                labels in Just((0..12u64).collect::<Vec<_>>()).prop_shuffle(),
            ) {
                let sum: Amount = amounts.iter().sum();
                let mut amounts = amounts;
                amounts.push(-sum);

                // Same amounts under two different labelings that keep the id order.
                let mut relabeled_ids: Vec<_> = labels[..amounts.len()].to_vec();
                relabeled_ids.sort();
                let balances: Balances = amounts
                    .iter()
                    .enumerate()
                    .map(|(i, &a)| (ParticipantId::Account(i as u64), a))
                    .collect();
                let relabeled: Balances = amounts
                    .iter()
                    .zip(&relabeled_ids)
                    .map(|(&a, &i)| (ParticipantId::Account(i * 10), a))
                    .collect();

                let transfers = plan_settlement(&balances).expect("balanced input");
                let other = plan_settlement(&relabeled).expect("balanced input");
                let position = |p: &ParticipantId, all: &Balances| all.keys().position(|k| k == p);
                prop_assert_eq!(transfers.len(), other.len());
                for (t, o) in transfers.iter().zip(&other) {
                    prop_assert_eq!(t.amount, o.amount);
                    prop_assert_eq!(position(&t.from, &balances), position(&o.from, &relabeled));
                    prop_assert_eq!(position(&t.to, &balances), position(&o.to, &relabeled));
                }

                let reversed: Balances = balances.iter().rev().map(|(p, &a)| (p.clone(), a)).collect();
                prop_assert_eq!(plan_settlement(&reversed), Ok(transfers));
            }

            #[test]
            fn tolerance_absorbs_a_unit_of_noise(balances in arb_balances(), noise in prop::sample::select(vec![-1i64, 1])) {
                let mut noisy = balances.clone();
                *noisy.entry(ParticipantId::external("last")).or_insert(0) += noise;

                let planner = SettlementPlanner::with_tolerance(1);
                let transfers = planner.plan(&noisy).expect("within tolerance");
                let settled = apply_transfers(&noisy, &transfers);
                prop_assert!(settled.values().all(|&b| b.abs() <= 1));
                prop_assert!(transfers.iter().all(|t| t.amount >= 1));
                prop_assert!(planner.plan(&balances).is_ok());
            }
        }
    }
}
