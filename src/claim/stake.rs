// Stake Aggregator - effective ranking amount per claim
//
// Caches the sum of each claim's stakes. The deposit is read from the claim
// itself, so an update only changes what the claim reports.

use crate::amount::Amount;
use crate::claim::model::{Claim, ClaimId, Stake};
use crate::claim::store::{ClaimError, ClaimStore};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct StakeAggregator {
    totals: HashMap<ClaimId, Amount>,
}

impl StakeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every stake recorded against a claim
    pub fn stake_total(&self, claim_id: &ClaimId) -> Amount {
        self.totals.get(claim_id).copied().unwrap_or(Amount::ZERO)
    }

    /// Check that a stake can be added without overflowing the claim's total
    pub fn can_add(&self, claim: &Claim, amount: Amount) -> Result<(), ClaimError> {
        self.stake_total(claim.claim_id())
            .checked_add(amount)
            .and_then(|total| total.checked_add(claim.deposit()))
            .map(|_| ())
            .ok_or(ClaimError::StakeOverflow)
    }

    /// Fold a new stake into its target's total
    pub fn add_stake(&mut self, stake: &Stake) {
        let total = self.totals.entry(*stake.target()).or_default();
        *total = total.saturating_add(stake.amount());
    }

    /// Deposit plus stakes, ignoring whether the claim is still active
    pub fn raw_amount(&self, claim: &Claim) -> Amount {
        claim.deposit().saturating_add(self.stake_total(claim.claim_id()))
    }

    /// Ranking weight: deposit plus stakes, zero once abandoned
    pub fn effective_amount(&self, claim: &Claim) -> Amount {
        if claim.is_abandoned() {
            return Amount::ZERO;
        }
        self.raw_amount(claim)
    }

    /// Recompute every total from the store
    pub fn rebuild(&mut self, store: &ClaimStore) {
        self.totals.clear();
        for claim in store.iter() {
            let total: Amount = store.stakes(claim.claim_id()).iter().map(Stake::amount).sum();
            if !total.is_zero() {
                self.totals.insert(*claim.claim_id(), total);
            }
        }
    }
}
