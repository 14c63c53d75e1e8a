use crate::amount::Amount;
use crate::claim::ClaimId;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// A claim competing at a trie path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub claim_id: ClaimId,
    pub effective_amount: Amount,
    pub registered_seq: u64,
}

impl Candidate {
    /// Sort key: highest amount first, then earliest registration
    fn rank_key(&self) -> (Reverse<Amount>, u64, ClaimId) {
        (Reverse(self.effective_amount), self.registered_seq, self.claim_id)
    }

    /// Ranking order; `Less` means `self` beats `other`
    pub fn rank(&self, other: &Candidate) -> Ordering {
        self.rank_key().cmp(&other.rank_key())
    }
}

/// Candidates at one path and the cached winner
#[derive(Clone, Debug, Default)]
pub struct TrieNode {
    candidates: HashMap<ClaimId, Candidate>,
    winner: Option<ClaimId>,
}

impl TrieNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn winner(&self) -> Option<&ClaimId> {
        self.winner.as_ref()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, claim_id: &ClaimId) -> bool {
        self.candidates.contains_key(claim_id)
    }

    /// Insert or refresh a candidate, then re-rank
    pub fn upsert(&mut self, candidate: Candidate) {
        self.candidates.insert(candidate.claim_id, candidate);
        self.refresh_winner();
    }

    /// Drop a candidate, then re-rank. Returns whether it was present.
    pub fn remove(&mut self, claim_id: &ClaimId) -> bool {
        let removed = self.candidates.remove(claim_id).is_some();
        if removed {
            self.refresh_winner();
        }
        removed
    }

    /// Candidates best first
    pub fn ranked(&self) -> Vec<Candidate> {
        let mut ranked: Vec<Candidate> = self.candidates.values().copied().collect();
        ranked.sort_by(Candidate::rank);
        ranked
    }

    fn refresh_winner(&mut self) {
        self.winner = self
            .candidates
            .values()
            .min_by(|a, b| a.rank(b))
            .map(|c| c.claim_id);
    }
}
