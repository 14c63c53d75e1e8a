// Claim Trie Index - per-path candidate sets with cached winners
//
// Derived entirely from the claim store and stake totals, never persisted.

use crate::claim::{Claim, ClaimId, ClaimStore, StakeAggregator};
use crate::trie::node::{Candidate, TrieNode};
use crate::trie::path::TriePath;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// A path whose winner changed while applying an update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinnerChange {
    pub path: TriePath,
    pub previous: Option<ClaimId>,
    pub current: Option<ClaimId>,
}

#[derive(Clone, Debug, Default)]
pub struct ClaimTrie {
    nodes: HashMap<TriePath, TrieNode>,
    /// Paths each claim currently competes at
    claim_paths: HashMap<ClaimId, Vec<TriePath>>,
    /// Names with at least one candidate under each channel
    channel_names: HashMap<ClaimId, BTreeSet<String>>,
}

impl ClaimTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths with at least one candidate
    pub fn path_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn winner_at(&self, path: &TriePath) -> Option<&ClaimId> {
        self.nodes.get(path).and_then(TrieNode::winner)
    }

    /// Candidates at `path`, best first
    pub fn candidates(&self, path: &TriePath) -> Vec<Candidate> {
        self.nodes.get(path).map(TrieNode::ranked).unwrap_or_default()
    }

    /// Content names signed by `channel_id`, in name order
    pub fn channel_names(&self, channel_id: &ClaimId) -> Vec<&str> {
        self.channel_names
            .get(channel_id)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Active claims signed by `channel_id` across all of its names
    pub fn channel_claim_count(&self, channel_id: &ClaimId) -> usize {
        self.channel_names(channel_id)
            .into_iter()
            .filter_map(|name| self.nodes.get(&TriePath::in_channel(*channel_id, name)))
            .map(TrieNode::len)
            .sum()
    }

    /// Place a claim at its paths with its current weight, or take it out once abandoned
    pub fn upsert_claim(&mut self, claim: &Claim, aggregator: &StakeAggregator) -> Vec<WinnerChange> {
        if claim.is_abandoned() {
            return self.remove_claim(claim.claim_id());
        }

        let candidate = Candidate {
            claim_id: *claim.claim_id(),
            effective_amount: aggregator.effective_amount(claim),
            registered_seq: claim.registered_seq(),
        };
        let paths = TriePath::paths_for(claim);
        let mut changes = Vec::new();

        // An update may move the claim to another channel
        let stale: Vec<TriePath> = self
            .claim_paths
            .get(claim.claim_id())
            .map(|old| old.iter().filter(|p| !paths.contains(p)).cloned().collect())
            .unwrap_or_default();
        for path in stale {
            changes.extend(self.detach(&path, claim.claim_id()));
        }

        for path in &paths {
            let node = self.nodes.entry(path.clone()).or_default();
            let previous = node.winner().copied();
            node.upsert(candidate);
            let current = node.winner().copied();
            if let TriePath::InChannel(channel_id, name) = path {
                self.channel_names.entry(*channel_id).or_default().insert(name.clone());
            }
            if previous != current {
                changes.push(WinnerChange {
                    path: path.clone(),
                    previous,
                    current,
                });
            }
        }

        self.claim_paths.insert(*claim.claim_id(), paths);
        Self::log_takeovers(&changes);
        changes
    }

    /// Remove a claim from every path it competes at
    pub fn remove_claim(&mut self, claim_id: &ClaimId) -> Vec<WinnerChange> {
        let paths = self.claim_paths.remove(claim_id).unwrap_or_default();
        let mut changes = Vec::new();
        for path in &paths {
            changes.extend(self.detach(path, claim_id));
        }
        Self::log_takeovers(&changes);
        changes
    }

    /// Re-derive the whole index from the store
    pub fn rebuild(&mut self, store: &ClaimStore, aggregator: &StakeAggregator) {
        self.nodes.clear();
        self.claim_paths.clear();
        self.channel_names.clear();

        for claim in store.iter().filter(|c| c.is_active()) {
            let candidate = Candidate {
                claim_id: *claim.claim_id(),
                effective_amount: aggregator.effective_amount(claim),
                registered_seq: claim.registered_seq(),
            };
            let paths = TriePath::paths_for(claim);
            for path in &paths {
                self.nodes.entry(path.clone()).or_default().upsert(candidate);
                if let TriePath::InChannel(channel_id, name) = path {
                    self.channel_names.entry(*channel_id).or_default().insert(name.clone());
                }
            }
            self.claim_paths.insert(*claim.claim_id(), paths);
        }
    }

    fn detach(&mut self, path: &TriePath, claim_id: &ClaimId) -> Option<WinnerChange> {
        let node = self.nodes.get_mut(path)?;
        let previous = node.winner().copied();
        node.remove(claim_id);
        let current = node.winner().copied();

        if node.is_empty() {
            self.nodes.remove(path);
            if let TriePath::InChannel(channel_id, name) = path {
                if let Some(names) = self.channel_names.get_mut(channel_id) {
                    names.remove(name);
                    if names.is_empty() {
                        self.channel_names.remove(channel_id);
                    }
                }
            }
        }

        (previous != current).then(|| WinnerChange {
            path: path.clone(),
            previous,
            current,
        })
    }

    fn log_takeovers(changes: &[WinnerChange]) {
        for change in changes {
            match (&change.previous, &change.current) {
                (Some(previous), Some(current)) => {
                    info!(path = %change.path, %previous, %current, "Takeover")
                }
                (None, Some(current)) => info!(path = %change.path, %current, "Path claimed"),
                (Some(previous), None) => info!(path = %change.path, %previous, "Path vacated"),
                (None, None) => {}
            }
        }
    }
}
