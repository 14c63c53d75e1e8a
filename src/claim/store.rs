// Claim Store - claim identity to claim record, revision history and stakes
//
// Mutations are split into a read-only decision step and a commit step so the
// registry can validate an event completely before touching any state.

use crate::amount::Amount;
use crate::claim::model::{Claim, ClaimId, ClaimKind, Revision, Stake};
use crate::event::{AbandonTarget, Outpoint, PublishPayload, TxId};
use crate::vault::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from claim store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Account {account} does not own claim {claim_id}")]
    NotClaimOwner { claim_id: ClaimId, account: AccountId },

    #[error("Claim {claim_id} is named {existing}, not {requested}")]
    NameMismatch {
        claim_id: ClaimId,
        existing: String,
        requested: String,
    },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Stake total would overflow")]
    StakeOverflow,
}

/// How a publish will be applied, decided before anything is mutated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishDecision {
    /// No active claim matches the identity key: a new claim
    Create { claim_id: ClaimId },
    /// An active claim matches: update it in place
    Update {
        claim_id: ClaimId,
        previous_deposit: Amount,
        previous_channel: Option<ClaimId>,
    },
}

impl PublishDecision {
    pub fn claim_id(&self) -> &ClaimId {
        match self {
            PublishDecision::Create { claim_id } | PublishDecision::Update { claim_id, .. } => claim_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishOutcome {
    Created(ClaimId),
    Updated(ClaimId),
}

impl PublishOutcome {
    pub fn claim_id(&self) -> &ClaimId {
        match self {
            PublishOutcome::Created(id) | PublishOutcome::Updated(id) => id,
        }
    }
}

/// How an abandon will be applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbandonDecision {
    Abandon {
        claim_id: ClaimId,
        owner: AccountId,
        deposit: Amount,
    },
    /// Replayed abandon of a claim that is already gone
    AlreadyAbandoned { claim_id: ClaimId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonOutcome {
    Abandoned(ClaimId),
    AlreadyAbandoned(ClaimId),
}

impl AbandonOutcome {
    pub fn claim_id(&self) -> &ClaimId {
        match self {
            AbandonOutcome::Abandoned(id) | AbandonOutcome::AlreadyAbandoned(id) => id,
        }
    }
}

/// Where a transaction left its mark, for confirmation updates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TxLocus {
    Revision { claim_id: ClaimId, index: usize },
    Stake { claim_id: ClaimId, index: usize },
}

/// Check a claim name against the naming rules
pub fn validate_name(name: &str, max_len: usize) -> Result<(), ClaimError> {
    if name.is_empty() {
        return Err(ClaimError::InvalidName("name cannot be empty".to_string()));
    }
    if name.len() > max_len {
        return Err(ClaimError::InvalidName(format!(
            "{} is longer than {} bytes",
            name, max_len
        )));
    }
    if name == "@" {
        return Err(ClaimError::InvalidName("channel name cannot be empty".to_string()));
    }
    if name.chars().skip(1).any(|c| c == '@') {
        return Err(ClaimError::InvalidName(format!("{} contains '@' after the first character", name)));
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '/' | '#' | ':' | '$') || c.is_whitespace() || c.is_control()) {
        return Err(ClaimError::InvalidName(format!("{} contains {:?}", name, bad)));
    }
    Ok(())
}

/// Durable record of every claim and stake ever observed
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClaimStore {
    claims: HashMap<ClaimId, Claim>,
    /// Stakes per target claim, in arrival order
    stakes: HashMap<ClaimId, Vec<Stake>>,
    /// Index: current outpoint -> claim
    #[serde(skip)]
    by_outpoint: HashMap<Outpoint, ClaimId>,
    /// Index: name -> claims in registration order
    #[serde(skip)]
    by_name: HashMap<String, Vec<ClaimId>>,
    /// Index: txid -> revisions and stakes it produced
    #[serde(skip)]
    by_txid: HashMap<TxId, Vec<TxLocus>>,
}

impl ClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Point lookup, abandoned claims included
    pub fn get(&self, claim_id: &ClaimId) -> Option<&Claim> {
        self.claims.get(claim_id)
    }

    /// Lookup restricted to claims that have not been abandoned
    pub fn get_active(&self, claim_id: &ClaimId) -> Option<&Claim> {
        self.claims.get(claim_id).filter(|c| c.is_active())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    /// All claims ever registered under `name`, oldest first
    pub fn claims_named(&self, name: &str) -> Vec<&Claim> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.claims.get(id)).collect())
            .unwrap_or_default()
    }

    /// Active claims owned by `account`, oldest first
    pub fn claims_owned_by(&self, account: &AccountId) -> Vec<&Claim> {
        let mut owned: Vec<&Claim> = self
            .claims
            .values()
            .filter(|c| c.is_active() && c.owner() == account)
            .collect();
        owned.sort_by_key(|c| c.registered_seq());
        owned
    }

    /// The account's own active channel called `name`
    pub fn active_channel_named(&self, owner: &AccountId, name: &str) -> Option<&Claim> {
        self.claims_named(name)
            .into_iter()
            .find(|c| c.is_channel() && c.is_active() && c.owner() == owner)
    }

    /// Stakes attached to a claim, in arrival order
    pub fn stakes(&self, claim_id: &ClaimId) -> &[Stake] {
        self.stakes.get(claim_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stake_count(&self) -> usize {
        self.stakes.values().map(Vec::len).sum()
    }

    // ========================================================================
    // PUBLISH
    // ========================================================================

    /// Decide whether a publish creates a claim or updates an existing one
    pub fn decide_publish(
        &self,
        account: &AccountId,
        outpoint: &Outpoint,
        payload: &PublishPayload,
        max_name_length: usize,
    ) -> Result<PublishDecision, ClaimError> {
        validate_name(&payload.name, max_name_length)?;

        let kind = ClaimKind::for_name(&payload.name);
        if kind == ClaimKind::Channel && payload.channel_id.is_some() {
            return Err(ClaimError::InvalidClaim(format!(
                "channel {} cannot be signed by another channel",
                payload.name
            )));
        }

        if let Some(claim_id) = payload.claim_id {
            let existing = self
                .get_active(&claim_id)
                .ok_or_else(|| ClaimError::ClaimNotFound(claim_id.to_string()))?;
            if existing.owner() != account {
                return Err(ClaimError::NotClaimOwner {
                    claim_id,
                    account: account.clone(),
                });
            }
            if existing.name() != payload.name {
                return Err(ClaimError::NameMismatch {
                    claim_id,
                    existing: existing.name().to_string(),
                    requested: payload.name.clone(),
                });
            }
            return Ok(PublishDecision::Update {
                claim_id,
                previous_deposit: existing.deposit(),
                previous_channel: existing.channel_id().copied(),
            });
        }

        let existing = self.claims_named(&payload.name).into_iter().find(|c| {
            c.is_active() && c.owner() == account && c.channel_id() == payload.channel_id.as_ref()
        });

        Ok(match existing {
            Some(claim) => PublishDecision::Update {
                claim_id: *claim.claim_id(),
                previous_deposit: claim.deposit(),
                previous_channel: claim.channel_id().copied(),
            },
            None => PublishDecision::Create {
                claim_id: ClaimId::from_outpoint(outpoint),
            },
        })
    }

    /// Apply a decided publish
    #[allow(clippy::too_many_arguments)]
    pub fn commit_publish(
        &mut self,
        decision: &PublishDecision,
        account: &AccountId,
        outpoint: Outpoint,
        height: u64,
        deposit: Amount,
        payload: &PublishPayload,
        registered_seq: u64,
    ) -> PublishOutcome {
        let revision = Revision {
            outpoint,
            height,
            deposit,
            content_ref: payload.content_ref.clone(),
            channel_id: payload.channel_id,
        };

        match decision {
            PublishDecision::Create { claim_id } => {
                let claim = Claim::create(*claim_id, payload.name.clone(), account.clone(), revision, registered_seq);
                self.by_name.entry(payload.name.clone()).or_default().push(*claim_id);
                self.by_outpoint.insert(outpoint, *claim_id);
                self.by_txid.entry(outpoint.txid).or_default().push(TxLocus::Revision {
                    claim_id: *claim_id,
                    index: 0,
                });
                self.claims.insert(*claim_id, claim);
                PublishOutcome::Created(*claim_id)
            }
            PublishDecision::Update { claim_id, .. } => {
                if let Some(claim) = self.claims.get_mut(claim_id) {
                    self.by_outpoint.remove(claim.outpoint());
                    claim.revise(revision);
                    let index = claim.history().len() - 1;
                    self.by_outpoint.insert(outpoint, *claim_id);
                    self.by_txid.entry(outpoint.txid).or_default().push(TxLocus::Revision {
                        claim_id: *claim_id,
                        index,
                    });
                }
                PublishOutcome::Updated(*claim_id)
            }
        }
    }

    // ========================================================================
    // ABANDON
    // ========================================================================

    /// Find the claim an abandon refers to
    pub fn decide_abandon(&self, account: &AccountId, target: &AbandonTarget) -> Result<AbandonDecision, ClaimError> {
        let claim = match target {
            AbandonTarget::Claim(claim_id) => self.claims.get(claim_id),
            AbandonTarget::Outpoint(outpoint) => self
                .by_outpoint
                .get(outpoint)
                .and_then(|id| self.claims.get(id)),
        }
        .ok_or_else(|| ClaimError::ClaimNotFound(target.to_string()))?;

        if claim.is_abandoned() {
            return Ok(AbandonDecision::AlreadyAbandoned {
                claim_id: *claim.claim_id(),
            });
        }
        if claim.owner() != account {
            return Err(ClaimError::NotClaimOwner {
                claim_id: *claim.claim_id(),
                account: account.clone(),
            });
        }

        Ok(AbandonDecision::Abandon {
            claim_id: *claim.claim_id(),
            owner: claim.owner().clone(),
            deposit: claim.deposit(),
        })
    }

    /// Mark a claim abandoned. The record stays for history.
    pub fn commit_abandon(&mut self, claim_id: &ClaimId) -> AbandonOutcome {
        match self.claims.get_mut(claim_id) {
            Some(claim) if claim.is_active() => {
                claim.mark_abandoned();
                AbandonOutcome::Abandoned(*claim_id)
            }
            _ => AbandonOutcome::AlreadyAbandoned(*claim_id),
        }
    }

    // ========================================================================
    // STAKES
    // ========================================================================

    /// The active claim a support or tip would attach to
    pub fn stake_target(&self, claim_id: &ClaimId) -> Result<&Claim, ClaimError> {
        self.get_active(claim_id)
            .ok_or_else(|| ClaimError::ClaimNotFound(claim_id.to_string()))
    }

    /// Append a stake under its target; returns its position in the arrival order
    pub fn push_stake(&mut self, stake: Stake) -> usize {
        let claim_id = *stake.target();
        let txid = stake.outpoint().txid;
        let list = self.stakes.entry(claim_id).or_default();
        list.push(stake);
        let index = list.len() - 1;
        self.by_txid
            .entry(txid)
            .or_default()
            .push(TxLocus::Stake { claim_id, index });
        index
    }

    // ========================================================================
    // CONFIRMATIONS
    // ========================================================================

    /// Record that `txid` was included at `height`. Returns how many records changed.
    pub fn confirm(&mut self, txid: &TxId, height: u64) -> usize {
        let loci = match self.by_txid.get(txid) {
            Some(loci) => loci.clone(),
            None => return 0,
        };

        for locus in &loci {
            match *locus {
                TxLocus::Revision { claim_id, index } => {
                    if let Some(claim) = self.claims.get_mut(&claim_id) {
                        claim.confirm_revision(index, height);
                    }
                }
                TxLocus::Stake { claim_id, index } => {
                    if let Some(stake) = self.stakes.get_mut(&claim_id).and_then(|s| s.get_mut(index)) {
                        stake.set_height(height);
                    }
                }
            }
        }
        loci.len()
    }

    // ========================================================================
    // INDEXES
    // ========================================================================

    /// Rebuild lookup indexes (after deserialization)
    pub fn rebuild_indexes(&mut self) {
        self.by_outpoint.clear();
        self.by_name.clear();
        self.by_txid.clear();

        let mut ordered: Vec<&Claim> = self.claims.values().collect();
        ordered.sort_by_key(|c| c.registered_seq());

        for claim in ordered {
            let claim_id = *claim.claim_id();
            self.by_name.entry(claim.name().to_string()).or_default().push(claim_id);
            self.by_outpoint.insert(*claim.outpoint(), claim_id);
            for (index, revision) in claim.history().iter().enumerate() {
                self.by_txid
                    .entry(revision.outpoint.txid)
                    .or_default()
                    .push(TxLocus::Revision { claim_id, index });
            }
        }

        for (claim_id, stakes) in &self.stakes {
            for (index, stake) in stakes.iter().enumerate() {
                self.by_txid
                    .entry(stake.outpoint().txid)
                    .or_default()
                    .push(TxLocus::Stake {
                        claim_id: *claim_id,
                        index,
                    });
            }
        }
    }
}
