// Registry - THE STATE MACHINE
//
// Applies the ordered ChainUpdate stream across claim store, stake totals,
// trie and account ledgers. Each event is fully checked before any component
// is touched, so a rejected event leaves no trace.

use crate::amount::Amount;
use crate::claim::{
    AbandonDecision, AbandonOutcome, Claim, ClaimError, ClaimId, ClaimStore, PublishDecision,
    PublishOutcome, Stake, StakeAggregator, StakeKind,
};
use crate::config::RegistryConfig;
use crate::event::{AbandonTarget, ChainUpdate, EventError, EventKind, LedgerEvent, Outpoint, PublishPayload, TxId};
use crate::resolve::{ChannelListing, Resolution, ResolveError, Resolver};
use crate::trie::{Candidate, ClaimTrie, TriePath};
use crate::vault::{AccountId, Accountant, EntryKind, LedgerEntry, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from applying updates to the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to encode registry: {0}")]
    EncodeFailed(String),

    #[error("Failed to decode registry: {0}")]
    DecodeFailed(String),

    #[error("Unexpected outcome: {0}")]
    UnexpectedOutcome(String),
}

/// What applying one update did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    Published(PublishOutcome),
    Abandoned(AbandonOutcome),
    Staked { claim_id: ClaimId, kind: StakeKind },
    Transferred { to: AccountId },
    Received,
    Confirmed { txid: TxId, height: u64, records: usize },
    TipAdvanced { height: u64 },
    /// Replayed event, ignored
    Duplicate(Outpoint),
}

impl ApplyOutcome {
    /// The claim the update touched, if any
    pub fn claim_id(&self) -> Option<&ClaimId> {
        match self {
            ApplyOutcome::Published(outcome) => Some(outcome.claim_id()),
            ApplyOutcome::Abandoned(outcome) => Some(outcome.claim_id()),
            ApplyOutcome::Staked { claim_id, .. } => Some(claim_id),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ApplyOutcome::Duplicate(_))
    }
}

/// Statistics about the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegistryStatistics {
    pub total_claims: usize,
    pub active_claims: usize,
    pub total_stakes: usize,
    pub accounts: usize,
    pub trie_paths: usize,
    pub applied_events: usize,
    pub tip_height: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(skip)]
    config: RegistryConfig,
    claims: ClaimStore,
    accounts: Accountant,
    /// Outcome of every applied event by outpoint, for duplicate suppression
    applied: HashMap<Outpoint, ApplyOutcome>,
    /// Arrival counter handed to newly created claims
    next_seq: u64,
    tip_height: u64,
    #[serde(skip)]
    stakes: StakeAggregator,
    #[serde(skip)]
    trie: ClaimTrie,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a registry by applying a recorded update stream from scratch
    pub fn replay(
        config: RegistryConfig,
        updates: impl IntoIterator<Item = ChainUpdate>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config);
        let mut count = 0usize;
        for update in updates {
            registry.apply(update)?;
            count += 1;
        }
        info!(updates = count, claims = registry.claims.len(), tip = registry.tip_height, "Replayed update log");
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn tip_height(&self) -> u64 {
        self.tip_height
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn has_applied(&self, outpoint: &Outpoint) -> bool {
        self.applied.contains_key(outpoint)
    }

    /// What the event at `outpoint` did when it was first applied
    pub fn applied_outcome(&self, outpoint: &Outpoint) -> Option<&ApplyOutcome> {
        self.applied.get(outpoint)
    }

    pub fn claims(&self) -> &ClaimStore {
        &self.claims
    }

    pub fn accounts(&self) -> &Accountant {
        &self.accounts
    }

    // ========================================================================
    // APPLY
    // ========================================================================

    /// Apply one update from the ordered stream.
    /// A replayed event is suppressed and reported as `ApplyOutcome::Duplicate`.
    pub fn apply(&mut self, update: ChainUpdate) -> Result<ApplyOutcome, RegistryError> {
        match update {
            ChainUpdate::Event(event) => {
                if self.applied.contains_key(event.outpoint()) {
                    warn!(outpoint = %event.outpoint(), kind = event.kind().label(), "Ignoring duplicate event");
                    return Ok(ApplyOutcome::Duplicate(*event.outpoint()));
                }
                self.apply_event(&event)
            }
            ChainUpdate::Confirmed { txid, height } => {
                let records = self.confirm(&txid, height);
                Ok(ApplyOutcome::Confirmed { txid, height, records })
            }
            ChainUpdate::Tip { height } => {
                self.advance_tip(height);
                Ok(ApplyOutcome::TipAdvanced { height })
            }
        }
    }

    /// Apply an event for a facade call. A replay returns the outcome the
    /// event had the first time and changes nothing.
    pub(crate) fn submit(&mut self, event: LedgerEvent) -> Result<ApplyOutcome, RegistryError> {
        if let Some(outcome) = self.applied.get(event.outpoint()) {
            debug!(outpoint = %event.outpoint(), kind = event.kind().label(), "Replayed event, returning first outcome");
            return Ok(outcome.clone());
        }
        self.apply_event(&event)
    }

    fn apply_event(&mut self, event: &LedgerEvent) -> Result<ApplyOutcome, RegistryError> {
        event.validate()?;
        let outcome = match event.kind() {
            EventKind::Publish(payload) => self.apply_publish(event, payload)?,
            EventKind::Abandon(target) => self.apply_abandon(event, target)?,
            EventKind::Support { claim_id } => self.apply_stake(event, claim_id, StakeKind::Support)?,
            EventKind::Tip { claim_id } => self.apply_stake(event, claim_id, StakeKind::Tip)?,
            EventKind::Transfer { to } => self.apply_transfer(event, to)?,
            EventKind::Receive => self.apply_receive(event)?,
        };
        self.applied.insert(*event.outpoint(), outcome.clone());
        debug!(
            outpoint = %event.outpoint(),
            account = %event.account(),
            kind = event.kind().label(),
            height = event.height(),
            "Applied event"
        );
        Ok(outcome)
    }

    fn apply_publish(&mut self, event: &LedgerEvent, payload: &PublishPayload) -> Result<ApplyOutcome, RegistryError> {
        let decision = self.claims.decide_publish(
            event.account(),
            event.outpoint(),
            payload,
            self.config.max_name_length,
        )?;

        let gross = Self::gross(event.amount(), event.fee())?;
        let (required, entry) = match &decision {
            PublishDecision::Create { .. } => (
                gross,
                LedgerEntry::new(*event.outpoint(), EntryKind::Publish, Amount::ZERO, event.amount(), event.fee(), event.height()),
            ),
            PublishDecision::Update { previous_deposit, .. } => (
                gross.saturating_sub(*previous_deposit),
                LedgerEntry::new(*event.outpoint(), EntryKind::Update, *previous_deposit, event.amount(), event.fee(), event.height()),
            ),
        };
        if let Some(claim) = self.claims.get(decision.claim_id()) {
            self.stakes.can_add(claim, event.amount())?;
        }
        self.ensure_spendable(event.account(), required)?;

        if let PublishDecision::Update { claim_id, previous_channel, .. } = &decision {
            if previous_channel.as_ref() != payload.channel_id.as_ref() {
                info!(claim_id = %claim_id, from = ?previous_channel, to = ?payload.channel_id, "Claim moved to another channel");
            }
        }

        let seq = self.next_seq;
        let outcome = self.claims.commit_publish(
            &decision,
            event.account(),
            *event.outpoint(),
            event.height(),
            event.amount(),
            payload,
            seq,
        );
        if matches!(outcome, PublishOutcome::Created(_)) {
            self.next_seq += 1;
        }
        self.accounts.record(event.account(), entry);
        self.rerank(outcome.claim_id());

        match outcome {
            PublishOutcome::Created(id) => info!(claim_id = %id, name = %payload.name, "Claim created"),
            PublishOutcome::Updated(id) => info!(claim_id = %id, name = %payload.name, "Claim updated"),
        }
        Ok(ApplyOutcome::Published(outcome))
    }

    fn apply_abandon(&mut self, event: &LedgerEvent, target: &AbandonTarget) -> Result<ApplyOutcome, RegistryError> {
        let (claim_id, owner, deposit) = match self.claims.decide_abandon(event.account(), target)? {
            AbandonDecision::AlreadyAbandoned { claim_id } => {
                debug!(claim_id = %claim_id, "Claim already abandoned");
                return Ok(ApplyOutcome::Abandoned(AbandonOutcome::AlreadyAbandoned(claim_id)));
            }
            AbandonDecision::Abandon { claim_id, owner, deposit } => (claim_id, owner, deposit),
        };

        self.ensure_spendable(event.account(), event.fee().saturating_sub(deposit))?;

        let outcome = self.claims.commit_abandon(&claim_id);
        self.accounts.record(
            &owner,
            LedgerEntry::new(*event.outpoint(), EntryKind::Abandon, deposit, Amount::ZERO, event.fee(), event.height()),
        );
        self.trie.remove_claim(&claim_id);

        info!(claim_id = %claim_id, "Claim abandoned");
        Ok(ApplyOutcome::Abandoned(outcome))
    }

    fn apply_stake(&mut self, event: &LedgerEvent, claim_id: &ClaimId, kind: StakeKind) -> Result<ApplyOutcome, RegistryError> {
        let target = self.claims.stake_target(claim_id)?;
        self.stakes.can_add(target, event.amount())?;
        self.ensure_spendable(event.account(), Self::gross(event.amount(), event.fee())?)?;

        let stake = Stake::new(
            *claim_id,
            event.amount(),
            *event.outpoint(),
            event.account().clone(),
            kind,
            event.height(),
        );
        self.stakes.add_stake(&stake);
        self.claims.push_stake(stake);

        let entry_kind = match kind {
            StakeKind::Support => EntryKind::Support,
            StakeKind::Tip => EntryKind::Tip,
        };
        self.accounts.record(
            event.account(),
            LedgerEntry::new(*event.outpoint(), entry_kind, Amount::ZERO, event.amount(), event.fee(), event.height()),
        );
        self.rerank(claim_id);

        Ok(ApplyOutcome::Staked { claim_id: *claim_id, kind })
    }

    fn apply_transfer(&mut self, event: &LedgerEvent, to: &AccountId) -> Result<ApplyOutcome, RegistryError> {
        if to == event.account() {
            return Err(EventError::SelfTransfer.into());
        }
        self.ensure_spendable(event.account(), Self::gross(event.amount(), event.fee())?)?;

        self.accounts.record(
            event.account(),
            LedgerEntry::new(*event.outpoint(), EntryKind::TransferOut, Amount::ZERO, event.amount(), event.fee(), event.height()),
        );
        self.accounts.record(
            to,
            LedgerEntry::new(*event.outpoint(), EntryKind::TransferIn, event.amount(), Amount::ZERO, Amount::ZERO, event.height()),
        );
        Ok(ApplyOutcome::Transferred { to: to.clone() })
    }

    fn apply_receive(&mut self, event: &LedgerEvent) -> Result<ApplyOutcome, RegistryError> {
        self.ensure_spendable(event.account(), event.fee().saturating_sub(event.amount()))?;
        self.accounts.record(
            event.account(),
            LedgerEntry::new(*event.outpoint(), EntryKind::Receive, event.amount(), Amount::ZERO, event.fee(), event.height()),
        );
        Ok(ApplyOutcome::Received)
    }

    fn gross(amount: Amount, fee: Amount) -> Result<Amount, RegistryError> {
        amount.checked_add(fee).ok_or(RegistryError::Vault(VaultError::BalanceOverflow))
    }

    fn ensure_spendable(&self, account: &AccountId, required: Amount) -> Result<(), RegistryError> {
        if self.config.enforce_balances {
            self.accounts.ensure_available(account, required)?;
        }
        Ok(())
    }

    fn rerank(&mut self, claim_id: &ClaimId) {
        if let Some(claim) = self.claims.get(claim_id) {
            self.trie.upsert_claim(claim, &self.stakes);
        }
    }

    // ========================================================================
    // CONFIRMATIONS
    // ========================================================================

    /// Record that a previously observed transaction reached a block
    pub fn confirm(&mut self, txid: &TxId, height: u64) -> usize {
        let records = self.claims.confirm(txid, height) + self.accounts.confirm(txid, height);
        debug!(txid = %txid, height, records, "Confirmed transaction");
        records
    }

    /// Move the chain tip. The tip never moves backwards.
    pub fn advance_tip(&mut self, height: u64) {
        if height < self.tip_height {
            warn!(height, tip = self.tip_height, "Ignoring tip below current tip");
            return;
        }
        self.tip_height = height;
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Point lookup by id, abandoned claims included
    pub fn claim(&self, claim_id: &ClaimId) -> Option<&Claim> {
        self.claims.get(claim_id)
    }

    /// Supports and tips of a claim in arrival order
    pub fn stakes_of(&self, claim_id: &ClaimId) -> &[Stake] {
        self.claims.stakes(claim_id)
    }

    /// Ranking weight of a claim; zero once abandoned
    pub fn effective_amount(&self, claim_id: &ClaimId) -> Option<Amount> {
        self.claims.get(claim_id).map(|c| self.stakes.effective_amount(c))
    }

    /// Deposit plus stakes, regardless of abandonment
    pub fn raw_amount(&self, claim_id: &ClaimId) -> Option<Amount> {
        self.claims.get(claim_id).map(|c| self.stakes.raw_amount(c))
    }

    pub fn winner_at(&self, path: &TriePath) -> Option<&Claim> {
        self.trie.winner_at(path).and_then(|id| self.claims.get(id))
    }

    pub fn candidates(&self, path: &TriePath) -> Vec<Candidate> {
        self.trie.candidates(path)
    }

    /// Active channels owned by an account
    pub fn channels_of(&self, account: &AccountId) -> Vec<&Claim> {
        self.claims
            .claims_owned_by(account)
            .into_iter()
            .filter(|c| c.is_channel())
            .collect()
    }

    /// Balance counting entries with at least `min_confirmations` confirmations
    pub fn balance(&self, account: &AccountId, min_confirmations: u64) -> Amount {
        self.accounts.confirmed_balance(account, min_confirmations, self.tip_height)
    }

    pub fn unconfirmed_balance(&self, account: &AccountId) -> Amount {
        self.accounts.unconfirmed_balance(account)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.claims, &self.stakes, &self.trie, &self.config.uri_scheme, self.tip_height)
    }

    pub fn resolve(&self, uri: &str) -> Result<Resolution, RegistryError> {
        Ok(self.resolver().resolve(uri)?)
    }

    pub fn resolve_many<S: AsRef<str>>(&self, uris: &[S]) -> BTreeMap<String, Resolution> {
        self.resolver().resolve_many(uris)
    }

    pub fn list_channel(&self, uri: &str, page: usize, page_size: usize) -> Result<ChannelListing, RegistryError> {
        Ok(self.resolver().list_channel(uri, page, page_size)?)
    }

    pub fn statistics(&self) -> RegistryStatistics {
        RegistryStatistics {
            total_claims: self.claims.len(),
            active_claims: self.claims.iter().filter(|c| c.is_active()).count(),
            total_stakes: self.claims.stake_count(),
            accounts: self.accounts.account_count(),
            trie_paths: self.trie.path_count(),
            applied_events: self.applied.len(),
            tip_height: self.tip_height,
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Re-derive stake totals and the trie from the claim store
    pub fn rebuild_index(&mut self) {
        self.claims.rebuild_indexes();
        self.stakes.rebuild(&self.claims);
        self.trie.rebuild(&self.claims, &self.stakes);
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        postcard::to_allocvec(self).map_err(|e| RegistryError::EncodeFailed(e.to_string()))
    }

    /// Deserialize from bytes and rebuild derived indexes
    pub fn from_bytes(bytes: &[u8], config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut registry: Registry =
            postcard::from_bytes(bytes).map_err(|e| RegistryError::DecodeFailed(e.to_string()))?;
        registry.config = config;
        registry.rebuild_index();
        Ok(registry)
    }
}
