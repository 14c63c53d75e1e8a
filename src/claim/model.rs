use crate::amount::Amount;
use crate::event::{ContentRef, Outpoint};
use crate::ident::hex_id;
use crate::vault::AccountId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

hex_id!(
    /// Stable identity of a claim, fixed at creation and kept across updates
    ClaimId,
    20
);

impl ClaimId {
    /// Derive the id of a claim created at `outpoint`
    pub fn from_outpoint(outpoint: &Outpoint) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"claim:");
        hasher.update(outpoint.txid.as_bytes());
        hasher.update(outpoint.nout.to_le_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&result[..20]);
        Self(bytes)
    }
}

/// Claim variant, decided by the name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimKind {
    /// Certificate other claims can reference; names start with `@`
    Channel,
    /// Content claim
    Stream,
}

impl ClaimKind {
    pub fn for_name(name: &str) -> Self {
        if name.starts_with('@') {
            ClaimKind::Channel
        } else {
            ClaimKind::Stream
        }
    }
}

/// One revision of a claim: the creating publish or a later update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub outpoint: Outpoint,
    pub height: u64,
    pub deposit: Amount,
    pub content_ref: ContentRef,
    pub channel_id: Option<ClaimId>,
}

/// A named, staked claim with its full revision history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claim {
    claim_id: ClaimId,
    name: String,
    kind: ClaimKind,
    /// Signing channel; a lookup key, never ownership
    channel_id: Option<ClaimId>,
    owner: AccountId,
    deposit: Amount,
    content_ref: ContentRef,
    /// Outpoint of the latest revision
    outpoint: Outpoint,
    /// Height of the latest revision, 0 while unconfirmed
    height: u64,
    abandoned: bool,
    /// Arrival order of the creating event; earlier wins ties
    registered_seq: u64,
    history: Vec<Revision>,
}

impl Claim {
    pub(crate) fn create(
        claim_id: ClaimId,
        name: String,
        owner: AccountId,
        revision: Revision,
        registered_seq: u64,
    ) -> Self {
        Self {
            claim_id,
            kind: ClaimKind::for_name(&name),
            name,
            channel_id: revision.channel_id,
            owner,
            deposit: revision.deposit,
            content_ref: revision.content_ref.clone(),
            outpoint: revision.outpoint,
            height: revision.height,
            abandoned: false,
            registered_seq,
            history: vec![revision],
        }
    }

    /// Apply an update in place; identity and stakes are untouched
    pub(crate) fn revise(&mut self, revision: Revision) {
        self.channel_id = revision.channel_id;
        self.deposit = revision.deposit;
        self.content_ref = revision.content_ref.clone();
        self.outpoint = revision.outpoint;
        self.height = revision.height;
        self.history.push(revision);
    }

    pub(crate) fn mark_abandoned(&mut self) {
        self.abandoned = true;
    }

    /// Record block inclusion of any revision created by `outpoint`'s transaction
    pub(crate) fn confirm_revision(&mut self, index: usize, height: u64) {
        if let Some(revision) = self.history.get_mut(index) {
            revision.height = height;
            if revision.outpoint == self.outpoint {
                self.height = height;
            }
        }
    }

    pub fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClaimKind {
        self.kind
    }

    pub fn is_channel(&self) -> bool {
        self.kind == ClaimKind::Channel
    }

    pub fn channel_id(&self) -> Option<&ClaimId> {
        self.channel_id.as_ref()
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn deposit(&self) -> Amount {
        self.deposit
    }

    pub fn content_ref(&self) -> &ContentRef {
        &self.content_ref
    }

    pub fn outpoint(&self) -> &Outpoint {
        &self.outpoint
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    pub fn is_active(&self) -> bool {
        !self.abandoned
    }

    pub fn registered_seq(&self) -> u64 {
        self.registered_seq
    }

    /// Every revision, oldest first
    pub fn history(&self) -> &[Revision] {
        &self.history
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeKind {
    /// Locked behind the claim; the supporter can redeem it later
    Support,
    /// Given away to the claim for good
    Tip,
}

impl StakeKind {
    pub fn is_redeemable(&self) -> bool {
        matches!(self, StakeKind::Support)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StakeKind::Support => "support",
            StakeKind::Tip => "tip",
        }
    }
}

/// A support or tip attached to a claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    target: ClaimId,
    amount: Amount,
    outpoint: Outpoint,
    source_account: AccountId,
    kind: StakeKind,
    height: u64,
}

impl Stake {
    pub fn new(
        target: ClaimId,
        amount: Amount,
        outpoint: Outpoint,
        source_account: AccountId,
        kind: StakeKind,
        height: u64,
    ) -> Self {
        Self {
            target,
            amount,
            outpoint,
            source_account,
            kind,
            height,
        }
    }

    pub fn target(&self) -> &ClaimId {
        &self.target
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn outpoint(&self) -> &Outpoint {
        &self.outpoint
    }

    pub fn source_account(&self) -> &AccountId {
        &self.source_account
    }

    pub fn kind(&self) -> StakeKind {
        self.kind
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: u64) {
        self.height = height;
    }
}
