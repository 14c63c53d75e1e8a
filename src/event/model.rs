use crate::amount::Amount;
use crate::claim::ClaimId;
use crate::ident::hex_id;
use crate::vault::AccountId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

hex_id!(
    /// Transaction hash of a ledger event
    TxId,
    32
);

impl TxId {
    /// SHA256 of arbitrary bytes, handy for deriving stable test and fixture ids
    pub fn digest(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }
}

/// The locus of a ledger event: a transaction output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: TxId,
    pub nout: u32,
}

impl Outpoint {
    pub fn new(txid: TxId, nout: u32) -> Self {
        Self { txid, nout }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.nout)
    }
}

/// Opaque reference to the published content (stream descriptor hash, etc.)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of a publish event. Creates a claim, or updates the claim it resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPayload {
    /// Claim name; channel names start with `@`
    pub name: String,
    /// Signing channel back-reference
    #[serde(default)]
    pub channel_id: Option<ClaimId>,
    /// Content being claimed
    #[serde(default)]
    pub content_ref: ContentRef,
    /// Explicit claim to update, bypassing the name/channel identity lookup
    #[serde(default)]
    pub claim_id: Option<ClaimId>,
}

/// What an abandon event points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonTarget {
    Claim(ClaimId),
    Outpoint(Outpoint),
}

impl fmt::Display for AbandonTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonTarget::Claim(id) => write!(f, "claim {}", id),
            AbandonTarget::Outpoint(op) => write!(f, "outpoint {}", op),
        }
    }
}

/// Kind-specific part of a ledger event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Publish or update a claim; `amount` is the deposit
    Publish(PublishPayload),
    /// Abandon a claim, returning its deposit to the owner
    Abandon(AbandonTarget),
    /// Lock `amount` behind a claim (redeemable)
    Support { claim_id: ClaimId },
    /// Send `amount` to a claim for good (not redeemable)
    Tip { claim_id: ClaimId },
    /// Plain value transfer to another account
    Transfer { to: AccountId },
    /// Funds arriving from outside the registry's accounts
    Receive,
}

impl EventKind {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Publish(_) => "publish",
            EventKind::Abandon(_) => "abandon",
            EventKind::Support { .. } => "support",
            EventKind::Tip { .. } => "tip",
            EventKind::Transfer { .. } => "transfer",
            EventKind::Receive => "receive",
        }
    }
}

/// A normalized ledger event, as handed to the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    outpoint: Outpoint,
    account: AccountId,
    /// Block height; 0 while the transaction is unconfirmed
    height: u64,
    amount: Amount,
    fee: Amount,
    kind: EventKind,
}

impl LedgerEvent {
    /// Create a new event. Prefer `EventBuilder`, which validates fields.
    pub fn new(
        outpoint: Outpoint,
        account: AccountId,
        height: u64,
        amount: Amount,
        fee: Amount,
        kind: EventKind,
    ) -> Self {
        Self {
            outpoint,
            account,
            height,
            amount,
            fee,
            kind,
        }
    }

    pub fn outpoint(&self) -> &Outpoint {
        &self.outpoint
    }

    pub fn txid(&self) -> &TxId {
        &self.outpoint.txid
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The same event observed at a different height
    pub fn at_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }
}

/// One step of the ordered input stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainUpdate {
    /// A new ledger event (pending at height 0, or already in a block)
    Event(LedgerEvent),
    /// A previously observed transaction was included in a block
    Confirmed { txid: TxId, height: u64 },
    /// The chain tip moved
    Tip { height: u64 },
}

impl ChainUpdate {
    pub fn label(&self) -> &'static str {
        match self {
            ChainUpdate::Event(event) => event.kind().label(),
            ChainUpdate::Confirmed { .. } => "confirmed",
            ChainUpdate::Tip { .. } => "tip",
        }
    }
}

impl From<LedgerEvent> for ChainUpdate {
    fn from(event: LedgerEvent) -> Self {
        ChainUpdate::Event(event)
    }
}
