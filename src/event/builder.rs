use crate::amount::Amount;
use crate::claim::ClaimId;
use crate::event::{AbandonTarget, ContentRef, EventKind, LedgerEvent, Outpoint, PublishPayload, TxId};
use crate::vault::AccountId;
use thiserror::Error;

/// Errors that can occur when building a ledger event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Missing txid: originating transaction is required")]
    MissingTxId,

    #[error("Missing account: acting account is required")]
    MissingAccount,

    #[error("Missing kind: event kind is required")]
    MissingKind,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Self-transfer not allowed: sender and recipient are the same account")]
    SelfTransfer,

    #[error("Block {height} arrived after block {last}")]
    OutOfOrderBlock { height: u64, last: u64 },
}

/// Builder for ledger events
///
/// ```ignore
/// let event = EventBuilder::new()
///     .txid(txid)
///     .account("chris")
///     .amount("1.0".parse()?)
///     .publish("@spam")
///     .build()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventBuilder {
    txid: Option<TxId>,
    nout: u32,
    account: Option<AccountId>,
    height: u64,
    amount: Amount,
    fee: Amount,
    kind: Option<EventKind>,
}

impl EventBuilder {
    /// Create a new EventBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the originating transaction (required)
    pub fn txid(mut self, txid: TxId) -> Self {
        self.txid = Some(txid);
        self
    }

    /// Set the output index (defaults to 0)
    pub fn nout(mut self, nout: u32) -> Self {
        self.nout = nout;
        self
    }

    /// Set txid and nout together
    pub fn outpoint(mut self, outpoint: Outpoint) -> Self {
        self.txid = Some(outpoint.txid);
        self.nout = outpoint.nout;
        self
    }

    /// Set the acting account (required)
    pub fn account(mut self, account: impl Into<AccountId>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the block height (defaults to 0, unconfirmed)
    pub fn height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    /// Set the value carried by the event
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// Set the network fee paid by the acting account
    pub fn fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    /// Set the kind directly
    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Publish a claim at `name`
    pub fn publish(self, name: impl Into<String>) -> Self {
        self.kind(EventKind::Publish(PublishPayload {
            name: name.into(),
            channel_id: None,
            content_ref: ContentRef::default(),
            claim_id: None,
        }))
    }

    /// Sign the publish with a channel. No effect on other kinds.
    pub fn in_channel(mut self, channel_id: ClaimId) -> Self {
        if let Some(EventKind::Publish(payload)) = self.kind.as_mut() {
            payload.channel_id = Some(channel_id);
        }
        self
    }

    /// Set the content reference of a publish. No effect on other kinds.
    pub fn content(mut self, content_ref: impl Into<ContentRef>) -> Self {
        if let Some(EventKind::Publish(payload)) = self.kind.as_mut() {
            payload.content_ref = content_ref.into();
        }
        self
    }

    /// Make a publish update a specific claim. No effect on other kinds.
    pub fn updating(mut self, claim_id: ClaimId) -> Self {
        if let Some(EventKind::Publish(payload)) = self.kind.as_mut() {
            payload.claim_id = Some(claim_id);
        }
        self
    }

    pub fn abandon(self, target: AbandonTarget) -> Self {
        self.kind(EventKind::Abandon(target))
    }

    pub fn support(self, claim_id: ClaimId) -> Self {
        self.kind(EventKind::Support { claim_id })
    }

    pub fn tip(self, claim_id: ClaimId) -> Self {
        self.kind(EventKind::Tip { claim_id })
    }

    pub fn transfer(self, to: impl Into<AccountId>) -> Self {
        self.kind(EventKind::Transfer { to: to.into() })
    }

    pub fn receive(self) -> Self {
        self.kind(EventKind::Receive)
    }

    /// Validate and build the event
    pub fn build(self) -> Result<LedgerEvent, EventError> {
        let txid = self.txid.ok_or(EventError::MissingTxId)?;
        let account = self.account.ok_or(EventError::MissingAccount)?;
        let kind = self.kind.ok_or(EventError::MissingKind)?;

        let event = LedgerEvent::new(
            Outpoint::new(txid, self.nout),
            account,
            self.height,
            self.amount,
            self.fee,
            kind,
        );
        event.validate()?;
        Ok(event)
    }
}

impl LedgerEvent {
    /// Field checks shared by the builder and by events ingested as data
    pub fn validate(&self) -> Result<(), EventError> {
        if self.account().as_str().is_empty() {
            return Err(EventError::MissingAccount);
        }

        match self.kind() {
            EventKind::Publish(payload) => {
                if payload.name.is_empty() {
                    return Err(EventError::InvalidName("name cannot be empty".to_string()));
                }
            }
            EventKind::Support { .. } | EventKind::Tip { .. } | EventKind::Receive => {
                if self.amount().is_zero() {
                    return Err(EventError::InvalidAmount(format!(
                        "{} amount cannot be zero",
                        self.kind().label()
                    )));
                }
            }
            EventKind::Transfer { to } => {
                if self.amount().is_zero() {
                    return Err(EventError::InvalidAmount("transfer amount cannot be zero".to_string()));
                }
                if to == self.account() {
                    return Err(EventError::SelfTransfer);
                }
            }
            EventKind::Abandon(_) => {}
        }
        Ok(())
    }
}
