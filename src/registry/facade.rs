// Registry facade - caller-facing operations
//
// Each operation turns its arguments plus a TxContext (supplied by the wallet
// that built the transaction) into a ledger event and applies it. Repeating a
// call with the same outpoint is a no-op that returns the first result.

use crate::amount::Amount;
use crate::claim::{AbandonOutcome, ClaimError, ClaimId, PublishOutcome};
use crate::event::{AbandonTarget, ContentRef, EventBuilder, EventKind, Outpoint, PublishPayload};
use crate::registry::state::{ApplyOutcome, Registry, RegistryError};
use crate::vault::AccountId;
use serde::{Deserialize, Serialize};

/// Transaction details supplied by the external wallet for one operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub outpoint: Outpoint,
    pub account: AccountId,
    /// 0 while unconfirmed
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub fee: Amount,
}

impl TxContext {
    pub fn new(outpoint: Outpoint, account: impl Into<AccountId>) -> Self {
        Self {
            outpoint,
            account: account.into(),
            height: 0,
            fee: Amount::ZERO,
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    fn event(&self) -> EventBuilder {
        EventBuilder::new()
            .outpoint(self.outpoint)
            .account(&self.account)
            .height(self.height)
            .fee(self.fee)
    }
}

/// Signing channel of a publish, by id or by the publisher's channel name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelRef {
    Id(ClaimId),
    Name(String),
}

/// Arguments of a publish
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub name: String,
    pub deposit: Amount,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    #[serde(default)]
    pub content_ref: ContentRef,
    /// Update this claim instead of looking one up by name and channel
    #[serde(default)]
    pub claim_id: Option<ClaimId>,
}

impl PublishRequest {
    pub fn new(name: impl Into<String>, deposit: Amount) -> Self {
        Self {
            name: name.into(),
            deposit,
            channel: None,
            content_ref: ContentRef::default(),
            claim_id: None,
        }
    }

    pub fn in_channel(mut self, channel: ChannelRef) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn content(mut self, content_ref: impl Into<ContentRef>) -> Self {
        self.content_ref = content_ref.into();
        self
    }

    pub fn updating(mut self, claim_id: ClaimId) -> Self {
        self.claim_id = Some(claim_id);
        self
    }
}

impl Registry {
    /// Id of the account's own active channel called `name`
    pub fn channel_for_name(&self, account: &AccountId, name: &str) -> Result<ClaimId, ClaimError> {
        self.claims()
            .active_channel_named(account, name)
            .map(|c| *c.claim_id())
            .ok_or_else(|| ClaimError::ChannelNotFound(name.to_string()))
    }

    /// Publish a new claim or update an existing one
    pub fn publish(&mut self, tx: &TxContext, request: PublishRequest) -> Result<PublishOutcome, RegistryError> {
        let channel_id = match &request.channel {
            None => None,
            Some(ChannelRef::Id(id)) => Some(*id),
            Some(ChannelRef::Name(name)) => Some(self.channel_for_name(&tx.account, name)?),
        };
        let event = tx
            .event()
            .amount(request.deposit)
            .kind(EventKind::Publish(PublishPayload {
                name: request.name,
                channel_id,
                content_ref: request.content_ref,
                claim_id: request.claim_id,
            }))
            .build()?;

        match self.submit(event)? {
            ApplyOutcome::Published(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    /// Abandon a claim by id or by its current outpoint
    pub fn abandon(&mut self, tx: &TxContext, target: AbandonTarget) -> Result<AbandonOutcome, RegistryError> {
        let event = tx.event().abandon(target).build()?;
        match self.submit(event)? {
            ApplyOutcome::Abandoned(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    /// Lock `amount` behind a claim. Returns the claim's new effective amount.
    pub fn support(&mut self, tx: &TxContext, claim_id: &ClaimId, amount: Amount) -> Result<Amount, RegistryError> {
        let event = tx.event().amount(amount).support(*claim_id).build()?;
        self.submit(event)?;
        Ok(self.effective_amount(claim_id).unwrap_or(Amount::ZERO))
    }

    /// Tip a claim. Returns the claim's new effective amount.
    pub fn tip(&mut self, tx: &TxContext, claim_id: &ClaimId, amount: Amount) -> Result<Amount, RegistryError> {
        let event = tx.event().amount(amount).tip(*claim_id).build()?;
        self.submit(event)?;
        Ok(self.effective_amount(claim_id).unwrap_or(Amount::ZERO))
    }

    /// Plain transfer to another account
    pub fn transfer(&mut self, tx: &TxContext, to: &AccountId, amount: Amount) -> Result<(), RegistryError> {
        let event = tx.event().amount(amount).transfer(to).build()?;
        self.submit(event)?;
        Ok(())
    }

    /// Credit funds arriving from outside the registry
    pub fn receive(&mut self, tx: &TxContext, amount: Amount) -> Result<(), RegistryError> {
        let event = tx.event().amount(amount).receive().build()?;
        self.submit(event)?;
        Ok(())
    }
}

fn unexpected(outcome: ApplyOutcome) -> RegistryError {
    RegistryError::UnexpectedOutcome(format!("{:?}", outcome))
}
