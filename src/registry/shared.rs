// SharedRegistry - one writer, many snapshot readers
//
// Readers clone the inner Arc and query it without holding the lock. The
// writer mutates through Arc::make_mut, which copies the registry only while
// an older snapshot is still alive.

use crate::amount::Amount;
use crate::claim::{AbandonOutcome, Claim, ClaimId, PublishOutcome};
use crate::event::{AbandonTarget, ChainUpdate, TxId};
use crate::registry::facade::{PublishRequest, TxContext};
use crate::registry::state::{ApplyOutcome, Registry, RegistryError};
use crate::resolve::Resolution;
use crate::vault::AccountId;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<Registry>>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// A consistent view of the registry as of the last applied update
    pub fn snapshot(&self) -> Arc<Registry> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Run a mutation under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard))
    }

    pub fn apply(&self, update: ChainUpdate) -> Result<ApplyOutcome, RegistryError> {
        self.write(|registry| registry.apply(update))
    }

    pub fn confirm(&self, txid: &TxId, height: u64) -> usize {
        self.write(|registry| registry.confirm(txid, height))
    }

    pub fn advance_tip(&self, height: u64) {
        self.write(|registry| registry.advance_tip(height))
    }

    pub fn publish(&self, tx: &TxContext, request: PublishRequest) -> Result<PublishOutcome, RegistryError> {
        self.write(|registry| registry.publish(tx, request))
    }

    pub fn abandon(&self, tx: &TxContext, target: AbandonTarget) -> Result<AbandonOutcome, RegistryError> {
        self.write(|registry| registry.abandon(tx, target))
    }

    pub fn support(&self, tx: &TxContext, claim_id: &ClaimId, amount: Amount) -> Result<Amount, RegistryError> {
        self.write(|registry| registry.support(tx, claim_id, amount))
    }

    pub fn tip(&self, tx: &TxContext, claim_id: &ClaimId, amount: Amount) -> Result<Amount, RegistryError> {
        self.write(|registry| registry.tip(tx, claim_id, amount))
    }

    pub fn transfer(&self, tx: &TxContext, to: &AccountId, amount: Amount) -> Result<(), RegistryError> {
        self.write(|registry| registry.transfer(tx, to, amount))
    }

    pub fn receive(&self, tx: &TxContext, amount: Amount) -> Result<(), RegistryError> {
        self.write(|registry| registry.receive(tx, amount))
    }

    pub fn resolve(&self, uri: &str) -> Result<Resolution, RegistryError> {
        self.snapshot().resolve(uri)
    }

    pub fn resolve_many<S: AsRef<str>>(&self, uris: &[S]) -> BTreeMap<String, Resolution> {
        self.snapshot().resolve_many(uris)
    }

    pub fn balance(&self, account: &AccountId, min_confirmations: u64) -> Amount {
        self.snapshot().balance(account, min_confirmations)
    }

    pub fn claim(&self, claim_id: &ClaimId) -> Option<Claim> {
        self.snapshot().claim(claim_id).cloned()
    }

    pub fn channels_of(&self, account: &AccountId) -> Vec<Claim> {
        self.snapshot().channels_of(account).into_iter().cloned().collect()
    }
}
