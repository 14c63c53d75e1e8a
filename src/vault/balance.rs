// Balance tracking - per-account running ledgers and confirmation-gated balances

use crate::amount::Amount;
use crate::event::{Outpoint, TxId};
use crate::vault::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during balance accounting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("Balance would overflow")]
    BalanceOverflow,
}

/// What produced a ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// New claim: deposit locked
    Publish,
    /// Claim update: previous deposit released, new deposit locked
    Update,
    /// Claim abandoned: deposit returned
    Abandon,
    Support,
    Tip,
    TransferOut,
    TransferIn,
    Receive,
}

/// One line of an account's running ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    outpoint: Outpoint,
    kind: EntryKind,
    /// Value flowing into the account's spendable balance
    received: Amount,
    /// Value leaving the spendable balance (sent, locked or tipped away)
    sent: Amount,
    /// Network fee reported for the event
    fee: Amount,
    /// Block height, 0 while unconfirmed
    height: u64,
}

impl LedgerEntry {
    pub fn new(outpoint: Outpoint, kind: EntryKind, received: Amount, sent: Amount, fee: Amount, height: u64) -> Self {
        Self {
            outpoint,
            kind,
            received,
            sent,
            fee,
            height,
        }
    }

    pub fn outpoint(&self) -> &Outpoint {
        &self.outpoint
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn received(&self) -> Amount {
        self.received
    }

    pub fn sent(&self) -> Amount {
        self.sent
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Net effect on the balance, in signed dewies
    pub fn net(&self) -> i128 {
        self.received.signed() - self.sent.signed() - self.fee.signed()
    }

    /// Confirmations this entry has when the chain tip is at `tip`
    pub fn confirmations(&self, tip: u64) -> u64 {
        confirmations(self.height, tip)
    }
}

/// Confirmation depth of something included at `height` with the chain tip at `tip`
pub fn confirmations(height: u64, tip: u64) -> u64 {
    if height == 0 || tip < height {
        0
    } else {
        tip - height + 1
    }
}

/// Running ledger of one account
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountLedger {
    entries: Vec<LedgerEntry>,
}

impl AccountLedger {
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Signed sum of entries with at least `min_confirmations` confirmations
    fn net_with_confirmations(&self, min_confirmations: u64, tip: u64) -> i128 {
        self.entries
            .iter()
            .filter(|e| e.confirmations(tip) >= min_confirmations)
            .map(LedgerEntry::net)
            .sum()
    }
}

/// Computes confirmed and unconfirmed balances per account from the event stream
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Accountant {
    ledgers: HashMap<AccountId, AccountLedger>,
}

impl Accountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to an account's ledger
    pub fn record(&mut self, account: &AccountId, entry: LedgerEntry) {
        self.ledgers.entry(account.clone()).or_default().entries.push(entry);
    }

    /// Balance counting only entries with at least `min_confirmations` confirmations.
    /// A negative running total is reported as zero.
    pub fn confirmed_balance(&self, account: &AccountId, min_confirmations: u64, tip: u64) -> Amount {
        let net = self
            .ledgers
            .get(account)
            .map(|l| l.net_with_confirmations(min_confirmations, tip))
            .unwrap_or(0);
        Amount::from_signed_clamped(net)
    }

    /// Balance including pending (0-confirmation) entries
    pub fn unconfirmed_balance(&self, account: &AccountId) -> Amount {
        self.confirmed_balance(account, 0, 0)
    }

    /// Fail unless the account can spend `required` right now
    pub fn ensure_available(&self, account: &AccountId, required: Amount) -> Result<(), VaultError> {
        if required.is_zero() {
            return Ok(());
        }
        let available = self.unconfirmed_balance(account);
        if required > available {
            return Err(VaultError::InsufficientBalance { available, required });
        }
        Ok(())
    }

    /// Mark every entry from `txid` as included at `height`. Returns how many changed.
    pub fn confirm(&mut self, txid: &TxId, height: u64) -> usize {
        let mut changed = 0;
        for ledger in self.ledgers.values_mut() {
            for entry in ledger.entries.iter_mut().filter(|e| &e.outpoint.txid == txid) {
                if entry.height != height {
                    entry.height = height;
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn ledger(&self, account: &AccountId) -> Option<&AccountLedger> {
        self.ledgers.get(account)
    }

    /// Accounts with at least one ledger entry, sorted
    pub fn accounts(&self) -> Vec<&AccountId> {
        let mut accounts: Vec<_> = self.ledgers.keys().collect();
        accounts.sort();
        accounts
    }

    pub fn account_count(&self) -> usize {
        self.ledgers.len()
    }
}
