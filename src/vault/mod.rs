// Vault module - Tracks what each account owns (confirmed and pending balances)

mod account;
mod balance;

pub use account::AccountId;
pub use balance::{
    confirmations, AccountLedger, Accountant, EntryKind, LedgerEntry, VaultError,
};
