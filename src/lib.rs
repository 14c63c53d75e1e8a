// claimtrie - Claim trie index and staking ledger
//
// Path-to-claim resolution backed by staked, confirmation-aware claims:
//
//   event     normalized chain updates (the input stream)
//   claim     claim records, revisions, stakes, effective amounts
//   trie      per-path candidates and cached winners
//   resolve   URI parsing and resolution queries
//   vault     per-account ledgers and balances
//   registry  the ordered state machine tying the above together
//   storage   sled-backed update log and snapshots

pub mod amount;
pub mod claim;
pub mod config;
pub mod event;
pub mod ident;
pub mod registry;
pub mod resolve;
pub mod storage;
pub mod trie;
pub mod vault;

pub use amount::{Amount, AmountError, COIN};
pub use claim::{Claim, ClaimError, ClaimId, ClaimKind, Stake, StakeKind};
pub use config::{ConfigError, RegistryConfig};
pub use event::{ChainUpdate, EventBuilder, LedgerEvent, Outpoint, TxId};
pub use ident::IdError;
pub use registry::{
    ApplyOutcome, ChannelRef, PublishRequest, Registry, RegistryError, SharedRegistry, TxContext,
};
pub use resolve::{ClaimSummary, Resolution, ResolveError};
pub use storage::{RegistryStore, StoreError};
pub use trie::TriePath;
pub use vault::{AccountId, VaultError};
