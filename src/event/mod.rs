// Event module - THE INPUT STREAM
// Normalizes externally observed chain activity into ordered ledger events

mod builder;
mod codec;
mod model;
mod normalizer;
mod source;

pub use builder::{EventBuilder, EventError};
pub use codec::{CodecError, UpdateCodec, FORMAT_VERSION};
pub use model::{
    AbandonTarget, ChainUpdate, ContentRef, EventKind, LedgerEvent, Outpoint, PublishPayload, TxId,
};
pub use normalizer::{BlockEntry, Normalizer};
pub use source::{ChannelSource, EventSource, ReplaySource};
