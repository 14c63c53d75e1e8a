// Registry module - THE STATE MACHINE
// Ordered application of chain updates, caller facade and shared snapshots

mod facade;
mod feed;
mod shared;
mod state;

pub use facade::{ChannelRef, PublishRequest, TxContext};
pub use feed::{run_feed, FeedStats};
pub use shared::SharedRegistry;
pub use state::{ApplyOutcome, Registry, RegistryError, RegistryStatistics};
