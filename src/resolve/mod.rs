// Resolve module - THE QUERY SIDE
// Parses claim URIs and answers them from the trie and claim store

mod channel;
mod engine;
mod uri;

pub use channel::CertificateLinker;
pub use engine::{ChannelListing, ClaimSummary, Resolution, ResolveError, Resolver, StakeSummary};
pub use uri::{Segment, Uri, UriError};
