use crate::claim::{Claim, ClaimId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node key in the claim trie
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriePath {
    /// Top-level name (`hovercraft`, `@spam`)
    Name(String),
    /// Name qualified by its signing channel (`@spam/hovercraft`)
    InChannel(ClaimId, String),
}

impl TriePath {
    pub fn name(name: impl Into<String>) -> Self {
        TriePath::Name(name.into())
    }

    pub fn in_channel(channel_id: ClaimId, name: impl Into<String>) -> Self {
        TriePath::InChannel(channel_id, name.into())
    }

    /// Every path a claim competes at
    pub fn paths_for(claim: &Claim) -> Vec<TriePath> {
        let mut paths = vec![TriePath::Name(claim.name().to_string())];
        if let Some(channel_id) = claim.channel_id() {
            paths.push(TriePath::InChannel(*channel_id, claim.name().to_string()));
        }
        paths
    }

    pub fn leaf_name(&self) -> &str {
        match self {
            TriePath::Name(name) | TriePath::InChannel(_, name) => name,
        }
    }

    pub fn channel_id(&self) -> Option<&ClaimId> {
        match self {
            TriePath::Name(_) => None,
            TriePath::InChannel(channel_id, _) => Some(channel_id),
        }
    }
}

impl fmt::Display for TriePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriePath::Name(name) => f.write_str(name),
            TriePath::InChannel(channel_id, name) => write!(f, "{}/{}", channel_id, name),
        }
    }
}
