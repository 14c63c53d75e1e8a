// Resolution Engine - URI to winning claim, certificate and stakes
//
// Reads the trie, the claim store and the stake totals only. Absence is a
// normal result, reported through the `error` field rather than an Err.

use crate::amount::{self, Amount};
use crate::claim::{Claim, ClaimId, ClaimKind, ClaimStore, StakeAggregator, StakeKind};
use crate::event::{ContentRef, TxId};
use crate::resolve::channel::CertificateLinker;
use crate::resolve::uri::{Segment, Uri, UriError};
use crate::trie::{ClaimTrie, TriePath};
use crate::vault::{confirmations, AccountId};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} did not resolve to a claim")]
    Unresolved(String),

    #[error("Invalid URI {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: UriError,
    },

    #[error("Invalid page request: {0}")]
    InvalidPage(String),
}

/// A support or tip as shown in resolution output
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakeSummary {
    pub kind: StakeKind,
    #[serde(with = "amount::as_coins")]
    pub amount: Amount,
    pub txid: TxId,
    pub nout: u32,
    pub height: u64,
    pub account: AccountId,
}

/// A claim as shown in resolution output
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClaimSummary {
    pub claim_id: ClaimId,
    pub name: String,
    pub kind: ClaimKind,
    pub account: AccountId,
    pub txid: TxId,
    pub nout: u32,
    pub height: u64,
    pub confirmations: u64,
    /// The claim's own deposit
    #[serde(with = "amount::as_coins")]
    pub amount: Amount,
    #[serde(with = "amount::as_coins")]
    pub effective_amount: Amount,
    pub content_ref: ContentRef,
    /// Set only while the signing channel is live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_channel: Option<ClaimId>,
    pub is_abandoned: bool,
    /// Supports and tips in arrival order
    pub supports: Vec<StakeSummary>,
}

/// Result of resolving one URI
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    #[serde(skip)]
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<ClaimSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<ClaimSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims_in_channel: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_contents: Option<Vec<ClaimSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Resolution {
    fn unresolved(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            error: Some(ResolveError::Unresolved(uri.to_string()).to_string()),
            ..Self::default()
        }
    }

    fn failed(uri: &str, err: &ResolveError) -> Self {
        Self {
            uri: uri.to_string(),
            error: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.claim.is_some() || (self.certificate.is_some() && self.claims_in_channel.is_some())
    }

    /// The resolved claim (the channel itself for `@channel` URIs)
    pub fn into_claim(self) -> Result<ClaimSummary, ResolveError> {
        match (self.claim, self.certificate, self.claims_in_channel) {
            (Some(claim), _, _) => Ok(claim),
            (None, Some(channel), Some(_)) => Ok(channel),
            _ => Err(ResolveError::Unresolved(self.uri)),
        }
    }
}

/// One page of a channel's content claims
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelListing {
    pub channel: ClaimSummary,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<ClaimSummary>,
}

/// Read-only view answering resolution queries
pub struct Resolver<'a> {
    store: &'a ClaimStore,
    aggregator: &'a StakeAggregator,
    trie: &'a ClaimTrie,
    linker: CertificateLinker<'a>,
    scheme: &'a str,
    tip_height: u64,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a ClaimStore,
        aggregator: &'a StakeAggregator,
        trie: &'a ClaimTrie,
        scheme: &'a str,
        tip_height: u64,
    ) -> Self {
        Self {
            store,
            aggregator,
            trie,
            linker: CertificateLinker::new(store),
            scheme,
            tip_height,
        }
    }

    pub fn parse(&self, uri: &str) -> Result<Uri, ResolveError> {
        Uri::parse(uri, self.scheme).map_err(|source| ResolveError::InvalidUri {
            uri: uri.to_string(),
            source,
        })
    }

    /// Resolve one URI. Only a malformed URI is an error.
    pub fn resolve(&self, uri: &str) -> Result<Resolution, ResolveError> {
        let parsed = self.parse(uri)?;
        Ok(self.resolve_parsed(uri, &parsed))
    }

    /// Resolve several URIs; malformed ones get an error marker
    pub fn resolve_many<S: AsRef<str>>(&self, uris: &[S]) -> BTreeMap<String, Resolution> {
        uris.iter()
            .map(|uri| {
                let uri = uri.as_ref();
                let resolution = match self.resolve(uri) {
                    Ok(resolution) => resolution,
                    Err(err) => Resolution::failed(uri, &err),
                };
                (uri.to_string(), resolution)
            })
            .collect()
    }

    /// Page through the winning content claims of a channel, by name
    pub fn list_channel(&self, uri: &str, page: usize, page_size: usize) -> Result<ChannelListing, ResolveError> {
        if page == 0 || page_size == 0 {
            return Err(ResolveError::InvalidPage(format!("page {} of size {}", page, page_size)));
        }
        let parsed = self.parse(uri)?;
        let segment = match (parsed.channel(), parsed.content()) {
            (Some(channel), None) => channel,
            _ => {
                return Err(ResolveError::InvalidUri {
                    uri: uri.to_string(),
                    source: UriError::InvalidSegment("expected a channel".to_string()),
                })
            }
        };
        let channel = self
            .select(&TriePath::name(segment.name.clone()), segment)
            .ok_or_else(|| ResolveError::Unresolved(uri.to_string()))?;

        let winners: Vec<&Claim> = self
            .trie
            .channel_names(channel.claim_id())
            .into_iter()
            .filter_map(|name| self.trie.winner_at(&TriePath::in_channel(*channel.claim_id(), name)))
            .filter_map(|id| self.store.get_active(id))
            .collect();

        let total_items = winners.len();
        let total_pages = total_items.div_ceil(page_size);
        let items = winners
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|claim| self.summarize(claim))
            .collect();

        Ok(ChannelListing {
            channel: self.summarize(channel),
            page,
            page_size,
            total_items,
            total_pages,
            items,
        })
    }

    fn resolve_parsed(&self, raw: &str, uri: &Uri) -> Resolution {
        match (uri.channel(), uri.content()) {
            (Some(channel_seg), None) => {
                let Some(channel) = self.select(&TriePath::name(channel_seg.name.clone()), channel_seg) else {
                    return Resolution::unresolved(raw);
                };
                Resolution {
                    uri: raw.to_string(),
                    certificate: Some(self.summarize(channel)),
                    claims_in_channel: Some(self.trie.channel_claim_count(channel.claim_id())),
                    channel_contents: Some(Vec::new()),
                    ..Resolution::default()
                }
            }
            (Some(channel_seg), Some(content_seg)) => {
                let Some(channel) = self.select(&TriePath::name(channel_seg.name.clone()), channel_seg) else {
                    return Resolution::unresolved(raw);
                };
                let path = TriePath::in_channel(*channel.claim_id(), content_seg.name.clone());
                Resolution {
                    uri: raw.to_string(),
                    certificate: Some(self.summarize(channel)),
                    claim: self.select(&path, content_seg).map(|claim| self.summarize(claim)),
                    ..Resolution::default()
                }
            }
            (None, Some(content_seg)) => {
                let Some(claim) = self.select(&TriePath::name(content_seg.name.clone()), content_seg) else {
                    return Resolution::unresolved(raw);
                };
                Resolution {
                    uri: raw.to_string(),
                    certificate: self.linker.certificate_for(claim).map(|cert| self.summarize(cert)),
                    claim: Some(self.summarize(claim)),
                    ..Resolution::default()
                }
            }
            (None, None) => Resolution::unresolved(raw),
        }
    }

    /// The winner at `path`, or the best candidate matching the segment's id prefix
    fn select(&self, path: &TriePath, segment: &Segment) -> Option<&'a Claim> {
        let claim_id = match &segment.claim_id_prefix {
            None => self.trie.winner_at(path).copied(),
            Some(prefix) => self
                .trie
                .candidates(path)
                .into_iter()
                .map(|c| c.claim_id)
                .find(|id| id.matches_prefix(prefix)),
        }?;
        self.store.get_active(&claim_id)
    }

    pub fn summarize(&self, claim: &Claim) -> ClaimSummary {
        let supports = self
            .store
            .stakes(claim.claim_id())
            .iter()
            .map(|stake| StakeSummary {
                kind: stake.kind(),
                amount: stake.amount(),
                txid: stake.outpoint().txid,
                nout: stake.outpoint().nout,
                height: stake.height(),
                account: stake.source_account().clone(),
            })
            .collect();

        ClaimSummary {
            claim_id: *claim.claim_id(),
            name: claim.name().to_string(),
            kind: claim.kind(),
            account: claim.owner().clone(),
            txid: claim.outpoint().txid,
            nout: claim.outpoint().nout,
            height: claim.height(),
            confirmations: confirmations(claim.height(), self.tip_height),
            amount: claim.deposit(),
            effective_amount: self.aggregator.effective_amount(claim),
            content_ref: claim.content_ref().clone(),
            signing_channel: self.linker.certificate_for(claim).map(|cert| *cert.claim_id()),
            is_abandoned: claim.is_abandoned(),
            supports,
        }
    }
}
