// Channel/Certificate Linker - signing channel lookups for content claims

use crate::claim::{Claim, ClaimStore};

/// Resolves a claim's `channel_id` back-reference to a live channel
pub struct CertificateLinker<'a> {
    store: &'a ClaimStore,
}

impl<'a> CertificateLinker<'a> {
    pub fn new(store: &'a ClaimStore) -> Self {
        Self { store }
    }

    /// The channel that signs `claim`, if it is still an active channel.
    /// A dangling or abandoned reference yields no certificate.
    pub fn certificate_for(&self, claim: &Claim) -> Option<&'a Claim> {
        let channel_id = claim.channel_id()?;
        self.store
            .get_active(channel_id)
            .filter(|channel| channel.is_channel())
    }
}
