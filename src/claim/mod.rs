// Claim module - THE RECORDS
// Claim identity, revision history, stakes and their aggregate weight

mod model;
mod stake;
mod store;

pub use model::{Claim, ClaimId, ClaimKind, Revision, Stake, StakeKind};
pub use stake::StakeAggregator;
pub use store::{
    validate_name, AbandonDecision, AbandonOutcome, ClaimError, ClaimStore, PublishDecision,
    PublishOutcome,
};
