// Feed loop - drains an EventSource into the shared registry
//
// Rejected events are logged and skipped; only storage failures stop the loop.
// An update is appended to the log only after the registry accepted it, so the
// log always replays cleanly.

use crate::event::EventSource;
use crate::registry::shared::SharedRegistry;
use crate::storage::{RegistryStore, StoreError};
use serde::Serialize;
use tracing::{info, warn};

/// Counters from one feed run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub applied: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub persisted: usize,
}

/// Apply every update from `source` until it is exhausted
pub async fn run_feed<S: EventSource + ?Sized>(
    source: &mut S,
    registry: &SharedRegistry,
    store: Option<&RegistryStore>,
) -> Result<FeedStats, StoreError> {
    let mut stats = FeedStats::default();

    while let Some(update) = source.next_update().await {
        let label = update.label();
        match registry.apply(update.clone()) {
            Ok(outcome) if outcome.is_duplicate() => stats.duplicates += 1,
            Ok(_) => {
                stats.applied += 1;
                if let Some(store) = store {
                    store.append(&update)?;
                    stats.persisted += 1;
                }
            }
            Err(err) => {
                stats.rejected += 1;
                warn!(kind = label, error = %err, "Rejected update");
            }
        }
    }

    if let Some(store) = store {
        store.flush()?;
    }
    info!(
        applied = stats.applied,
        duplicates = stats.duplicates,
        rejected = stats.rejected,
        "Feed drained"
    );
    Ok(stats)
}
