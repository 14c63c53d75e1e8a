// Normalizer - turns observed chain activity into the canonical update stream
//
// Pending transactions are forwarded at height 0. When a block arrives its
// events are ordered by position in the block. Outputs already forwarded as
// pending collapse into one `Confirmed` per transaction, any other output is
// forwarded at the block height, and the block closes with a `Tip`.

use crate::event::builder::EventError;
use crate::event::{ChainUpdate, LedgerEvent, Outpoint};
use std::collections::HashSet;
use tracing::debug;

/// A ledger event together with its transaction's position in the block
#[derive(Clone, Debug)]
pub struct BlockEntry {
    pub position: u32,
    pub event: LedgerEvent,
}

impl BlockEntry {
    pub fn new(position: u32, event: LedgerEvent) -> Self {
        Self { position, event }
    }
}

/// Stateful normalizer for one chain
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    /// Outputs seen in the mempool that are not in a block yet
    pending: HashSet<Outpoint>,
    /// Last block height processed
    last_height: u64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after an already-processed height (e.g. when resuming from a store)
    pub fn starting_at(height: u64) -> Self {
        Self {
            pending: HashSet::new(),
            last_height: height,
        }
    }

    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// A transaction observed before block inclusion
    pub fn pending(&mut self, event: LedgerEvent) -> ChainUpdate {
        self.pending.insert(*event.outpoint());
        ChainUpdate::Event(event.at_height(0))
    }

    /// A block at `height` containing `entries`, in any order
    pub fn block(&mut self, height: u64, mut entries: Vec<BlockEntry>) -> Result<Vec<ChainUpdate>, EventError> {
        if height <= self.last_height {
            return Err(EventError::OutOfOrderBlock {
                height,
                last: self.last_height,
            });
        }

        entries.sort_by_key(|e| (e.position, e.event.outpoint().nout));

        let mut updates = Vec::with_capacity(entries.len() + 1);
        let mut confirmed = HashSet::new();
        for entry in entries {
            let outpoint = *entry.event.outpoint();
            if self.pending.remove(&outpoint) {
                if confirmed.insert(outpoint.txid) {
                    updates.push(ChainUpdate::Confirmed {
                        txid: outpoint.txid,
                        height,
                    });
                }
            } else {
                updates.push(ChainUpdate::Event(entry.event.at_height(height)));
            }
        }
        // The whole transaction is mined now
        self.pending.retain(|op| !confirmed.contains(&op.txid));

        updates.push(ChainUpdate::Tip { height });
        self.last_height = height;
        debug!(height, updates = updates.len(), "normalized block");

        Ok(updates)
    }

    /// Blocks with no registry activity still advance the tip
    pub fn empty_blocks(&mut self, count: u64) -> Vec<ChainUpdate> {
        (0..count)
            .map(|_| {
                self.last_height += 1;
                ChainUpdate::Tip {
                    height: self.last_height,
                }
            })
            .collect()
    }
}
