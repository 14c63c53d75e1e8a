// Event sources - where the ordered update stream comes from
//
// The registry core never waits on I/O; only sources suspend.

use crate::event::ChainUpdate;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// A stream of chain updates in canonical order
#[async_trait]
pub trait EventSource: Send {
    /// Next update, or `None` once the source is exhausted
    async fn next_update(&mut self) -> Option<ChainUpdate>;
}

/// Source fed through a tokio channel by an external adapter task
pub struct ChannelSource {
    rx: mpsc::Receiver<ChainUpdate>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn new(buffer: usize) -> (mpsc::Sender<ChainUpdate>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_update(&mut self) -> Option<ChainUpdate> {
        self.rx.recv().await
    }
}

/// Source over an in-memory list, used for replay
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    updates: VecDeque<ChainUpdate>,
}

impl ReplaySource {
    pub fn new(updates: impl IntoIterator<Item = ChainUpdate>) -> Self {
        Self {
            updates: updates.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.updates.len()
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    async fn next_update(&mut self) -> Option<ChainUpdate> {
        self.updates.pop_front()
    }
}
