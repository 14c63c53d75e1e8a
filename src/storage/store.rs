// RegistryStore - Persistent key-value storage using sled
//
// Holds:
// - The append-only update log, keyed by big-endian sequence number
// - The next log sequence number
// - An optional registry snapshot

use crate::config::RegistryConfig;
use crate::event::{ChainUpdate, UpdateCodec};
use crate::registry::{Registry, RegistryError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

mod keys {
    pub const LOG_PREFIX: &[u8] = b"log:";
    pub const NEXT_SEQ: &[u8] = b"meta:next_seq";
    pub const SNAPSHOT: &[u8] = b"snapshot:registry";
    pub const SNAPSHOT_SEQ: &[u8] = b"snapshot:seq";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Replay failed: {0}")]
    ReplayFailed(#[from] RegistryError),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of entries in the update log
    pub log_entries: u64,
    /// Whether a registry snapshot is stored
    pub has_snapshot: bool,
    pub disk_size_bytes: u64,
}

/// Update log and snapshots of one registry, in a sled tree.
/// Each append or snapshot is one atomic batch; `flush` makes it durable.
pub struct RegistryStore {
    db: sled::Db,
}

impl RegistryStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Log length, snapshot presence and size on disk
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            log_entries: self.next_seq()?,
            has_snapshot: self.db.contains_key(keys::SNAPSHOT)?,
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // UPDATE LOG
    // ========================================================================

    /// Sequence number the next appended update will get
    pub fn next_seq(&self) -> Result<u64, StoreError> {
        match self.db.get(keys::NEXT_SEQ)? {
            Some(bytes) => decode_seq(&bytes),
            None => Ok(0),
        }
    }

    /// Append an update to the log. Returns its sequence number.
    pub fn append(&self, update: &ChainUpdate) -> Result<u64, StoreError> {
        let seq = self.next_seq()?;
        let bytes = UpdateCodec::encode(update).map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let mut batch = sled::Batch::default();
        batch.insert(log_key(seq), bytes);
        batch.insert(keys::NEXT_SEQ, (seq + 1).to_be_bytes().to_vec());
        self.db.apply_batch(batch)?;
        Ok(seq)
    }

    /// Every logged update with sequence number >= `from`, in order
    pub fn load_log_from(&self, from: u64) -> Result<Vec<ChainUpdate>, StoreError> {
        let mut updates = Vec::new();
        for result in self.db.range(log_key(from)..log_key(u64::MAX)) {
            let (_, value) = result?;
            let update = UpdateCodec::decode(&value).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            updates.push(update);
        }
        Ok(updates)
    }

    /// The whole update log, in order
    pub fn load_log(&self) -> Result<Vec<ChainUpdate>, StoreError> {
        self.load_log_from(0)
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// Save a registry snapshot covering every update logged so far
    pub fn save_snapshot(&self, registry: &Registry) -> Result<(), StoreError> {
        let bytes = registry.to_bytes()?;
        let seq = self.next_seq()?;

        let mut batch = sled::Batch::default();
        batch.insert(keys::SNAPSHOT, bytes);
        batch.insert(keys::SNAPSHOT_SEQ, seq.to_be_bytes().to_vec());
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Load the stored snapshot, with derived indexes rebuilt
    pub fn load_snapshot(&self, config: RegistryConfig) -> Result<Option<Registry>, StoreError> {
        match self.db.get(keys::SNAPSHOT)? {
            Some(bytes) => {
                let registry = Registry::from_bytes(&bytes, config)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(registry))
            }
            None => Ok(None),
        }
    }

    /// Restore the registry: latest snapshot plus the log written after it,
    /// or a full replay of the log when there is no snapshot
    pub fn restore(&self, config: RegistryConfig) -> Result<Registry, StoreError> {
        let snapshot_seq = match self.db.get(keys::SNAPSHOT_SEQ)? {
            Some(bytes) => Some(decode_seq(&bytes)?),
            None => None,
        };

        match (snapshot_seq, self.load_snapshot(config.clone())?) {
            (Some(seq), Some(mut registry)) => {
                let tail = self.load_log_from(seq)?;
                let count = tail.len();
                for update in tail {
                    registry.apply(update)?;
                }
                info!(snapshot_seq = seq, replayed = count, "Restored registry from snapshot");
                Ok(registry)
            }
            _ => self.rebuild(config),
        }
    }

    /// Rebuild the registry from the full update log, ignoring any snapshot
    pub fn rebuild(&self, config: RegistryConfig) -> Result<Registry, StoreError> {
        Ok(Registry::replay(config, self.load_log()?)?)
    }
}

fn log_key(seq: u64) -> Vec<u8> {
    [keys::LOG_PREFIX, &seq.to_be_bytes()[..]].concat()
}

fn decode_seq(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::DeserializationFailed("Invalid sequence number length".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}
