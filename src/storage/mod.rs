// Storage module - PERSISTENCE
// Update log and registry snapshots in sled

mod store;

pub use store::{RegistryStore, StoreError, StorageStats};
