// Storage module - PERSISTENCE
// Lays the ledger out in sled, one record per key

mod store;

pub use store::{keys, LedgerStore, StorageStats, StoreError};
