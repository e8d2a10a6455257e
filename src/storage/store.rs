// LedgerStore - Persistent key-value storage using sled
//
// Lays ledger state out one record per key:
// - option records and escrow buckets keyed by contract address
// - account balances and sequences keyed by account address
// - chain height and the local signing keypair

use crate::coin::Coins;
use crate::escrow::EscrowLedger;
use crate::identity::{Address, Keypair, ADDRESS_LEN};
use crate::ledger::{BlockClock, LedgerState};
use crate::option::{OptionAddress, OptionRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Key prefixes and builders for the persisted layout
pub mod keys {
    use super::ADDRESS_LEN;

    pub const OPTIONS_PREFIX: &[u8] = b"options/";
    pub const ESCROW_PREFIX: &[u8] = b"escrow/";
    pub const ACCOUNTS_PREFIX: &[u8] = b"accounts/";
    pub const SEQUENCE_PREFIX: &[u8] = b"sequence/";
    pub const CREATE_SEQUENCE_PREFIX: &[u8] = b"seq-create/";
    pub const CHAIN_HEIGHT: &[u8] = b"chain:height";
    pub const IDENTITY_KEYPAIR: &[u8] = b"identity:keypair";

    pub fn with_address(prefix: &[u8], address: &[u8; ADDRESS_LEN]) -> Vec<u8> {
        [prefix, address.as_slice()].concat()
    }

    /// Split `prefix || 20 address bytes`, rejecting any other shape
    pub fn strip_address(key: &[u8], prefix: &[u8]) -> Option<[u8; ADDRESS_LEN]> {
        key.strip_prefix(prefix)?.try_into().ok()
    }
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Deserialization failed for key {key}: {reason}")]
    DeserializationFailed { key: String, reason: String },

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    pub key_count: usize,
    pub disk_size_bytes: u64,
}

/// Persistent key-value store for ledger data
///
/// Uses sled for crash-safe, embedded storage. `save_ledger` writes one
/// atomic batch, so a crash never leaves half a transaction on disk.
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref()).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        info!(path = %path.as_ref().display(), "opened ledger store");
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

    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    // ========================================================================
    // LEDGER STATE
    // ========================================================================

    /// Persist the ledger and account sequences in one atomic batch.
    /// Purses that emptied since the last save are removed.
    pub fn save_ledger(&self, ledger: &LedgerState, sequences: &BTreeMap<Address, u64>) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();

        for record in ledger.options() {
            batch.insert(keys::with_address(keys::OPTIONS_PREFIX, record.address().as_bytes()), record.to_bytes());
        }

        for key in self.keys_with_prefix(keys::ESCROW_PREFIX)? {
            batch.remove(key);
        }
        for (contract, coins) in ledger.escrow().buckets() {
            batch.insert(keys::with_address(keys::ESCROW_PREFIX, contract.as_bytes()), encode(coins));
        }

        for key in self.keys_with_prefix(keys::ACCOUNTS_PREFIX)? {
            batch.remove(key);
        }
        for (account, coins) in ledger.escrow().accounts() {
            batch.insert(keys::with_address(keys::ACCOUNTS_PREFIX, account.as_bytes()), encode(coins));
        }

        for (account, sequence) in sequences {
            batch.insert(keys::with_address(keys::SEQUENCE_PREFIX, account.as_bytes()), sequence.to_le_bytes().to_vec());
        }
        for (creator, sequence) in ledger.create_sequences() {
            batch.insert(keys::with_address(keys::CREATE_SEQUENCE_PREFIX, creator.as_bytes()), sequence.to_le_bytes().to_vec());
        }

        batch.insert(keys::CHAIN_HEIGHT, ledger.height().to_le_bytes().to_vec());

        self.db.apply_batch(batch)?;
        debug!(height = ledger.height(), "saved ledger state");
        Ok(())
    }

    /// Load the ledger and account sequences (empty state for a fresh store)
    pub fn load_ledger(&self) -> Result<(LedgerState, BTreeMap<Address, u64>), StoreError> {
        let mut options = BTreeMap::new();
        for (address, bytes) in self.scan_addressed(keys::OPTIONS_PREFIX)? {
            let record = OptionRecord::from_bytes(&bytes).map_err(|e| decode_error(keys::OPTIONS_PREFIX, &address, e))?;
            options.insert(OptionAddress::from_bytes(address), record);
        }

        let mut buckets = BTreeMap::new();
        for (address, bytes) in self.scan_addressed(keys::ESCROW_PREFIX)? {
            let coins: Coins = decode(&bytes).map_err(|e| decode_error(keys::ESCROW_PREFIX, &address, e))?;
            buckets.insert(OptionAddress::from_bytes(address), coins);
        }

        let mut accounts = BTreeMap::new();
        for (address, bytes) in self.scan_addressed(keys::ACCOUNTS_PREFIX)? {
            let coins: Coins = decode(&bytes).map_err(|e| decode_error(keys::ACCOUNTS_PREFIX, &address, e))?;
            accounts.insert(Address::from_bytes(address), coins);
        }

        let sequences = self.scan_counters(keys::SEQUENCE_PREFIX)?;
        let create_sequences = self.scan_counters(keys::CREATE_SEQUENCE_PREFIX)?;

        let height = match self.get_raw(keys::CHAIN_HEIGHT)? {
            Some(bytes) => read_u64(keys::CHAIN_HEIGHT, &bytes)?,
            None => 0,
        };

        let ledger = LedgerState::from_parts(
            options,
            EscrowLedger::from_parts(accounts, buckets),
            BlockClock::at(height),
            create_sequences,
        );
        Ok((ledger, sequences))
    }

    /// Look up one option record directly from disk
    pub fn load_option(&self, address: &OptionAddress) -> Result<Option<OptionRecord>, StoreError> {
        match self.get_raw(&keys::with_address(keys::OPTIONS_PREFIX, address.as_bytes()))? {
            Some(bytes) => OptionRecord::from_bytes(&bytes)
                .map(Some)
                .map_err(|e| decode_error(keys::OPTIONS_PREFIX, address.as_bytes(), e)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // IDENTITY PERSISTENCE
    // ========================================================================

    pub fn save_keypair(&self, keypair: &Keypair) -> Result<(), StoreError> {
        self.db.insert(keys::IDENTITY_KEYPAIR, keypair.to_bytes())?;
        Ok(())
    }

    pub fn load_keypair(&self) -> Result<Option<Keypair>, StoreError> {
        match self.get_raw(keys::IDENTITY_KEYPAIR)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes).map_err(|e| StoreError::DeserializationFailed {
                    key: String::from_utf8_lossy(keys::IDENTITY_KEYPAIR).into_owned(),
                    reason: e.to_string(),
                })?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<sled::IVec>, StoreError> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key);
        }
        Ok(keys)
    }

    fn scan_addressed(&self, prefix: &[u8]) -> Result<Vec<([u8; ADDRESS_LEN], Vec<u8>)>, StoreError> {
        let mut entries = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, value) = result?;
            let address = keys::strip_address(&key, prefix).ok_or_else(|| StoreError::DeserializationFailed {
                key: hex::encode(&key),
                reason: "malformed address key".to_string(),
            })?;
            entries.push((address, value.to_vec()));
        }
        Ok(entries)
    }

    fn scan_counters(&self, prefix: &[u8]) -> Result<BTreeMap<Address, u64>, StoreError> {
        let mut counters = BTreeMap::new();
        for (address, bytes) in self.scan_addressed(prefix)? {
            counters.insert(Address::from_bytes(address), read_u64(prefix, &bytes)?);
        }
        Ok(counters)
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    postcard::to_allocvec(value).unwrap_or_default()
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, postcard::Error> {
    postcard::from_bytes(bytes)
}

fn decode_error(prefix: &[u8], address: &[u8], err: impl std::fmt::Display) -> StoreError {
    StoreError::DeserializationFailed {
        key: format!("{}{}", String::from_utf8_lossy(prefix), hex::encode_upper(address)),
        reason: err.to_string(),
    }
}

fn read_u64(key: &[u8], bytes: &[u8]) -> Result<u64, StoreError> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| StoreError::DeserializationFailed {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: format!("expected 8 bytes, got {}", bytes.len()),
    })?;
    Ok(u64::from_le_bytes(array))
}
