// Host - a single-node ledger that authenticates, sequences and applies transactions

use crate::coin::Amount;
use crate::escrow::{EscrowError, Movement};
use crate::host::{SignedTx, OPTIONS_APP};
use crate::identity::Address;
use crate::ledger::{Applier, LedgerState, OracleError, Receipt, Rejection};
use crate::option::{OptionAddress, OptionRecord};
use crate::storage::keys;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Cannot decode transaction: {0}")]
    Decode(String),

    #[error("Invalid signature from {0}")]
    InvalidSignature(Address),

    #[error("Bad sequence for {account}: expected {expected}, got {got}")]
    BadSequence { account: Address, expected: u64, got: u64 },

    #[error("Unknown application: {0:?}")]
    UnknownApp(String),

    #[error("Rejected: {0}")]
    Rejected(#[source] Rejection),

    #[error("Funding failed: {0}")]
    Funding(#[from] EscrowError),

    #[error("Block height error: {0}")]
    Height(#[from] OracleError),

    #[error("Nothing stored under key {0}")]
    NotFound(String),
}

/// Host tunables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    /// Blocks the chain advances after each processed transaction
    pub blocks_per_tx: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { blocks_per_tx: 1 }
    }
}

pub struct Host {
    config: HostConfig,
    ledger: LedgerState,
    /// Account -> last accepted transaction sequence
    sequences: BTreeMap<Address, u64>,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        Self::from_parts(config, LedgerState::new(), BTreeMap::new())
    }

    pub fn from_parts(config: HostConfig, ledger: LedgerState, sequences: BTreeMap<Address, u64>) -> Self {
        Self {
            config,
            ledger,
            sequences,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn height(&self) -> u64 {
        self.ledger.height()
    }

    /// Last accepted sequence of an account (0 if it never submitted)
    pub fn sequence(&self, account: &Address) -> u64 {
        self.sequences.get(account).copied().unwrap_or(0)
    }

    /// Sequence the account's next transaction must carry
    pub fn next_sequence(&self, account: &Address) -> u64 {
        self.sequence(account) + 1
    }

    pub fn sequences(&self) -> &BTreeMap<Address, u64> {
        &self.sequences
    }

    // ========================================================================
    // WRITE PATH
    // ========================================================================

    /// Authenticate, sequence and apply one transaction.
    ///
    /// Authentication, sequence and block height failures leave the host untouched. A
    /// transaction that authenticates but is rejected by the application still
    /// consumes its sequence number and a block.
    pub fn submit(&mut self, tx: &SignedTx) -> Result<Receipt, HostError> {
        let caller = tx.caller();

        if !tx.verify() {
            warn!(%caller, "dropping tx with invalid signature");
            return Err(HostError::InvalidSignature(caller));
        }

        let expected = self.next_sequence(&caller);
        if tx.sequence() != expected {
            warn!(%caller, expected, got = tx.sequence(), "dropping tx with bad sequence");
            return Err(HostError::BadSequence {
                account: caller,
                expected,
                got: tx.sequence(),
            });
        }

        let app = tx.app_tx().app();
        if app != OPTIONS_APP {
            return Err(HostError::UnknownApp(app.to_string()));
        }

        // The block must be closable before anything is applied
        let mut next_block = *self.ledger.clock();
        next_block.advance(self.config.blocks_per_tx)?;

        // From here on the transaction is part of the chain
        self.sequences.insert(caller, tx.sequence());
        let result = Applier::apply_bytes(&mut self.ledger, &caller, tx.app_tx().data());
        *self.ledger.clock_mut() = next_block;

        match result {
            Ok(receipt) => {
                info!(
                    %caller,
                    option = %receipt.option,
                    action = %receipt.action,
                    height = receipt.height,
                    "committed option tx"
                );
                Ok(receipt)
            }
            Err(rejection) => Err(HostError::Rejected(rejection)),
        }
    }

    /// Decode a postcard-encoded `SignedTx` and submit it
    pub fn submit_bytes(&mut self, bytes: &[u8]) -> Result<Receipt, HostError> {
        let tx = SignedTx::from_bytes(bytes).map_err(|e| HostError::Decode(e.to_string()))?;
        self.submit(&tx)
    }

    /// Genesis allocation: mint funds into an account
    pub fn fund(&mut self, account: &Address, amount: &Amount) -> Result<Movement, HostError> {
        let movement = self.ledger.escrow_mut().credit(account, amount)?;
        info!(%account, %amount, "funded account");
        Ok(movement)
    }

    /// Advance the chain by `blocks` without applying anything
    pub fn advance(&mut self, blocks: u64) -> Result<u64, HostError> {
        Ok(self.ledger.clock_mut().advance(blocks)?)
    }

    pub fn advance_to(&mut self, height: u64) -> Result<u64, HostError> {
        Ok(self.ledger.clock_mut().advance_to(height)?)
    }

    // ========================================================================
    // READ PATH
    // ========================================================================

    pub fn query_option(&self, address: &OptionAddress) -> Result<&OptionRecord, HostError> {
        self.ledger
            .option(address)
            .ok_or_else(|| HostError::NotFound(address.to_string()))
    }

    /// Raw key lookup over the persisted layout: `options/`, `escrow/` and
    /// `accounts/` followed by the 20 address bytes.
    pub fn query(&self, key: &[u8]) -> Result<Vec<u8>, HostError> {
        let not_found = || HostError::NotFound(hex::encode(key));

        if let Some(address) = keys::strip_address(key, keys::OPTIONS_PREFIX) {
            let address = OptionAddress::from_bytes(address);
            return self
                .ledger
                .option(&address)
                .map(|r| r.to_bytes())
                .ok_or_else(not_found);
        }
        if let Some(address) = keys::strip_address(key, keys::ESCROW_PREFIX) {
            let bucket = self.ledger.escrow().bucket(&OptionAddress::from_bytes(address));
            if bucket.is_empty() {
                return Err(not_found());
            }
            return Ok(postcard::to_allocvec(&bucket).unwrap_or_default());
        }
        if let Some(address) = keys::strip_address(key, keys::ACCOUNTS_PREFIX) {
            let balance = self.ledger.escrow().balance(&Address::from_bytes(address));
            if balance.is_empty() {
                return Err(not_found());
            }
            return Ok(postcard::to_allocvec(&balance).unwrap_or_default());
        }

        Err(not_found())
    }

    /// Give up the host, returning its parts for persistence
    pub fn into_parts(self) -> (LedgerState, BTreeMap<Address, u64>) {
        (self.ledger, self.sequences)
    }
}
