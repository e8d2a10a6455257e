// Escrow ledger - account balances plus one escrow bucket per option contract

use crate::coin::{Amount, CoinError, Coins};
use crate::escrow::Movement;
use crate::identity::Address;
use crate::option::OptionAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during escrow operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Insufficient funds in {holder}: available {available}, required {required}")]
    InsufficientFunds {
        holder: String,
        available: u64,
        required: Amount,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] CoinError),
}

/// Custody of all funds: spendable account purses and locked contract buckets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowLedger {
    accounts: BTreeMap<Address, Coins>,
    buckets: BTreeMap<OptionAddress, Coins>,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted purses
    pub fn from_parts(
        accounts: BTreeMap<Address, Coins>,
        buckets: BTreeMap<OptionAddress, Coins>,
    ) -> Self {
        Self { accounts, buckets }
    }

    // ========================================================================
    // BALANCE QUERIES
    // ========================================================================

    /// Full purse of an account (empty if unknown)
    pub fn balance(&self, account: &Address) -> Coins {
        self.accounts.get(account).cloned().unwrap_or_default()
    }

    pub fn amount_of(&self, account: &Address, denom: &str) -> u64 {
        self.accounts.get(account).map_or(0, |c| c.amount_of(denom))
    }

    /// Funds locked under a contract (empty once released)
    pub fn bucket(&self, contract: &OptionAddress) -> Coins {
        self.buckets.get(contract).cloned().unwrap_or_default()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Coins)> {
        self.accounts.iter()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&OptionAddress, &Coins)> {
        self.buckets.iter()
    }

    /// Total of a denomination across every account and bucket
    pub fn total_supply(&self, denom: &str) -> u128 {
        self.accounts
            .values()
            .chain(self.buckets.values())
            .map(|c| c.amount_of(denom) as u128)
            .sum()
    }

    // ========================================================================
    // FUND MOVEMENTS
    // ========================================================================

    /// Mint funds into an account (genesis allocation / faucet)
    pub fn credit(&mut self, account: &Address, amount: &Amount) -> Result<Movement, EscrowError> {
        amount.validate()?;
        let mut target = self.balance(account);
        target.checked_credit(amount)?;
        store(&mut self.accounts, *account, target);
        Ok(Movement::Minted {
            to: *account,
            amount: amount.clone(),
        })
    }

    /// Debit `account` and credit the contract's bucket
    pub fn lock(
        &mut self,
        account: &Address,
        amount: &Amount,
        contract: &OptionAddress,
    ) -> Result<Movement, EscrowError> {
        amount.validate()?;
        let mut source = self.balance(account);
        let mut bucket = self.bucket(contract);
        debit(&mut source, amount, account.to_string())?;
        bucket.checked_credit(amount)?;

        store(&mut self.accounts, *account, source);
        store(&mut self.buckets, *contract, bucket);
        Ok(Movement::Locked {
            from: *account,
            contract: *contract,
            amount: amount.clone(),
        })
    }

    /// Debit the contract's bucket and credit `to`
    pub fn release(
        &mut self,
        contract: &OptionAddress,
        amount: &Amount,
        to: &Address,
    ) -> Result<Movement, EscrowError> {
        amount.validate()?;
        let mut bucket = self.bucket(contract);
        let mut target = self.balance(to);
        debit(&mut bucket, amount, contract.to_string())?;
        target.checked_credit(amount)?;

        store(&mut self.buckets, *contract, bucket);
        store(&mut self.accounts, *to, target);
        Ok(Movement::Released {
            contract: *contract,
            to: *to,
            amount: amount.clone(),
        })
    }

    /// Move funds between accounts without touching any bucket
    pub fn transfer_direct(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> Result<Movement, EscrowError> {
        amount.validate()?;
        let mut source = self.balance(from);
        debit(&mut source, amount, from.to_string())?;

        if from == to {
            // Net effect is nothing, but the payer still had to be able to cover it
            return Ok(Movement::Paid {
                from: *from,
                to: *to,
                amount: amount.clone(),
            });
        }

        let mut target = self.balance(to);
        target.checked_credit(amount)?;

        store(&mut self.accounts, *from, source);
        store(&mut self.accounts, *to, target);
        Ok(Movement::Paid {
            from: *from,
            to: *to,
            amount: amount.clone(),
        })
    }
}

// Work on copies and write back only once every step has succeeded
fn debit(purse: &mut Coins, amount: &Amount, holder: String) -> Result<(), EscrowError> {
    purse.checked_debit(amount).map_err(|e| match e {
        CoinError::Underflow { available, .. } => EscrowError::InsufficientFunds {
            holder,
            available,
            required: amount.clone(),
        },
        other => EscrowError::InvalidAmount(other),
    })
}

fn store<K: Ord>(map: &mut BTreeMap<K, Coins>, key: K, coins: Coins) {
    if coins.is_empty() {
        map.remove(&key);
    } else {
        map.insert(key, coins);
    }
}
