// Multi-denomination purse, used for account balances and escrow buckets

use crate::coin::{Amount, CoinError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Balances keyed by denomination. Zero entries are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(BTreeMap<String, u64>);

impl Coins {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Quantity held in the given denomination
    pub fn amount_of(&self, denom: &str) -> u64 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn has_at_least(&self, amount: &Amount) -> bool {
        self.amount_of(amount.denom()) >= amount.quantity()
    }

    /// Add an amount. Leaves the purse unchanged on overflow.
    pub fn checked_credit(&mut self, amount: &Amount) -> Result<(), CoinError> {
        if amount.is_zero() {
            return Ok(());
        }
        let current = self.amount_of(amount.denom());
        let updated = current
            .checked_add(amount.quantity())
            .ok_or(CoinError::Overflow)?;
        self.0.insert(amount.denom().to_string(), updated);
        Ok(())
    }

    /// Remove an amount. Leaves the purse unchanged on underflow.
    pub fn checked_debit(&mut self, amount: &Amount) -> Result<(), CoinError> {
        let current = self.amount_of(amount.denom());
        let updated = current
            .checked_sub(amount.quantity())
            .ok_or(CoinError::Underflow {
                available: current,
                required: amount.quantity(),
            })?;
        if updated == 0 {
            self.0.remove(amount.denom());
        } else {
            self.0.insert(amount.denom().to_string(), updated);
        }
        Ok(())
    }

    /// Iterate over held amounts in denomination order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(denom, qty)| (denom.as_str(), *qty))
    }
}

impl From<Amount> for Coins {
    fn from(amount: Amount) -> Self {
        let mut coins = Coins::new();
        if !amount.is_zero() {
            coins.0.insert(amount.denom().to_string(), amount.quantity());
        }
        coins
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(empty)");
        }
        let parts: Vec<String> = self.0.iter().map(|(d, q)| format!("{q}{d}")).collect();
        write!(f, "{}", parts.join(","))
    }
}
