use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest accepted denomination string
pub const MAX_DENOM_LEN: usize = 16;

/// Errors from amount construction and arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Invalid denomination: {0:?}")]
    InvalidDenomination(String),

    #[error("Denomination mismatch: {left} vs {right}")]
    DenominationMismatch { left: String, right: String },

    #[error("Amount overflow")]
    Overflow,

    #[error("Amount underflow: have {available}, need {required}")]
    Underflow { available: u64, required: u64 },

    #[error("Cannot parse amount: {0}")]
    Parse(String),
}

/// A quantity of a single currency denomination
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    denom: String,
    quantity: u64,
}

impl Amount {
    /// Create an amount, validating the denomination
    pub fn new(denom: impl Into<String>, quantity: u64) -> Result<Self, CoinError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self { denom, quantity })
    }

    /// The zero amount of a denomination
    pub fn zero(denom: impl Into<String>) -> Result<Self, CoinError> {
        Self::new(denom, 0)
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn is_zero(&self) -> bool {
        self.quantity == 0
    }

    /// Re-check the denomination (used after deserializing untrusted bytes)
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }

    /// Check that both amounts share a denomination
    pub fn same_denom(&self, other: &Amount) -> Result<(), CoinError> {
        if self.denom != other.denom {
            return Err(CoinError::DenominationMismatch {
                left: self.denom.clone(),
                right: other.denom.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, CoinError> {
        self.same_denom(other)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(CoinError::Overflow)?;
        Ok(Amount { denom: self.denom.clone(), quantity })
    }

    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, CoinError> {
        self.same_denom(other)?;
        let quantity = self
            .quantity
            .checked_sub(other.quantity)
            .ok_or(CoinError::Underflow {
                available: self.quantity,
                required: other.quantity,
            })?;
        Ok(Amount { denom: self.denom.clone(), quantity })
    }

    /// Compare two amounts of the same denomination
    pub fn checked_cmp(&self, other: &Amount) -> Result<std::cmp::Ordering, CoinError> {
        self.same_denom(other)?;
        Ok(self.quantity.cmp(&other.quantity))
    }
}

fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let valid = !denom.is_empty()
        && denom.len() <= MAX_DENOM_LEN
        && denom.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(CoinError::InvalidDenomination(denom.to_string()));
    }
    Ok(())
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quantity, self.denom)
    }
}

/// Parses `<quantity><denomination>`, e.g. `100USD`
impl FromStr for Amount {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinError::Parse(format!("missing denomination in {s:?}")))?;
        if split == 0 {
            return Err(CoinError::Parse(format!("missing quantity in {s:?}")));
        }
        let (digits, denom) = s.split_at(split);
        let quantity = digits
            .parse::<u64>()
            .map_err(|e| CoinError::Parse(e.to_string()))?;
        Amount::new(denom, quantity)
    }
}
