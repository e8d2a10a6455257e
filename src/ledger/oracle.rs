use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Block height cannot go backwards: current {current}, requested {requested}")]
    Regression { current: u64, requested: u64 },

    #[error("Block height overflow")]
    Overflow,
}

/// Source of the current block height for expiration checks
pub trait HeightOracle {
    fn current_height(&self) -> u64;
}

/// Monotonic block height, advanced by the host between action applications
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockClock {
    height: u64,
}

impl BlockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(height: u64) -> Self {
        Self { height }
    }

    /// Move forward by `blocks`, returning the new height
    pub fn advance(&mut self, blocks: u64) -> Result<u64, OracleError> {
        self.height = self.height.checked_add(blocks).ok_or(OracleError::Overflow)?;
        Ok(self.height)
    }

    /// Jump to `height`; staying put is allowed, going back is not
    pub fn advance_to(&mut self, height: u64) -> Result<u64, OracleError> {
        if height < self.height {
            return Err(OracleError::Regression {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(self.height)
    }
}

impl HeightOracle for BlockClock {
    fn current_height(&self) -> u64 {
        self.height
    }
}
