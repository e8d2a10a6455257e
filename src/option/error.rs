use crate::coin::{Amount, CoinError};
use crate::escrow::EscrowError;
use crate::identity::Address;
use crate::option::{ActionKind, CodecError, OptionAddress, OptionState};
use thiserror::Error;

/// Why an option action was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: {account} holds {available}{}, needs {required}", required.denom())]
    InsufficientFunds {
        account: String,
        required: Amount,
        available: u64,
    },

    #[error("No option contract at {0}")]
    NotFound(OptionAddress),

    #[error("Unauthorized: {caller} may not {action} this option")]
    Unauthorized { caller: Address, action: ActionKind },

    #[error("Cannot {action} an option in state {state}")]
    InvalidStateTransition { state: OptionState, action: ActionKind },

    #[error("Option expired: height {height} >= expiration {expiration}")]
    Expired { height: u64, expiration: u64 },

    #[error("Option cannot be dissolved before expiration {expiration} while {state} (height {height})")]
    NotYetEligibleForDissolve {
        state: OptionState,
        height: u64,
        expiration: u64,
    },

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(#[from] CodecError),
}

impl From<CoinError> for OptionError {
    fn from(err: CoinError) -> Self {
        OptionError::InvalidAmount(err.to_string())
    }
}

impl From<EscrowError> for OptionError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::InsufficientFunds {
                holder,
                available,
                required,
            } => OptionError::InsufficientFunds {
                account: holder,
                required,
                available,
            },
            EscrowError::InvalidAmount(e) => OptionError::InvalidAmount(e.to_string()),
        }
    }
}
