use crate::coin::Amount;
use crate::identity::Address;
use crate::option::OptionAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A completed fund movement, reported back to the submitter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    Minted {
        to: Address,
        amount: Amount,
    },
    Locked {
        from: Address,
        contract: OptionAddress,
        amount: Amount,
    },
    Released {
        contract: OptionAddress,
        to: Address,
        amount: Amount,
    },
    Paid {
        from: Address,
        to: Address,
        amount: Amount,
    },
}

impl Movement {
    pub fn amount(&self) -> &Amount {
        match self {
            Movement::Minted { amount, .. }
            | Movement::Locked { amount, .. }
            | Movement::Released { amount, .. }
            | Movement::Paid { amount, .. } => amount,
        }
    }

    /// Whether the movement debits or credits a contract bucket
    pub fn touches_escrow(&self) -> bool {
        matches!(self, Movement::Locked { .. } | Movement::Released { .. })
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Movement::Minted { to, amount } => write!(f, "minted {amount} to {to}"),
            Movement::Locked { from, contract, amount } => {
                write!(f, "locked {amount} from {from} under {contract}")
            }
            Movement::Released { contract, to, amount } => {
                write!(f, "released {amount} from {contract} to {to}")
            }
            Movement::Paid { from, to, amount } => write!(f, "paid {amount} from {from} to {to}"),
        }
    }
}
