// Escrow module - custody of account funds and per-contract locked funds

mod ledger;
mod movement;

pub use ledger::{EscrowError, EscrowLedger};
pub use movement::Movement;
