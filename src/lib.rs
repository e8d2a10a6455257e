// optledger - currency-option escrow contracts on a single-node ledger

pub mod coin;
pub mod escrow;
pub mod host;
pub mod identity;
pub mod ledger;
pub mod option;
pub mod storage;
