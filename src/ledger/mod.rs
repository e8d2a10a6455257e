// Ledger module - the state store, the block height oracle and the applier

mod applier;
mod oracle;
mod state;

pub use applier::{Applier, Receipt, Rejection};
pub use oracle::{BlockClock, HeightOracle, OracleError};
pub use state::{LedgerState, LedgerStatistics};
