// Host module - transaction envelope, authentication and the local ledger node

mod node;
mod tx;

pub use node::{Host, HostConfig, HostError};
pub use tx::{AppTx, SignedTx, OPTIONS_APP};
