// Coin module - denominated amounts and multi-denomination purses

mod amount;
mod coins;

pub use amount::{Amount, CoinError, MAX_DENOM_LEN};
pub use coins::Coins;
