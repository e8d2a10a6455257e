// Identity module - account keys, addresses and transaction signatures

mod address;
mod keypair;
mod signer;

pub use address::{strip_hex, Address, AddressError, ADDRESS_LEN};
pub(crate) use address::parse_hex_20;
pub use keypair::{Keypair, KeypairError, PublicKey};
pub use signer::{Signature, SignatureError, Signer};
