use crate::coin::Amount;
use crate::identity::{parse_hex_20, Address, AddressError, ADDRESS_LEN};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Address of an option contract, derived from its creator at creation time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionAddress([u8; ADDRESS_LEN]);

impl OptionAddress {
    /// Derive the address for the `sequence`-th option created by `creator`
    pub fn derive(creator: &Address, sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"option:");
        hasher.update(creator.as_bytes());
        hasher.update(sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[..ADDRESS_LEN]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse a hex contract address; a leading `0x` is accepted
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        parse_hex_20(s).map(Self)
    }
}

impl fmt::Display for OptionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl FromStr for OptionAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lifecycle state of an option contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionState {
    Created,
    Offered,
    Sold,
    Exercised,
    Dissolved,
}

impl OptionState {
    /// Exercised and Dissolved contracts accept no further actions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OptionState::Exercised | OptionState::Dissolved)
    }

    /// Whether the trade amount is still held in escrow
    pub fn holds_escrow(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for OptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionState::Created => "created",
            OptionState::Offered => "offered",
            OptionState::Sold => "sold",
            OptionState::Exercised => "exercised",
            OptionState::Dissolved => "dissolved",
        };
        f.write_str(name)
    }
}

/// Persisted state of one option contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    address: OptionAddress,
    creator: Address,
    holder: Address,
    trade: Amount,
    price: Option<Amount>,
    restricted_buyer: Option<Address>,
    expiration_height: u64,
    created_height: u64,
    state: OptionState,
}

impl OptionRecord {
    /// A freshly created contract: the creator holds it and nothing is on offer
    pub fn new(
        address: OptionAddress,
        creator: Address,
        trade: Amount,
        expiration_height: u64,
        created_height: u64,
    ) -> Self {
        Self {
            address,
            creator,
            holder: creator,
            trade,
            price: None,
            restricted_buyer: None,
            expiration_height,
            created_height,
            state: OptionState::Created,
        }
    }

    pub fn address(&self) -> &OptionAddress {
        &self.address
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    pub fn holder(&self) -> &Address {
        &self.holder
    }

    pub fn trade(&self) -> &Amount {
        &self.trade
    }

    pub fn price(&self) -> Option<&Amount> {
        self.price.as_ref()
    }

    pub fn restricted_buyer(&self) -> Option<&Address> {
        self.restricted_buyer.as_ref()
    }

    pub fn expiration_height(&self) -> u64 {
        self.expiration_height
    }

    pub fn created_height(&self) -> u64 {
        self.created_height
    }

    pub fn state(&self) -> OptionState {
        self.state
    }

    /// Expiration is exclusive: at `height == expiration_height` the option is expired
    pub fn is_expired_at(&self, height: u64) -> bool {
        height >= self.expiration_height
    }

    /// Whether `caller` may buy the current offer (ignores state)
    pub fn buyer_allowed(&self, caller: &Address) -> bool {
        self.restricted_buyer.map_or(true, |buyer| buyer == *caller)
    }

    pub(crate) fn offer(&mut self, price: Amount, restricted_buyer: Option<Address>) {
        self.price = Some(price);
        self.restricted_buyer = restricted_buyer;
        self.state = OptionState::Offered;
    }

    pub(crate) fn sell_to(&mut self, buyer: Address) {
        self.holder = buyer;
        self.state = OptionState::Sold;
    }

    pub(crate) fn mark_exercised(&mut self) {
        self.state = OptionState::Exercised;
    }

    pub(crate) fn mark_dissolved(&mut self) {
        self.state = OptionState::Dissolved;
    }

    /// Serialize to the bytes stored under the contract's key
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
