// The five actions that drive an option contract

use crate::coin::Amount;
use crate::identity::Address;
use crate::option::OptionAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lock `trade` in escrow under a new contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOption {
    pub trade: Amount,
    pub expiration_height: u64,
}

/// Offer the contract for `price`, optionally to a single buyer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOption {
    pub option: OptionAddress,
    pub price: Amount,
    pub restricted_buyer: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOption {
    pub option: OptionAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseOption {
    pub option: OptionAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DissolveOption {
    pub option: OptionAddress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Create(CreateOption),
    Sell(SellOption),
    Buy(BuyOption),
    Exercise(ExerciseOption),
    Dissolve(DissolveOption),
}

impl Action {
    pub fn create(trade: Amount, expiration_height: u64) -> Self {
        Action::Create(CreateOption { trade, expiration_height })
    }

    pub fn sell(option: OptionAddress, price: Amount, restricted_buyer: Option<Address>) -> Self {
        Action::Sell(SellOption { option, price, restricted_buyer })
    }

    pub fn buy(option: OptionAddress) -> Self {
        Action::Buy(BuyOption { option })
    }

    pub fn exercise(option: OptionAddress) -> Self {
        Action::Exercise(ExerciseOption { option })
    }

    pub fn dissolve(option: OptionAddress) -> Self {
        Action::Dissolve(DissolveOption { option })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create(_) => ActionKind::Create,
            Action::Sell(_) => ActionKind::Sell,
            Action::Buy(_) => ActionKind::Buy,
            Action::Exercise(_) => ActionKind::Exercise,
            Action::Dissolve(_) => ActionKind::Dissolve,
        }
    }

    /// The contract an action operates on; `None` for Create
    pub fn target(&self) -> Option<&OptionAddress> {
        match self {
            Action::Create(_) => None,
            Action::Sell(sell) => Some(&sell.option),
            Action::Buy(buy) => Some(&buy.option),
            Action::Exercise(exercise) => Some(&exercise.option),
            Action::Dissolve(dissolve) => Some(&dissolve.option),
        }
    }
}

/// Action discriminant, also the wire type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Create,
    Sell,
    Buy,
    Exercise,
    Dissolve,
}

impl ActionKind {
    pub fn tag(&self) -> u8 {
        match self {
            ActionKind::Create => 0x01,
            ActionKind::Sell => 0x02,
            ActionKind::Buy => 0x03,
            ActionKind::Exercise => 0x04,
            ActionKind::Dissolve => 0x05,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(ActionKind::Create),
            0x02 => Some(ActionKind::Sell),
            0x03 => Some(ActionKind::Buy),
            0x04 => Some(ActionKind::Exercise),
            0x05 => Some(ActionKind::Dissolve),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Create => "create",
            ActionKind::Sell => "sell",
            ActionKind::Buy => "buy",
            ActionKind::Exercise => "exercise",
            ActionKind::Dissolve => "dissolve",
        };
        f.write_str(name)
    }
}
