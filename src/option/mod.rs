// Option module - the option escrow contract: records, actions, codec, state machine

mod action;
mod codec;
mod error;
mod model;
mod validator;

pub use action::{
    Action, ActionKind, BuyOption, CreateOption, DissolveOption, ExerciseOption, SellOption,
};
pub use codec::{ActionCodec, CodecError};
pub use error::OptionError;
pub use model::{OptionAddress, OptionRecord, OptionState};
pub use validator::{OptionValidator, Settlement, Transition};
