// Applier - the single sequential apply step
//
// Runs the validator, executes the settlement against the escrow ledger and
// stores the new record. Either every effect lands or none does.

use crate::escrow::{EscrowError, EscrowLedger, Movement};
use crate::identity::Address;
use crate::ledger::{HeightOracle, LedgerState};
use crate::option::{
    Action, ActionCodec, ActionKind, BuyOption, DissolveOption, ExerciseOption, OptionAddress,
    OptionError, OptionRecord, OptionState, OptionValidator, SellOption, Settlement, Transition,
};
use std::fmt;
use tracing::{debug, warn};

/// Outcome of an accepted action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub action: ActionKind,
    pub option: OptionAddress,
    pub state: OptionState,
    pub height: u64,
    pub movements: Vec<Movement>,
}

/// A rejected action: the reason plus the contract as it stands, if it exists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub error: OptionError,
    pub record: Option<OptionRecord>,
}

impl Rejection {
    fn new(error: OptionError, record: Option<&OptionRecord>) -> Self {
        Self {
            error,
            record: record.cloned(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => write!(f, "{} (option {} is {})", self.error, record.address(), record.state()),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Applier;

impl Applier {
    /// Apply an action at the state's own block height
    pub fn apply(state: &mut LedgerState, caller: &Address, action: &Action) -> Result<Receipt, Rejection> {
        let clock = *state.clock();
        Self::apply_with_oracle(state, &clock, caller, action)
    }

    /// Decode submitted codec bytes and apply them
    pub fn apply_bytes(state: &mut LedgerState, caller: &Address, bytes: &[u8]) -> Result<Receipt, Rejection> {
        let action = ActionCodec::decode(bytes).map_err(|e| {
            warn!(%caller, error = %e, "rejecting undecodable option tx");
            Rejection::new(e.into(), None)
        })?;
        Self::apply(state, caller, &action)
    }

    /// Apply an action using `oracle` for the current height
    pub fn apply_with_oracle<O: HeightOracle>(
        state: &mut LedgerState,
        oracle: &O,
        caller: &Address,
        action: &Action,
    ) -> Result<Receipt, Rejection> {
        let height = oracle.current_height();

        let (transition, previous) = match action {
            Action::Create(create) => {
                let address = state.next_option_address(caller);
                if let Some(existing) = state.option(&address) {
                    // Derivation collision would overwrite a live record
                    return Err(reject(action, caller, OptionError::InvalidStateTransition {
                        state: existing.state(),
                        action: ActionKind::Create,
                    }, Some(existing)));
                }
                let transition = OptionValidator::validate_create(create, caller, address, height)
                    .map_err(|e| reject(action, caller, e, None))?;
                (transition, None)
            }
            Action::Sell(SellOption { option, .. })
            | Action::Buy(BuyOption { option })
            | Action::Exercise(ExerciseOption { option })
            | Action::Dissolve(DissolveOption { option }) => {
                let record = state
                    .option(option)
                    .ok_or_else(|| reject(action, caller, OptionError::NotFound(*option), None))?;
                let transition = OptionValidator::validate(record, action, caller, height)
                    .map_err(|e| reject(action, caller, e, Some(record)))?;
                (transition, Some(record.clone()))
            }
        };

        let Transition { record, settlement } = transition;
        let address = *record.address();

        let movements = match settlement {
            Some(settlement) => {
                let movement = settle(state.escrow_mut(), &address, &settlement)
                    .map_err(|e| reject(action, caller, e.into(), previous.as_ref()))?;
                vec![movement]
            }
            None => Vec::new(),
        };

        if action.kind() == ActionKind::Create {
            state.bump_create_sequence(caller);
        }

        let receipt = Receipt {
            action: action.kind(),
            option: address,
            state: record.state(),
            height,
            movements,
        };
        state.put_option(record);

        debug!(
            option = %receipt.option,
            action = %receipt.action,
            state = %receipt.state,
            height,
            "option action applied"
        );
        Ok(receipt)
    }
}

fn settle(
    escrow: &mut EscrowLedger,
    contract: &OptionAddress,
    settlement: &Settlement,
) -> Result<Movement, EscrowError> {
    match settlement {
        Settlement::Lock { from, amount } => escrow.lock(from, amount, contract),
        Settlement::Release { to, amount } => escrow.release(contract, amount, to),
        Settlement::Pay { from, to, amount } => escrow.transfer_direct(from, to, amount),
    }
}

fn reject(action: &Action, caller: &Address, error: OptionError, record: Option<&OptionRecord>) -> Rejection {
    warn!(action = %action.kind(), %caller, error = %error, "option action rejected");
    Rejection::new(error, record)
}
