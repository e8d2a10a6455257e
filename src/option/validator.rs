// Transition validator - the option state machine
//
// Pure decision logic: given the current record, an action, the caller and the
// block height, produce the next record and the fund movement to perform, or a
// rejection. Nothing here touches balances; the applier executes the settlement.

use crate::coin::Amount;
use crate::identity::Address;
use crate::option::{
    Action, ActionKind, CreateOption, OptionAddress, OptionError, OptionRecord, OptionState,
    SellOption,
};

/// Funds that must move for a transition to take effect
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Debit `from` into the contract's escrow bucket
    Lock { from: Address, amount: Amount },
    /// Pay out of the contract's escrow bucket to `to`
    Release { to: Address, amount: Amount },
    /// Account to account transfer that bypasses escrow
    Pay { from: Address, to: Address, amount: Amount },
}

/// An accepted action: the record as it will be persisted, plus its settlement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub record: OptionRecord,
    pub settlement: Option<Settlement>,
}

pub struct OptionValidator;

impl OptionValidator {
    /// Validate a Create. `address` is the contract address the ledger derived for it.
    pub fn validate_create(
        create: &CreateOption,
        caller: &Address,
        address: OptionAddress,
        height: u64,
    ) -> Result<Transition, OptionError> {
        if create.expiration_height <= height {
            return Err(OptionError::Expired {
                height,
                expiration: create.expiration_height,
            });
        }
        check_positive(&create.trade)?;

        let record = OptionRecord::new(
            address,
            *caller,
            create.trade.clone(),
            create.expiration_height,
            height,
        );

        Ok(Transition {
            record,
            settlement: Some(Settlement::Lock {
                from: *caller,
                amount: create.trade.clone(),
            }),
        })
    }

    /// Validate an action against an existing contract
    pub fn validate(
        record: &OptionRecord,
        action: &Action,
        caller: &Address,
        height: u64,
    ) -> Result<Transition, OptionError> {
        // Terminal contracts reject everything before any other check
        if record.state().is_terminal() {
            return Err(invalid_transition(record, action.kind()));
        }

        match action {
            Action::Create(_) => Err(invalid_transition(record, ActionKind::Create)),
            Action::Sell(sell) => Self::sell(record, sell, caller),
            Action::Buy(_) => Self::buy(record, caller, height),
            Action::Exercise(_) => Self::exercise(record, caller, height),
            Action::Dissolve(_) => Self::dissolve(record, caller, height),
        }
    }

    fn sell(record: &OptionRecord, sell: &SellOption, caller: &Address) -> Result<Transition, OptionError> {
        match record.state() {
            OptionState::Created | OptionState::Offered => {}
            _ => return Err(invalid_transition(record, ActionKind::Sell)),
        }
        require_party(record.holder(), caller, ActionKind::Sell)?;
        check_positive(&sell.price)?;

        let mut next = record.clone();
        next.offer(sell.price.clone(), sell.restricted_buyer);
        Ok(Transition { record: next, settlement: None })
    }

    fn buy(record: &OptionRecord, caller: &Address, height: u64) -> Result<Transition, OptionError> {
        if record.state() != OptionState::Offered {
            return Err(invalid_transition(record, ActionKind::Buy));
        }
        if !record.buyer_allowed(caller) || record.holder() == caller {
            return Err(OptionError::Unauthorized {
                caller: *caller,
                action: ActionKind::Buy,
            });
        }
        check_not_expired(record, height)?;

        let price = record
            .price()
            .cloned()
            .ok_or_else(|| OptionError::InvalidAmount("offer has no price".to_string()))?;
        let seller = *record.holder();

        let mut next = record.clone();
        next.sell_to(*caller);
        Ok(Transition {
            record: next,
            settlement: Some(Settlement::Pay {
                from: *caller,
                to: seller,
                amount: price,
            }),
        })
    }

    fn exercise(record: &OptionRecord, caller: &Address, height: u64) -> Result<Transition, OptionError> {
        if record.state() != OptionState::Sold {
            return Err(invalid_transition(record, ActionKind::Exercise));
        }
        require_party(record.holder(), caller, ActionKind::Exercise)?;
        check_not_expired(record, height)?;

        let mut next = record.clone();
        next.mark_exercised();
        Ok(Transition {
            record: next,
            settlement: Some(Settlement::Release {
                to: *record.holder(),
                amount: record.trade().clone(),
            }),
        })
    }

    fn dissolve(record: &OptionRecord, caller: &Address, height: u64) -> Result<Transition, OptionError> {
        require_party(record.creator(), caller, ActionKind::Dissolve)?;

        // A never-offered contract can be dissolved at any height; an offered or
        // sold one only once it has expired.
        let state = record.state();
        if state != OptionState::Created && !record.is_expired_at(height) {
            return Err(OptionError::NotYetEligibleForDissolve {
                state,
                height,
                expiration: record.expiration_height(),
            });
        }

        let mut next = record.clone();
        next.mark_dissolved();
        Ok(Transition {
            record: next,
            settlement: Some(Settlement::Release {
                to: *record.creator(),
                amount: record.trade().clone(),
            }),
        })
    }
}

fn invalid_transition(record: &OptionRecord, action: ActionKind) -> OptionError {
    OptionError::InvalidStateTransition {
        state: record.state(),
        action,
    }
}

fn require_party(required: &Address, caller: &Address, action: ActionKind) -> Result<(), OptionError> {
    if required != caller {
        return Err(OptionError::Unauthorized {
            caller: *caller,
            action,
        });
    }
    Ok(())
}

fn check_positive(amount: &Amount) -> Result<(), OptionError> {
    amount.validate()?;
    if amount.is_zero() {
        return Err(OptionError::InvalidAmount(format!(
            "quantity of {} must be positive",
            amount.denom()
        )));
    }
    Ok(())
}

fn check_not_expired(record: &OptionRecord, height: u64) -> Result<(), OptionError> {
    if record.is_expired_at(height) {
        return Err(OptionError::Expired {
            height,
            expiration: record.expiration_height(),
        });
    }
    Ok(())
}
