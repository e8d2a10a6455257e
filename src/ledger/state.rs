// Ledger State - the explicit store the applier mutates
//
// Holds every option record, the escrow ledger and the block clock. Nothing
// outside this struct carries ledger state.

use crate::escrow::EscrowLedger;
use crate::identity::Address;
use crate::ledger::{BlockClock, HeightOracle};
use crate::option::{OptionAddress, OptionRecord, OptionState};
use std::collections::BTreeMap;

/// Summary counts over all contracts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub total_options: usize,
    pub created: usize,
    pub offered: usize,
    pub sold: usize,
    pub exercised: usize,
    pub dissolved: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    options: BTreeMap<OptionAddress, OptionRecord>,
    escrow: EscrowLedger,
    clock: BlockClock,
    /// Creator -> number of options created so far (feeds address derivation)
    create_sequences: BTreeMap<Address, u64>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state from persisted parts
    pub fn from_parts(
        options: BTreeMap<OptionAddress, OptionRecord>,
        escrow: EscrowLedger,
        clock: BlockClock,
        create_sequences: BTreeMap<Address, u64>,
    ) -> Self {
        Self {
            options,
            escrow,
            clock,
            create_sequences,
        }
    }

    // ========================================================================
    // OPTION RECORDS
    // ========================================================================

    pub fn option(&self, address: &OptionAddress) -> Option<&OptionRecord> {
        self.options.get(address)
    }

    pub fn has_option(&self, address: &OptionAddress) -> bool {
        self.options.contains_key(address)
    }

    pub fn options(&self) -> impl Iterator<Item = &OptionRecord> {
        self.options.values()
    }

    /// Options currently held by `holder`
    pub fn options_held_by(&self, holder: &Address) -> Vec<&OptionRecord> {
        self.options.values().filter(|r| r.holder() == holder).collect()
    }

    pub(crate) fn put_option(&mut self, record: OptionRecord) {
        self.options.insert(*record.address(), record);
    }

    // ========================================================================
    // ESCROW / CLOCK
    // ========================================================================

    pub fn escrow(&self) -> &EscrowLedger {
        &self.escrow
    }

    pub fn escrow_mut(&mut self) -> &mut EscrowLedger {
        &mut self.escrow
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut BlockClock {
        &mut self.clock
    }

    pub fn height(&self) -> u64 {
        self.clock.current_height()
    }

    // ========================================================================
    // ADDRESS DERIVATION
    // ========================================================================

    pub fn create_sequence(&self, creator: &Address) -> u64 {
        self.create_sequences.get(creator).copied().unwrap_or(0)
    }

    pub fn create_sequences(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.create_sequences.iter()
    }

    /// Address the next Create by `creator` will receive
    pub fn next_option_address(&self, creator: &Address) -> OptionAddress {
        OptionAddress::derive(creator, self.create_sequence(creator))
    }

    pub(crate) fn bump_create_sequence(&mut self, creator: &Address) {
        *self.create_sequences.entry(*creator).or_insert(0) += 1;
    }

    pub fn statistics(&self) -> LedgerStatistics {
        let mut stats = LedgerStatistics {
            total_options: self.options.len(),
            ..Default::default()
        };
        for record in self.options.values() {
            match record.state() {
                OptionState::Created => stats.created += 1,
                OptionState::Offered => stats.offered += 1,
                OptionState::Sold => stats.sold += 1,
                OptionState::Exercised => stats.exercised += 1,
                OptionState::Dissolved => stats.dissolved += 1,
            }
        }
        stats
    }
}
