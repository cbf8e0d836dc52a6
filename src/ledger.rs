/// Per-participant cumulative state
///
/// One flat record per address, created lazily on first interaction and
/// never destroyed. Counters only grow; there is no administrative reset.
use std::collections::HashMap;

use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Cumulative settlement state for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAccount {
    pub address: Address,
    /// Total sale tokens credited through purchases, smallest units.
    pub total_credited: Uint128,
    /// Set after the first successful purchase; guards referral attribution.
    pub has_purchased: bool,
    /// Distinct first-time buyers this address has referred.
    pub referred_count: u32,
    /// Total referral bonus earned, smallest units.
    pub referral_earned: Uint128,
}

impl ParticipantAccount {
    fn new(address: Address) -> Self {
        Self {
            address,
            total_credited: Uint128::zero(),
            has_purchased: false,
            referred_count: 0,
            referral_earned: Uint128::zero(),
        }
    }
}

/// Mapping from address to participant record.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: HashMap<Address, ParticipantAccount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&ParticipantAccount> {
        self.accounts.get(address)
    }

    /// Fetch the record for an address, creating it on first touch.
    pub fn entry(&mut self, address: Address) -> &mut ParticipantAccount {
        self.accounts
            .entry(address)
            .or_insert_with(|| ParticipantAccount::new(address))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
