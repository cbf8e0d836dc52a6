/// Sale window, stage and participation-mode gating
///
/// Every purchase is screened here before any conversion or ledger work
/// happens. The checks run in a fixed order so the error reported under
/// multiple simultaneous violations is deterministic.
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Address;

/// Administrator-controlled switch gating all purchases.
///
/// A freshly constructed sale starts `Paused`; an administrator must
/// explicitly activate it before any purchase can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStage {
    Active,
    Paused,
}

/// Holds the sale window, stage, public/allow-list mode and the allow-list
/// itself. Mutated only through the Administration Interface.
#[derive(Debug, Clone)]
pub struct SaleController {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    stage: SaleStage,
    public_sale: bool,
    allow_list: HashSet<Address>,
}

impl SaleController {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>, public_sale: bool) -> Self {
        Self {
            start_time,
            end_time,
            stage: SaleStage::Paused,
            public_sale,
            allow_list: HashSet::new(),
        }
    }

    /// Gating predicate for a purchase attempt. First failing check wins:
    /// stage, window start, window end, then participation mode. Allow-list
    /// membership relaxes only the participation-mode check; it never
    /// bypasses the stage or window checks.
    pub fn check_open(&self, now: DateTime<Utc>, buyer: &Address) -> Result<(), Error> {
        if self.stage == SaleStage::Paused {
            return Err(Error::SalePaused);
        }
        if now < self.start_time {
            return Err(Error::SaleNotStarted);
        }
        if now > self.end_time {
            return Err(Error::SaleEnded);
        }
        if !self.public_sale && !self.allow_list.contains(buyer) {
            return Err(Error::SaleNotPublic);
        }
        Ok(())
    }

    pub fn stage(&self) -> SaleStage {
        self.stage
    }

    pub fn set_stage(&mut self, stage: SaleStage) {
        self.stage = stage;
    }

    pub fn is_public(&self) -> bool {
        self.public_sale
    }

    pub fn set_public(&mut self, public_sale: bool) {
        self.public_sale = public_sale;
    }

    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time, self.end_time)
    }

    /// Add one address to the allow-list. Append-only; returns whether the
    /// address was newly added.
    pub fn allow(&mut self, address: Address) -> bool {
        self.allow_list.insert(address)
    }

    pub fn is_allowed(&self, address: &Address) -> bool {
        self.allow_list.contains(address)
    }

    pub fn allow_list_len(&self) -> usize {
        self.allow_list.len()
    }
}
