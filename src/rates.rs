/// Exchange-rate table for accepted payment tokens
///
/// Administrators register a rate per payment token; purchases only ever
/// read enabled entries. Entries are never deleted, only disabled, so a
/// token's terms stay auditable after it is retired.
use std::collections::HashMap;

use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Address;

/// Exchange terms for one payment token.
///
/// The conversion factor is `output / input`: paying `input` smallest units
/// buys `output` smallest units of the sale token, before decimal
/// normalization. `payment_decimals` is the token's native precision,
/// captured when the rate is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub token: Address,
    pub input: Uint128,
    pub output: Uint128,
    pub payment_decimals: u8,
    pub enabled: bool,
}

/// Mapping from payment-token identity to its exchange terms.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<Address, ExchangeRate>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the rate for a payment token, enabling it.
    ///
    /// The argument order `(token, output, input)` follows the exchange-pair
    /// convention: `output` sale units per `input` payment units.
    pub fn set(
        &mut self,
        token: Address,
        output: Uint128,
        input: Uint128,
        payment_decimals: u8,
    ) -> Result<(), Error> {
        if token.is_zero() {
            return Err(Error::InvalidArguments(
                "payment token address must not be zero".to_string(),
            ));
        }
        if input.is_zero() {
            return Err(Error::InvalidArguments(
                "exchange rate input units must be positive".to_string(),
            ));
        }
        self.rates.insert(
            token,
            ExchangeRate {
                token,
                input,
                output,
                payment_decimals,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Disable a registered token. The entry is kept for audit.
    pub fn disable(&mut self, token: &Address) -> Result<(), Error> {
        match self.rates.get_mut(token) {
            Some(rate) => {
                rate.enabled = false;
                Ok(())
            }
            None => Err(Error::UnknownOrDisabledToken(*token)),
        }
    }

    /// Look up the enabled rate for a payment token.
    pub fn get(&self, token: &Address) -> Result<&ExchangeRate, Error> {
        match self.rates.get(token) {
            Some(rate) if rate.enabled => Ok(rate),
            _ => Err(Error::UnknownOrDisabledToken(*token)),
        }
    }

    /// Number of registered entries, enabled or not.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
