/// Shared types for the settlement engine
///
/// Provides the 20-byte account/token address wrapper used throughout the
/// crate and the receipt returned by a settled purchase.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A 20-byte address identifying an account or a token contract.
///
/// Parsed from and displayed as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Never a valid participant or token identity.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create from raw bytes.
    pub fn from_slice(bytes: &[u8; 20]) -> Self {
        Self(*bytes)
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let stripped = s
            .strip_prefix("0x")
            .ok_or_else(|| Error::InvalidArguments(format!("address missing 0x prefix: {}", s)))?;
        let raw = hex::decode(stripped)
            .map_err(|e| Error::InvalidArguments(format!("invalid address {}: {}", s, e)))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| Error::InvalidArguments(format!("address must be 20 bytes: {}", s)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

/// Receipt returned to the caller after a settled purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Unique identifier for this settlement.
    pub id: Uuid,
    /// The buyer credited with sale tokens.
    pub buyer: Address,
    /// The payment token pulled from the buyer.
    pub payment_token: Address,
    /// Amount pulled, in the payment token's smallest units.
    pub payment_amount: Uint128,
    /// Amount credited, in the sale token's smallest units.
    pub sale_amount: Uint128,
    /// Referral bonus paid to the referrer; zero when no bonus was paid.
    pub referral_bonus: Uint128,
    /// Settlement time as observed through the engine clock.
    pub timestamp: DateTime<Utc>,
}
