/// Custody collaborator
///
/// The engine never holds token balances itself; it instructs an external
/// custody service to move them. Both instructions are fallible and are only
/// ever issued inside the orchestrator's commit boundary.
use std::collections::HashMap;

use async_trait::async_trait;
use cosmwasm_std::Uint128;
use tokio::sync::Mutex;

use crate::types::Address;

/// Failure reported by a custody implementation. The engine wraps these
/// into its own `TransferFailed` error.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("{holder} holds {available} of {token}, {requested} requested")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        available: Uint128,
        requested: Uint128,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// External ledger the engine instructs to move balances.
#[async_trait]
pub trait Custody: Send + Sync {
    /// Pull `amount` of `token` from `from` into the sale treasury.
    async fn pull(&self, token: &Address, from: &Address, amount: Uint128)
        -> Result<(), CustodyError>;

    /// Credit `amount` of `token` from the sale treasury to `to`.
    async fn credit(&self, token: &Address, to: &Address, amount: Uint128)
        -> Result<(), CustodyError>;
}

/// Reference custody backed by an in-memory balance map.
///
/// Holds balances keyed by `(token, holder)` with a designated treasury
/// address standing in for the sale's own holdings. `pull` moves buyer
/// funds into the treasury; `credit` pays out of it.
pub struct InMemoryCustody {
    treasury: Address,
    balances: Mutex<HashMap<(Address, Address), Uint128>>,
}

impl InMemoryCustody {
    pub fn new(treasury: Address) -> Self {
        Self {
            treasury,
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Seed a balance. Used to fund the treasury's sale-token pool and the
    /// buyers' payment balances.
    pub async fn mint(&self, token: Address, holder: Address, amount: Uint128) {
        let mut balances = self.balances.lock().await;
        let entry = balances.entry((token, holder)).or_default();
        *entry += amount;
    }

    pub async fn balance_of(&self, token: &Address, holder: &Address) -> Uint128 {
        let balances = self.balances.lock().await;
        balances
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }

    async fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock().await;
        let available = balances
            .get(&(*token, *from))
            .copied()
            .unwrap_or_default();
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                token: *token,
                holder: *from,
                available,
                requested: amount,
            });
        }
        balances.insert((*token, *from), available - amount);
        let entry = balances.entry((*token, *to)).or_default();
        *entry += amount;
        Ok(())
    }
}

#[async_trait]
impl Custody for InMemoryCustody {
    async fn pull(
        &self,
        token: &Address,
        from: &Address,
        amount: Uint128,
    ) -> Result<(), CustodyError> {
        let treasury = self.treasury;
        self.transfer(token, from, &treasury, amount).await
    }

    async fn credit(
        &self,
        token: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), CustodyError> {
        let treasury = self.treasury;
        self.transfer(token, &treasury, to, amount).await
    }
}
