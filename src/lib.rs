pub mod access;
pub mod clock;
pub mod config;
pub mod convert;
pub mod custody;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod rates;
pub mod schedule;
pub mod types;

// Main engine exports
pub use engine::{IdoEngine, IdoEngineBuilder};
pub use error::Error;
pub use types::{Address, PurchaseReceipt};

// Configuration exports
pub use config::{EngineConfig, RateSeed, SaleParams};

// Component exports
pub use ledger::ParticipantAccount;
pub use rates::ExchangeRate;
pub use schedule::{SaleController, SaleStage};

// Collaborator exports
pub use access::{AccessControl, StaticOwner};
pub use clock::{Clock, ManualClock, SystemClock};
pub use custody::{Custody, CustodyError, InMemoryCustody};

// Re-export the amount types for user convenience
pub use cosmwasm_std::{Uint128, Uint256};
