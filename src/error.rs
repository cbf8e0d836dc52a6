/// Error types for the settlement engine
///
/// Every fallible operation in the crate returns `Result<T, Error>`. All
/// errors are terminal for the triggering call; the engine never retries
/// internally.
use cosmwasm_std::Uint128;

use crate::types::Address;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sale window has not opened yet.
    #[error("sale has not started")]
    SaleNotStarted,

    /// The sale window has closed.
    #[error("sale has ended")]
    SaleEnded,

    /// The sale stage is `Paused`; an administrator must activate it.
    #[error("sale is paused")]
    SalePaused,

    /// Public mode is off and the buyer is not on the allow-list.
    #[error("public sale is not open")]
    SaleNotPublic,

    /// The payment token has no enabled exchange rate.
    #[error("unknown or disabled payment token: {0}")]
    UnknownOrDisabledToken(Address),

    /// The converted sale amount is below the configured minimum.
    #[error("requested amount {requested} is below the sale minimum {minimum}")]
    RequestTooLow {
        requested: Uint128,
        minimum: Uint128,
    },

    /// Settling the purchase would push the buyer past the lifetime cap.
    /// The whole request is rejected; there is no partial fill.
    #[error(
        "purchase of {requested} would exceed the buyer cap {cap} (already credited {credited})"
    )]
    BuyerCapExceeded {
        requested: Uint128,
        credited: Uint128,
        cap: Uint128,
    },

    /// The custody collaborator rejected a transfer instruction.
    #[error("token transfer failed: {0}")]
    TransferFailed(String),

    /// The caller is not the configured owner identity.
    #[error("caller is not the sale owner")]
    Unauthorized,

    /// An intermediate product exceeded the representable range.
    #[error("arithmetic overflow while converting amounts")]
    ArithmeticOverflow,

    /// A caller-supplied argument failed validation.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
