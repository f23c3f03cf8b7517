use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Exchange returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Invalid number in field `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Invalid trade side: {0:?}")]
    InvalidSide(String),
    #[error("Invalid {field} for a request path: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },
    #[error("Trade cursor is open on {open}, cannot list {requested}")]
    ProductMismatch { open: String, requested: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Exchange Trait
// ---------------------------------------------------------------------------

/// An exchange adapter exposing the canonical read-only capability set.
///
/// One implementation exists per exchange; the caller picks it when the
/// adapter is constructed.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Maker/taker fee rates applied by this exchange.
    fn fees(&self) -> FeeSchedule;

    /// Fetch the next page of historical trades for `product_id`, newest
    /// first.
    ///
    /// The first call opens a cursor bound to the product and every call
    /// advances it one page. An empty result means history is exhausted;
    /// callers poll until they see one.
    async fn list_trades(&mut self, product_id: &str) -> Result<Vec<Trade>, ExchangeError>;

    /// Get the balances for the quote `currency` and base `asset`.
    async fn get_balance(&self, currency: &str, asset: &str) -> Result<Balance, ExchangeError>;

    /// Get the current best bid/ask for `product_id`.
    async fn get_quote(&self, product_id: &str) -> Result<Quote, ExchangeError>;
}
