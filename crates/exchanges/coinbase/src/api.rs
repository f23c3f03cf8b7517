//! Binding contract and wire records.
//!
//! Numeric fields stay as the strings the exchange sends; conversion to the
//! canonical model happens in the adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapebot_core::ExchangeError;

/// A trade as returned by `GET /products/{id}/trades`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTrade {
    pub trade_id: u64,
    pub price: String,
    pub size: String,
    pub time: DateTime<Utc>,
    pub side: String,
}

/// An account as returned by `GET /accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAccount {
    #[serde(default)]
    pub id: String,
    pub currency: String,
    pub balance: String,
    pub hold: String,
    #[serde(default)]
    pub available: String,
}

/// A ticker as returned by `GET /products/{id}/ticker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTicker {
    pub bid: String,
    pub ask: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub trade_id: Option<u64>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next (older) page; `None` when this is the last page.
    pub after: Option<String>,
}

/// Calls the adapter needs from the binding layer.
///
/// Implementations report network, authentication and decode failures as
/// distinct `ExchangeError` variants.
#[async_trait]
pub trait CoinbaseApi: Send + Sync {
    /// Fetch one page of trades, older than `after` when given.
    async fn trades_page(
        &self,
        product_id: &str,
        after: Option<&str>,
    ) -> Result<Page<ApiTrade>, ExchangeError>;

    /// Fetch every account of the authenticated profile.
    async fn accounts(&self) -> Result<Vec<ApiAccount>, ExchangeError>;

    /// Fetch the current ticker for a product.
    async fn ticker(&self, product_id: &str) -> Result<ApiTicker, ExchangeError>;
}
