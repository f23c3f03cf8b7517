use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::traits::ExchangeError;

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Taker side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(ExchangeError::InvalidSide(s.to_string())),
        }
    }
}

/// A single executed trade on a product, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange-assigned identifier, unique per product.
    pub trade_id: String,
    pub size: Decimal,
    pub price: Decimal,
    pub time: DateTime<Utc>,
    pub side: Side,
}

impl Trade {
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Funds held in one currency on the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Balance reported by the exchange.
    pub available: Decimal,
    /// Amount reserved by open orders.
    pub hold: Decimal,
}

/// Balances for a currency/asset pair.
///
/// A side is `None` when the exchange reported no account for that code,
/// which keeps "not found" apart from a legitimately empty account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The quote currency (e.g. USD).
    pub currency: Option<Holding>,
    /// The base asset (e.g. BTC).
    pub asset: Option<Holding>,
}

impl Balance {
    pub fn currency_available(&self) -> Decimal {
        self.currency.map(|h| h.available).unwrap_or_default()
    }

    pub fn currency_hold(&self) -> Decimal {
        self.currency.map(|h| h.hold).unwrap_or_default()
    }

    pub fn asset_available(&self) -> Decimal {
        self.asset.map(|h| h.available).unwrap_or_default()
    }

    pub fn asset_hold(&self) -> Decimal {
        self.asset.map(|h| h.hold).unwrap_or_default()
    }

    /// True when neither side was found on the exchange.
    pub fn is_unmatched(&self) -> bool {
        self.currency.is_none() && self.asset.is_none()
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Best bid/ask snapshot for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Quote {
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Whether an order added or removed liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liquidity {
    Maker,
    Taker,
}

/// Fee rates charged by an exchange, in percent of notional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker: Decimal,
    pub taker: Decimal,
}

impl FeeSchedule {
    pub fn rate(&self, liquidity: Liquidity) -> Decimal {
        match liquidity {
            Liquidity::Maker => self.maker,
            Liquidity::Taker => self.taker,
        }
    }

    /// Fee charged on `notional` at the given liquidity.
    pub fn fee(&self, liquidity: Liquidity, notional: Decimal) -> Decimal {
        notional * self.rate(liquidity) / Decimal::ONE_HUNDRED
    }
}
