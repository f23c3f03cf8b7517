//! Coinbase Exchange adapter.
//!
//! `CoinbaseExchange` implements the canonical `Exchange` trait on top of
//! the `CoinbaseApi` binding. `RestClient` is the live binding: signed REST
//! calls against `api.pro.coinbase.com` with `CB-AFTER` pagination.

pub mod api;
pub mod auth;
pub mod client;
pub mod cursor;
pub mod exchange;

pub use api::{ApiAccount, ApiTicker, ApiTrade, CoinbaseApi, Page};
pub use auth::Signer;
pub use client::{RestClient, DEFAULT_BASE_URL};
pub use cursor::TradeCursor;
pub use exchange::CoinbaseExchange;
