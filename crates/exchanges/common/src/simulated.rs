use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tapebot_core::*;
use tracing::debug;

/// An in-memory exchange for paper runs and tests.
///
/// Trade history is scripted as a queue of pages per product, and follows
/// the same cursor rules as a live adapter: the first `list_trades` call
/// binds the cursor to its product and every call pops one page. Once a
/// call returns an empty page the scan is exhausted and stays empty, even
/// if more pages are queued afterwards.
pub struct SimulatedExchange {
    fees: FeeSchedule,
    pages: HashMap<String, VecDeque<Vec<Trade>>>,
    open_product: Option<String>,
    exhausted: bool,
    accounts: HashMap<String, Holding>,
    quotes: HashMap<String, Quote>,
    fail_next: AtomicBool,
}

impl Default for SimulatedExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self {
            fees: FeeSchedule {
                maker: Decimal::ZERO,
                taker: Decimal::ZERO,
            },
            pages: HashMap::new(),
            open_product: None,
            exhausted: false,
            accounts: HashMap::new(),
            quotes: HashMap::new(),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Queue a page of trades for `product_id`, returned after any pages
    /// already queued.
    pub fn push_trade_page(&mut self, product_id: &str, trades: Vec<Trade>) {
        self.pages
            .entry(product_id.to_string())
            .or_default()
            .push_back(trades);
    }

    pub fn set_account(&mut self, code: &str, holding: Holding) {
        self.accounts.insert(code.to_string(), holding);
    }

    pub fn set_quote(&mut self, product_id: &str, quote: Quote) {
        self.quotes.insert(product_id.to_string(), quote);
    }

    /// Make the next operation fail with a transport error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_outage(&self) -> Result<(), ExchangeError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ExchangeError::Transport("Simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Exchange for SimulatedExchange {
    fn name(&self) -> &str {
        "Simulated"
    }

    fn fees(&self) -> FeeSchedule {
        self.fees
    }

    async fn list_trades(&mut self, product_id: &str) -> Result<Vec<Trade>, ExchangeError> {
        let open = self
            .open_product
            .get_or_insert_with(|| product_id.to_string());
        if open.as_str() != product_id {
            return Err(ExchangeError::ProductMismatch {
                open: open.clone(),
                requested: product_id.to_string(),
            });
        }
        self.check_outage()?;
        if self.exhausted {
            return Ok(Vec::new());
        }

        let page = self
            .pages
            .get_mut(product_id)
            .and_then(|pages| pages.pop_front())
            .unwrap_or_default();
        self.exhausted = page.is_empty();
        debug!(product = %product_id, trades = page.len(), "Simulated trade page");
        Ok(page)
    }

    async fn get_balance(&self, currency: &str, asset: &str) -> Result<Balance, ExchangeError> {
        self.check_outage()?;
        Ok(Balance {
            currency: self.accounts.get(currency).copied(),
            asset: self.accounts.get(asset).copied(),
        })
    }

    async fn get_quote(&self, product_id: &str) -> Result<Quote, ExchangeError> {
        self.check_outage()?;
        self.quotes
            .get(product_id)
            .copied()
            .ok_or_else(|| ExchangeError::Api {
                status: 404,
                message: format!("NotFound: {product_id}"),
            })
    }
}
