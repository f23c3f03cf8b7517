use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tapebot_core::*;
use tapebot_exchanges_common::{parse_decimal, Pacer};
use tracing::{debug, info, warn};

use crate::api::{ApiAccount, ApiTicker, ApiTrade, CoinbaseApi};
use crate::auth::Signer;
use crate::client::RestClient;
use crate::cursor::TradeCursor;

/// Minimum delay between successive trade-page requests during a backfill.
pub const DEFAULT_BACKFILL_INTERVAL: Duration = Duration::from_millis(335);

/// Default fee tier: 0.0% maker, 0.3% taker.
pub fn default_fees() -> FeeSchedule {
    FeeSchedule {
        maker: Decimal::ZERO,
        taker: Decimal::new(3, 1),
    }
}

/// Coinbase implementation of [`Exchange`].
///
/// Holds one trade cursor. `list_trades` advances it through `&mut self`,
/// so an instance cannot be paged from two places at once; balance and
/// quote lookups only need `&self`.
pub struct CoinbaseExchange<A = RestClient> {
    api: A,
    cursor: Option<TradeCursor>,
    fees: FeeSchedule,
    pacer: Pacer,
}

impl CoinbaseExchange<RestClient> {
    /// Build an adapter against the live endpoint using `http` as transport.
    pub fn new(config: &CoinbaseConfig, http: reqwest::Client) -> Result<Self, ExchangeError> {
        let signer = Signer::new(&config.api_key, &config.api_secret, &config.api_passphrase)?;
        Ok(Self::with_api(RestClient::new(signer, http)))
    }
}

impl<A: CoinbaseApi> CoinbaseExchange<A> {
    pub fn with_api(api: A) -> Self {
        Self {
            api,
            cursor: None,
            fees: default_fees(),
            pacer: Pacer::new(DEFAULT_BACKFILL_INTERVAL),
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_backfill_interval(mut self, interval: Duration) -> Self {
        self.pacer = Pacer::new(interval);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: CoinbaseApi> Exchange for CoinbaseExchange<A> {
    fn name(&self) -> &str {
        "Coinbase"
    }

    fn fees(&self) -> FeeSchedule {
        self.fees
    }

    async fn list_trades(&mut self, product_id: &str) -> Result<Vec<Trade>, ExchangeError> {
        let cursor = self.cursor.get_or_insert_with(|| {
            info!(product = %product_id, "Opening trade cursor");
            TradeCursor::open(product_id)
        });

        if cursor.product_id() != product_id {
            return Err(ExchangeError::ProductMismatch {
                open: cursor.product_id().to_string(),
                requested: product_id.to_string(),
            });
        }

        if !cursor.has_more() {
            return Ok(Vec::new());
        }

        self.pacer.wait().await;
        let page = self.api.trades_page(product_id, cursor.after()).await?;
        let trades = page
            .items
            .iter()
            .map(convert_trade)
            .collect::<Result<Vec<_>, _>>()?;

        cursor.advance(page.after, trades.len());
        debug!(
            product = %product_id,
            trades = trades.len(),
            after = ?cursor.after(),
            "Fetched trade page"
        );
        if !cursor.has_more() {
            info!(product = %product_id, "Trade history exhausted");
        }

        Ok(trades)
    }

    async fn get_balance(&self, currency: &str, asset: &str) -> Result<Balance, ExchangeError> {
        let accounts = self.api.accounts().await?;
        debug!(accounts = accounts.len(), "Fetched accounts");

        let mut balance = Balance::default();
        for account in &accounts {
            if account.currency == currency {
                balance.currency = Some(convert_holding(account)?);
            }
            if account.currency == asset {
                balance.asset = Some(convert_holding(account)?);
            }
        }

        if balance.currency.is_none() {
            warn!(code = %currency, "No account for currency");
        }
        if balance.asset.is_none() {
            warn!(code = %asset, "No account for asset");
        }

        Ok(balance)
    }

    async fn get_quote(&self, product_id: &str) -> Result<Quote, ExchangeError> {
        let ticker = self.api.ticker(product_id).await?;
        let quote = convert_quote(&ticker)?;
        debug!(product = %product_id, bid = %quote.bid, ask = %quote.ask, "Fetched quote");
        Ok(quote)
    }
}

fn convert_trade(trade: &ApiTrade) -> Result<Trade, ExchangeError> {
    Ok(Trade {
        trade_id: trade.trade_id.to_string(),
        size: parse_decimal("size", &trade.size)?,
        price: parse_decimal("price", &trade.price)?,
        time: trade.time,
        side: trade.side.parse()?,
    })
}

fn convert_holding(account: &ApiAccount) -> Result<Holding, ExchangeError> {
    Ok(Holding {
        available: parse_decimal("balance", &account.balance)?,
        hold: parse_decimal("hold", &account.hold)?,
    })
}

fn convert_quote(ticker: &ApiTicker) -> Result<Quote, ExchangeError> {
    Ok(Quote {
        bid: parse_decimal("bid", &ticker.bid)?,
        ask: parse_decimal("ask", &ticker.ask)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Page;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted binding. Each trades_page call pops the next result and
    /// records the request it saw.
    #[derive(Default)]
    struct FakeApi {
        pages: Mutex<VecDeque<Result<Page<ApiTrade>, ExchangeError>>>,
        requests: Mutex<Vec<(String, Option<String>)>>,
        accounts: Option<Vec<ApiAccount>>,
        ticker: Option<ApiTicker>,
    }

    impl FakeApi {
        fn with_pages(k: usize) -> Self {
            let api = FakeApi::default();
            for i in 0..k {
                let first_id = ((k - i) * 10) as u64;
                let after = (i + 1 < k).then(|| first_id.to_string());
                api.push_page(
                    vec![api_trade(first_id, "1.0", "10.0", "buy"), api_trade(first_id - 1, "2.0", "10.0", "sell")],
                    after,
                );
            }
            api
        }

        fn push_page(&self, items: Vec<ApiTrade>, after: Option<String>) {
            self.pages.lock().unwrap().push_back(Ok(Page { items, after }));
        }

        fn push_error(&self, err: ExchangeError) {
            self.pages.lock().unwrap().push_back(Err(err));
        }

        fn requests(&self) -> Vec<(String, Option<String>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CoinbaseApi for FakeApi {
        async fn trades_page(
            &self,
            product_id: &str,
            after: Option<&str>,
        ) -> Result<Page<ApiTrade>, ExchangeError> {
            self.requests
                .lock()
                .unwrap()
                .push((product_id.to_string(), after.map(str::to_string)));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page { items: Vec::new(), after: None }))
        }

        async fn accounts(&self) -> Result<Vec<ApiAccount>, ExchangeError> {
            self.accounts
                .clone()
                .ok_or_else(|| ExchangeError::Transport("connection reset".into()))
        }

        async fn ticker(&self, _product_id: &str) -> Result<ApiTicker, ExchangeError> {
            self.ticker
                .clone()
                .ok_or_else(|| ExchangeError::Auth("invalid signature".into()))
        }
    }

    fn api_trade(id: u64, size: &str, price: &str, side: &str) -> ApiTrade {
        ApiTrade {
            trade_id: id,
            price: price.into(),
            size: size.into(),
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            side: side.into(),
        }
    }

    fn account(currency: &str, balance: &str, hold: &str) -> ApiAccount {
        ApiAccount {
            id: format!("{currency}-account"),
            currency: currency.into(),
            balance: balance.into(),
            hold: hold.into(),
            available: balance.into(),
        }
    }

    fn ticker(bid: &str, ask: &str) -> ApiTicker {
        ApiTicker {
            bid: bid.into(),
            ask: ask.into(),
            price: ask.into(),
            trade_id: None,
            time: None,
        }
    }

    fn adapter(api: FakeApi) -> CoinbaseExchange<FakeApi> {
        CoinbaseExchange::with_api(api).with_backfill_interval(Duration::ZERO)
    }

    #[test]
    fn test_convert_trade() {
        let trade = convert_trade(&api_trade(42, "1.5", "100.25", "buy")).unwrap();
        assert_eq!(trade.trade_id, "42");
        assert_eq!(trade.size, dec!(1.5));
        assert_eq!(trade.price, dec!(100.25));
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.time, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_convert_trade_rejects_bad_fields() {
        let err = convert_trade(&api_trade(1, "lots", "100", "buy")).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidNumber { field: "size", .. }));

        let err = convert_trade(&api_trade(1, "1", "100", "short")).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidSide(_)));
    }

    #[tokio::test]
    async fn test_k_pages_then_empty() {
        for k in [0usize, 1, 3] {
            let mut exchange = adapter(FakeApi::with_pages(k));

            for _ in 0..k {
                assert!(!exchange.list_trades("BTC-USD").await.unwrap().is_empty());
            }
            assert!(exchange.list_trades("BTC-USD").await.unwrap().is_empty());
            assert!(exchange.list_trades("BTC-USD").await.unwrap().is_empty());

            // One request per page, none once exhausted.
            assert_eq!(exchange.api().requests().len(), k.max(1));
        }
    }

    #[tokio::test]
    async fn test_cursor_follows_after_header() {
        let mut exchange = adapter(FakeApi::with_pages(3));
        while !exchange.list_trades("BTC-USD").await.unwrap().is_empty() {}

        let afters: Vec<_> = exchange
            .api()
            .requests()
            .into_iter()
            .map(|(product, after)| {
                assert_eq!(product, "BTC-USD");
                after
            })
            .collect();
        assert_eq!(afters, vec![None, Some("30".to_string()), Some("20".to_string())]);
    }

    #[tokio::test]
    async fn test_failed_page_is_retryable() {
        let api = FakeApi::default();
        api.push_page(vec![api_trade(9, "1", "1", "buy")], Some("9".into()));
        api.push_error(ExchangeError::Transport("timed out".into()));
        api.push_page(vec![api_trade(8, "1", "1", "sell")], None);
        let mut exchange = adapter(api);

        assert_eq!(exchange.list_trades("BTC-USD").await.unwrap().len(), 1);
        assert!(matches!(
            exchange.list_trades("BTC-USD").await,
            Err(ExchangeError::Transport(_))
        ));
        assert_eq!(exchange.list_trades("BTC-USD").await.unwrap().len(), 1);
        assert!(exchange.list_trades("BTC-USD").await.unwrap().is_empty());

        let afters: Vec<_> = exchange.api().requests().into_iter().map(|(_, a)| a).collect();
        assert_eq!(afters, vec![None, Some("9".to_string()), Some("9".to_string())]);
    }

    #[tokio::test]
    async fn test_bad_number_fails_whole_page() {
        let api = FakeApi::default();
        api.push_page(
            vec![api_trade(2, "1.0", "10.0", "buy"), api_trade(1, "", "10.0", "buy")],
            Some("1".into()),
        );
        let mut exchange = adapter(api);

        let err = exchange.list_trades("BTC-USD").await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidNumber { field: "size", .. }));
    }

    #[tokio::test]
    async fn test_product_mismatch() {
        let mut exchange = adapter(FakeApi::with_pages(2));
        exchange.list_trades("BTC-USD").await.unwrap();

        match exchange.list_trades("ETH-USD").await {
            Err(ExchangeError::ProductMismatch { open, requested }) => {
                assert_eq!(open, "BTC-USD");
                assert_eq!(requested, "ETH-USD");
            }
            other => panic!("expected ProductMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pages_are_paced() {
        let mut exchange =
            CoinbaseExchange::with_api(FakeApi::with_pages(2)).with_backfill_interval(Duration::from_millis(100));

        exchange.list_trades("BTC-USD").await.unwrap();
        let start = std::time::Instant::now();
        exchange.list_trades("BTC-USD").await.unwrap();
        assert!(start.elapsed().as_millis() >= 90);
    }

    #[tokio::test]
    async fn test_balance() {
        let api = FakeApi {
            accounts: Some(vec![
                account("ETH", "3.0", "0.0"),
                account("USD", "10.0", "1.0"),
                account("BTC", "0.5", "0.0"),
            ]),
            ..Default::default()
        };
        let balance = adapter(api).get_balance("USD", "BTC").await.unwrap();

        assert_eq!(balance.currency_available(), dec!(10.0));
        assert_eq!(balance.currency_hold(), dec!(1.0));
        assert_eq!(balance.asset_available(), dec!(0.5));
        assert_eq!(balance.asset_hold(), dec!(0.0));
    }

    #[tokio::test]
    async fn test_balance_not_found_is_zero_and_flagged() {
        let api = FakeApi {
            accounts: Some(vec![account("ETH", "3.0", "0.5")]),
            ..Default::default()
        };
        let balance = adapter(api).get_balance("USD", "BTC").await.unwrap();

        assert_eq!(balance.currency_available(), Decimal::ZERO);
        assert_eq!(balance.currency_hold(), Decimal::ZERO);
        assert_eq!(balance.asset_available(), Decimal::ZERO);
        assert_eq!(balance.asset_hold(), Decimal::ZERO);
        // Missing accounts are distinguishable from empty ones.
        assert!(balance.is_unmatched());
    }

    #[tokio::test]
    async fn test_balance_bad_number() {
        let api = FakeApi {
            accounts: Some(vec![account("USD", "10.0", "n/a")]),
            ..Default::default()
        };
        let err = adapter(api).get_balance("USD", "BTC").await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidNumber { field: "hold", .. }));
    }

    #[tokio::test]
    async fn test_quote() {
        let api = FakeApi {
            ticker: Some(ticker("99.5", "100.5")),
            ..Default::default()
        };
        let quote = adapter(api).get_quote("BTC-USD").await.unwrap();
        assert_eq!(
            quote,
            Quote {
                bid: dec!(99.5),
                ask: dec!(100.5)
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failures_propagate() {
        let api = FakeApi::default();
        api.push_error(ExchangeError::Transport("dns".into()));
        let mut exchange = adapter(api);

        assert!(matches!(
            exchange.list_trades("BTC-USD").await,
            Err(ExchangeError::Transport(_))
        ));
        assert!(matches!(
            exchange.get_balance("USD", "BTC").await,
            Err(ExchangeError::Transport(_))
        ));
        assert!(matches!(
            exchange.get_quote("BTC-USD").await,
            Err(ExchangeError::Auth(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let exchange = CoinbaseExchange::with_api(FakeApi::default());
        assert_eq!(exchange.name(), "Coinbase");
        assert_eq!(exchange.fees().maker, dec!(0.0));
        assert_eq!(exchange.fees().taker, dec!(0.3));
        assert_eq!(exchange.pacer.interval(), DEFAULT_BACKFILL_INTERVAL);
    }

    #[test]
    fn test_new_rejects_bad_secret() {
        let config = CoinbaseConfig {
            api_key: "key".into(),
            api_secret: "***".into(),
            api_passphrase: "phrase".into(),
        };
        assert!(matches!(
            CoinbaseExchange::new(&config, reqwest::Client::new()),
            Err(ExchangeError::Config(_))
        ));
    }
}
