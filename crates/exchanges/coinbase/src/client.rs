use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tapebot_core::ExchangeError;
use tracing::debug;

use crate::api::{ApiAccount, ApiTicker, ApiTrade, CoinbaseApi, Page};
use crate::auth::Signer;

pub const DEFAULT_BASE_URL: &str = "https://api.pro.coinbase.com";

const AFTER_HEADER: &str = "cb-after";

/// Live REST binding.
///
/// Request timeouts, proxies and TLS settings come from the `reqwest::Client`
/// handed in at construction.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    signer: Signer,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl RestClient {
    pub fn new(signer: Signer, http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            signer,
        }
    }

    /// Point the client at another host, e.g. the public sandbox.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signed GET. Returns the response headers and body of a 2xx response.
    async fn get(&self, request_path: &str) -> Result<(HeaderMap, String), ExchangeError> {
        let timestamp = Utc::now().timestamp().to_string();
        let auth = self.signer.headers(&timestamp, "GET", request_path, "")?;

        let url = format!("{}{}", self.base_url, request_path);
        debug!(%url, "GET");

        let resp = self
            .http
            .get(&url)
            .headers(auth)
            .header(USER_AGENT, concat!("tapebot/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        Ok((headers, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, request_path: &str) -> Result<T, ExchangeError> {
        let (_, body) = self.get(request_path).await?;
        decode(&body)
    }
}

#[async_trait]
impl CoinbaseApi for RestClient {
    async fn trades_page(
        &self,
        product_id: &str,
        after: Option<&str>,
    ) -> Result<Page<ApiTrade>, ExchangeError> {
        let (headers, body) = self.get(&trades_path(product_id, after)?).await?;
        let items: Vec<ApiTrade> = decode(&body)?;

        Ok(Page {
            items,
            after: next_after(&headers),
        })
    }

    async fn accounts(&self) -> Result<Vec<ApiAccount>, ExchangeError> {
        self.get_json("/accounts").await
    }

    async fn ticker(&self, product_id: &str) -> Result<ApiTicker, ExchangeError> {
        let product_id = path_segment("product_id", product_id)?;
        self.get_json(&format!("/products/{product_id}/ticker")).await
    }
}

fn trades_path(product_id: &str, after: Option<&str>) -> Result<String, ExchangeError> {
    let product_id = path_segment("product_id", product_id)?;
    Ok(match after {
        Some(after) => {
            let after = path_segment("after", after)?;
            format!("/products/{product_id}/trades?after={after}")
        }
        None => format!("/products/{product_id}/trades"),
    })
}

/// Values spliced into a signed request path must be plain identifiers,
/// otherwise they would change both the URL and the signature payload.
fn path_segment<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ExchangeError> {
    let valid = !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if !valid {
        return Err(ExchangeError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Cursor for the next older page, taken from the `cb-after` header.
/// An absent or empty header means there is no older page.
fn next_after(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AFTER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body).map_err(|e| ExchangeError::Decode(e.to_string()))
}

/// Map a non-success response to an error, preferring the exchange's own
/// `{"message": ...}` text over the raw body.
fn error_for_status(status: StatusCode, body: &str) -> ExchangeError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExchangeError::Auth(message),
        _ => ExchangeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
