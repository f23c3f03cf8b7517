use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::Sha256;
use std::fmt;
use tapebot_core::ExchangeError;

/// Signs requests with the `CB-ACCESS-*` header scheme.
#[derive(Clone)]
pub struct Signer {
    key: String,
    secret: Vec<u8>,
    passphrase: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("key", &self.key).finish_non_exhaustive()
    }
}

impl Signer {
    /// `secret` is the base64 string issued with the API key.
    pub fn new(key: &str, secret: &str, passphrase: &str) -> Result<Self, ExchangeError> {
        let secret = general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| ExchangeError::Config(format!("API secret is not valid base64: {e}")))?;

        Ok(Self {
            key: key.to_string(),
            secret,
            passphrase: passphrase.to_string(),
        })
    }

    /// base64(HMAC-SHA256(secret, timestamp + method + request_path + body))
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<String, ExchangeError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| ExchangeError::Config(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Authentication headers for one request.
    pub fn headers(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<HeaderMap, ExchangeError> {
        let signature = self.sign(timestamp, method, request_path, body)?;

        let mut headers = HeaderMap::new();
        headers.insert("cb-access-key", header_value(&self.key)?);
        headers.insert("cb-access-sign", header_value(&signature)?);
        headers.insert("cb-access-timestamp", header_value(timestamp)?);
        headers.insert("cb-access-passphrase", header_value(&self.passphrase)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ExchangeError> {
    HeaderValue::from_str(value)
        .map_err(|e| ExchangeError::Config(format!("Credential is not a valid header value: {e}")))
}
