use rust_decimal::Decimal;
use std::str::FromStr;
use tapebot_core::ExchangeError;

/// Parse a numeric field the exchange sends as text.
///
/// Plain decimal strings are parsed exactly. Scientific notation
/// (`"1e-8"`) is accepted as a fallback. Anything else, including an empty
/// string, is reported with the field name instead of being read as zero.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ExchangeError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}
