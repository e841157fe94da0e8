//! Execution payload decoding.
//!
//! The oracle program emits a JSON array of `{symbol, price}` objects, but
//! the chain may hand it back hex-encoded, and older program revisions
//! emitted bare scalars. A payload that fails to parse as prices is carried
//! through as opaque text rather than failing the request.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::error::PayloadError;

/// One `{symbol, price}` entry as the program reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub symbol: String,
    pub price: Decimal,
}

/// What the raw payload turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPayload {
    Prices(Vec<PriceEntry>),
    /// The payload decoded to an empty result set.
    Empty,
    /// Not a price array; preserved verbatim for the report.
    Opaque(String),
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    symbol: String,
    price: Value,
}

/// Decode an execution payload into price entries.
///
/// A `0x`-prefixed payload is hex-decoded to UTF-8 first. Malformed entries
/// inside an otherwise valid array are skipped with a warning; prices arrive
/// as either JSON numbers or numeric strings.
pub fn decode(raw: &str) -> Result<DecodedPayload, PayloadError> {
    let text = strip_hex(raw.trim())?;

    let parsed: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => return Ok(DecodedPayload::Opaque(text)),
    };

    let items = match parsed {
        Value::Array(items) => items,
        // A bare scalar or object is a legitimate non-price result.
        _ => return Ok(DecodedPayload::Opaque(text)),
    };

    if items.is_empty() {
        return Ok(DecodedPayload::Empty);
    }

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let raw_entry: RawEntry = match serde_json::from_value(item) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed payload entry");
                continue;
            }
        };
        match parse_price(&raw_entry.price) {
            Some(price) => entries.push(PriceEntry {
                symbol: raw_entry.symbol,
                price,
            }),
            None => {
                tracing::warn!(
                    symbol = %raw_entry.symbol,
                    price = %raw_entry.price,
                    "skipping entry with unparseable price"
                );
            }
        }
    }

    if entries.is_empty() {
        Ok(DecodedPayload::Empty)
    } else {
        Ok(DecodedPayload::Prices(entries))
    }
}

fn strip_hex(raw: &str) -> Result<String, PayloadError> {
    match raw.strip_prefix("0x") {
        Some(hex_body) => {
            let bytes =
                hex::decode(hex_body).map_err(|e| PayloadError::InvalidHex(e.to_string()))?;
            String::from_utf8(bytes).map_err(|_| PayloadError::InvalidUtf8)
        }
        None => Ok(raw.to_string()),
    }
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
