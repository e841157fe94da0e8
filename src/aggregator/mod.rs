//! Result Aggregator - merges partial resolutions into one answer set.
//!
//! Resolution machines finish in whatever order the chain lets them, so the
//! aggregate map is built by repeated merges. Overlapping symbols follow a
//! deliberate most-recent-wins policy: whichever merge happened last keeps
//! its price. The orchestrator serializes merge calls on its completion
//! loop, so no lock is needed here.

use std::collections::BTreeMap;

use crate::resolution::payload::PriceEntry;
use crate::symbols::SymbolCodec;
use crate::types::{AssetId, PriceResult};

pub struct ResultAggregator {
    codec: SymbolCodec,
    prices: BTreeMap<String, PriceResult>,
}

impl ResultAggregator {
    pub fn new(requested: Vec<AssetId>) -> Self {
        Self {
            codec: SymbolCodec::new(requested),
            prices: BTreeMap::new(),
        }
    }

    /// Merge one request's decoded entries into the aggregate map.
    ///
    /// Each raw symbol is normalized against the requested set first; a
    /// symbol that fails to normalize is still stored, keyed by its raw
    /// form, rather than dropped.
    pub fn merge(&mut self, entries: Vec<PriceEntry>) {
        for entry in entries {
            let key = match self.codec.normalize(&entry.symbol) {
                Some(id) => id.to_string(),
                None => {
                    tracing::debug!(
                        symbol = %entry.symbol,
                        "result symbol did not normalize, keeping raw key"
                    );
                    entry.symbol.clone()
                }
            };
            // Last write wins on collision.
            self.prices.insert(
                key.clone(),
                PriceResult {
                    symbol: key,
                    price: entry.price,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn into_prices(self) -> BTreeMap<String, PriceResult> {
        self.prices
    }
}
