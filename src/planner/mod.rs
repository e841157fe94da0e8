//! Gas-bounded chunk planning.
//!
//! Splits a requested asset list into contiguous chunks sized so that each
//! resulting data request stays under the per-request gas ceiling. Pure
//! arithmetic, no I/O.

use crate::config::GasConfig;
use crate::error::PlanError;
use crate::types::{AssetId, Chunk};

/// Fixed-point divisor converting gas * gas-price into token units.
const TOKEN_SCALE: u128 = 1_000_000_000;

/// Split `assets` into ordered, gas-bounded chunks.
///
/// Chunk size is `max_per_request / per_asset`, floored, never below one
/// asset per chunk. The chunks concatenate back to the input exactly; the
/// last chunk may be short.
pub fn plan(assets: &[AssetId], gas: &GasConfig) -> Result<Vec<Chunk>, PlanError> {
    if assets.is_empty() {
        return Err(PlanError::EmptyAssetList);
    }
    if gas.per_asset == 0 {
        return Err(PlanError::ZeroGasPerAsset);
    }

    let max_assets = ((gas.max_per_request / gas.per_asset) as usize).max(1);

    let chunks: Vec<Chunk> = assets
        .chunks(max_assets)
        .enumerate()
        .map(|(index, slice)| {
            let estimated_gas = gas.per_asset as u128 * slice.len() as u128;
            let estimated_cost = estimated_gas * gas.price as u128 / TOKEN_SCALE;
            Chunk {
                index,
                assets: slice.to_vec(),
                estimated_gas,
                estimated_cost,
            }
        })
        .collect();

    for chunk in &chunks {
        tracing::debug!(
            chunk = chunk.index,
            assets = %chunk.encoded_input(),
            estimated_gas = chunk.estimated_gas,
            estimated_cost = chunk.estimated_cost,
            "planned chunk"
        );
    }

    Ok(chunks)
}
