//! Fee estimation: a current fee-per-byte figure times the serialized size
//! of a signed dummy transaction.

use bitcoin::{Amount, Network};

use wallet_core::units::from_base_units;
use wallet_core::{TxFrom, TxTo, WalletError};

use crate::provider::{ExplorerApi, NodeRpc};
use crate::transaction;

/// Confirmation target handed to the node fee RPCs.
const CONF_TARGET: u16 = 1;

/// Resolves the current fee rate in satoshi per byte.
///
/// With a node attached, `estimatesmartfee` is primary; a "Method not found"
/// answer means an old node, so the legacy `estimatefee` takes over. Without
/// a node the latest block's own fee density (total fees over block size)
/// stands in.
pub fn resolve_fee_rate(
    api: &dyn ExplorerApi,
    rpc: Option<&dyn NodeRpc>,
) -> Result<u64, WalletError> {
    let rate = match rpc {
        Some(node) => {
            let btc_per_kvb = match node.estimate_smart_fee(CONF_TARGET) {
                Ok(rate) => rate,
                Err(WalletError::Transport(msg)) if msg.contains("Method not found") => {
                    log::warn!("estimatesmartfee unavailable, falling back to estimatefee");
                    node.estimate_fee(CONF_TARGET)?
                }
                Err(e) => return Err(e),
            };
            sat_per_byte(btc_per_kvb)?
        }
        None => {
            let blk = api.latest_block()?;
            if blk.size == 0 {
                return Err(WalletError::Transport(
                    "latest block reports zero size".into(),
                ));
            }
            blk.reward_fees / blk.size
        }
    };
    if rate == 0 {
        return Err(WalletError::InvalidParams("fee-per-byte is invalid".into()));
    }
    Ok(rate)
}

/// Builds and signs a throwaway transaction to measure the exact wire size,
/// witness bytes included, then prices it at `fee_rate` sat/B.
///
/// Returns the fee in BTC and the measured size in bytes.
pub fn estimate_fee(
    from: &[TxFrom],
    to: &[TxTo],
    fee_rate: u64,
    network: Network,
) -> Result<(String, u64), WalletError> {
    let unsigned = transaction::build_transaction(from, to, None, network)?;
    let signed = transaction::sign_transaction(&unsigned, from, network)?;
    let size = signed.raw_bytes().len() as u64;
    let sats = size
        .checked_mul(fee_rate)
        .ok_or_else(|| WalletError::InvalidNumber("fee overflows".into()))?;
    let fee = from_base_units(&sats.to_string(), 8)?;
    Ok((fee, size))
}

/// BTC-per-kvB (the node RPC unit) to whole satoshi per byte.
fn sat_per_byte(btc_per_kvb: f64) -> Result<u64, WalletError> {
    let amount = Amount::from_btc(btc_per_kvb)
        .map_err(|e| WalletError::InvalidNumber(format!("bad fee rate: {e}")))?;
    Ok(amount.to_sat() / 1000)
}
