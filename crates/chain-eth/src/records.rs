//! Record normalization: raw block transactions and ERC-20 transfer logs
//! flattened into chain-agnostic transfer records.

use wallet_core::units::from_base_units;
use wallet_core::TransactionRecord;

use crate::address::checksum_address;
use crate::provider::{EthBlock, TransferLog};
use crate::transaction;

/// Flattens a block's raw transactions into native-transfer records.
///
/// A transaction that fails to decode or whose sender cannot be recovered is
/// skipped rather than failing the whole block. Contract creations keep an
/// empty `to`.
pub fn native_records(symbol: &str, block: &EthBlock) -> Vec<TransactionRecord> {
    let mut out = Vec::new();
    for (index, raw) in block.transactions.iter().enumerate() {
        let decoded = match transaction::decode_transaction(raw) {
            Ok(tx) => tx,
            Err(e) => {
                log::debug!(
                    "skipping undecodable transaction {index} in block {}: {e}",
                    block.number
                );
                continue;
            }
        };
        let value = match from_base_units(&decoded.value.to_string(), 18) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("skipping transaction {}: {e}", decoded.tx_hash);
                continue;
            }
        };
        out.push(TransactionRecord {
            token_flag: symbol.to_string(),
            index: index as u64,
            from: checksum_address(&decoded.from),
            to: decoded.to.map(|a| checksum_address(&a)).unwrap_or_default(),
            value,
            block_hash: block.hash.clone(),
            tx_hash: decoded.tx_hash,
            block_number: block.number,
            time_stamp: block.timestamp,
            data: (!decoded.data.is_empty()).then_some(decoded.data),
            ..Default::default()
        });
    }
    out
}

/// Flattens transfer events into token records, reorg-removed logs excluded.
pub fn log_records(symbol: &str, decimals: u32, logs: &[TransferLog]) -> Vec<TransactionRecord> {
    let mut out = Vec::new();
    for log in logs {
        if log.removed {
            log::debug!("skipping removed transfer log {} in {}", log.log_index, log.tx_hash);
            continue;
        }
        let value = match from_base_units(&log.value.to_string(), decimals) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("skipping transfer log {}: {e}", log.tx_hash);
                continue;
            }
        };
        out.push(TransactionRecord {
            token_flag: symbol.to_string(),
            index: log.tx_index,
            log_index: log.log_index,
            from: log.from.clone(),
            to: log.to.clone(),
            value,
            block_hash: log.block_hash.clone(),
            tx_hash: log.tx_hash.clone(),
            block_number: log.block_number,
            time_stamp: 0,
            data: (!log.data.is_empty()).then(|| log.data.clone()),
        });
    }
    out
}
