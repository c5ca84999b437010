//! Normalizes explorer transaction shapes into [`TransactionRecord`]s.

use bitcoin::address::Address;
use bitcoin::{Network, WitnessProgram, WitnessVersion};

use wallet_core::units::from_base_units;
use wallet_core::{TransactionRecord, WalletError};

use crate::provider::{ExplorerApi, TxInfo};

/// One record per spendable output of `tx`.
///
/// Data-carrier (`NULL_DATA`), multisig and multi-address outputs have no
/// single recipient and are skipped. Explorers return P2WPKH/P2WSH
/// recipients as raw hex witness programs; those are re-encoded to bech32.
/// Individually malformed outputs are skipped rather than aborting the scan.
pub fn records_from_tx(
    symbol: &str,
    tx: &TxInfo,
    block_hash: &str,
    network: Network,
) -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    for (index, out) in tx.outputs.iter().enumerate() {
        if out.pay_type == "NULL_DATA" || out.pay_type.ends_with("_MULTISIG") {
            continue;
        }
        if out.addresses.len() != 1 {
            continue;
        }
        let value = match from_base_units(&out.value.to_string(), 8) {
            Ok(v) => v,
            Err(_) => {
                log::debug!("skipping output {index} of {}: bad value", tx.hash);
                continue;
            }
        };
        let mut to = out.addresses[0].clone();
        if out.pay_type.starts_with("P2WPKH") || out.pay_type.starts_with("P2WSH") {
            to = match witness_program_to_bech32(&to, network) {
                Ok(addr) => addr,
                Err(_) => {
                    log::debug!("skipping output {index} of {}: bad witness program", tx.hash);
                    continue;
                }
            };
        }
        records.push(TransactionRecord {
            token_flag: symbol.to_string(),
            index: index as u64,
            to,
            value,
            block_hash: block_hash.to_string(),
            tx_hash: tx.hash.clone(),
            block_number: tx.block_height.max(0) as u64,
            time_stamp: tx.block_time,
            ..Default::default()
        });
    }
    records
}

/// Walks a block's transaction pages until the explorer returns a short page.
pub fn block_records(
    api: &dyn ExplorerApi,
    symbol: &str,
    height: u64,
    network: Network,
) -> Result<Vec<TransactionRecord>, WalletError> {
    let mut records = Vec::new();
    let mut page = 1;
    loop {
        let batch = api.block_transactions(height, page)?;
        for tx in &batch.list {
            records.extend(records_from_tx(symbol, tx, &tx.block_hash, network));
        }
        // A zero page size can never yield a short page; end the walk there
        // too instead of paging forever.
        if batch.pagesize == 0 || batch.pagesize > batch.list.len() as u64 {
            break;
        }
        page += 1;
    }
    Ok(records)
}

fn witness_program_to_bech32(raw_hex: &str, network: Network) -> Result<String, WalletError> {
    let bytes = hex::decode(raw_hex).map_err(|e| WalletError::Decode(e.to_string()))?;
    let program = WitnessProgram::new(WitnessVersion::V0, &bytes)
        .map_err(|e| WalletError::Decode(e.to_string()))?;
    Ok(Address::from_witness_program(program, network).to_string())
}
