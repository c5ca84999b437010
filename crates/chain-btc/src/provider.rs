//! Provider boundary: traits for the block-explorer REST API and the node
//! JSON-RPC, plus the serde shapes their responses deserialize into.
//!
//! Transport (HTTP, auth, retries) lives entirely behind these traits; the
//! backend only sees decoded values or a [`WalletError::Transport`]
//! passthrough.

use serde::{Deserialize, Serialize};

use wallet_core::WalletError;

/// Paged block-explorer REST API (btc.com wire shapes).
pub trait ExplorerApi {
    fn address_info(&self, addr: &str) -> Result<AddrInfo, WalletError>;
    fn latest_block(&self) -> Result<BlockInfo, WalletError>;
    fn block_by_number(&self, height: u64) -> Result<BlockInfo, WalletError>;
    fn block_by_hash(&self, hash: &str) -> Result<BlockInfo, WalletError>;
    fn transaction(&self, txid: &str) -> Result<TxInfo, WalletError>;
    /// One page of a block's transactions; pages are 1-based.
    fn block_transactions(&self, height: u64, page: u64) -> Result<TxPage, WalletError>;
    /// Publishes a raw transaction, returns the txid.
    fn broadcast(&self, raw_hex: &str) -> Result<String, WalletError>;
}

/// Bitcoin Core JSON-RPC subset used by this backend.
pub trait NodeRpc {
    /// `estimatesmartfee`: BTC per kvB for confirmation within `conf_target`
    /// blocks.
    fn estimate_smart_fee(&self, conf_target: u16) -> Result<f64, WalletError>;
    /// Legacy `estimatefee`, kept for nodes that predate the smart variant.
    fn estimate_fee(&self, conf_target: u16) -> Result<f64, WalletError>;
    /// `sendrawtransaction`: broadcasts and returns the txid.
    fn send_raw_transaction(&self, raw_hex: &str) -> Result<String, WalletError>;
}

/// Response envelope every explorer endpoint wraps its payload in.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub err_no: i64,
    #[serde(default)]
    pub err_msg: String,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload, mapping a nonzero `err_no` to `Transport`.
    pub fn into_result(self) -> Result<T, WalletError> {
        if self.err_no != 0 {
            return Err(WalletError::Transport(self.err_msg));
        }
        self.data
            .ok_or_else(|| WalletError::Decode("envelope carried no data".into()))
    }
}

/// `/address/<addr>` payload; amounts are satoshi.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddrInfo {
    pub address: String,
    #[serde(default)]
    pub received: i64,
    #[serde(default)]
    pub sent: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub unconfirmed_tx_count: u64,
}

/// `/block/<height|hash|latest>` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub hash: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub reward_block: u64,
    #[serde(default)]
    pub reward_fees: u64,
    #[serde(default)]
    pub confirmations: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(default)]
    pub prev_addresses: Vec<String>,
    #[serde(default)]
    pub prev_position: i64,
    #[serde(default)]
    pub prev_tx_hash: String,
    #[serde(default)]
    pub prev_value: i64,
    #[serde(default)]
    pub sequence: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub value: i64,
    /// Script class as reported by the explorer, e.g. `P2PKH`, `NULL_DATA`,
    /// `P2WPKH_V0`.
    #[serde(rename = "type", default)]
    pub pay_type: String,
    #[serde(default)]
    pub script_hex: String,
}

/// `/tx/<txid>?verbose=3` payload. `block_height` is -1 while unconfirmed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxInfo {
    pub hash: String,
    #[serde(default)]
    pub block_height: i64,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub block_time: i64,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub lock_time: u32,
    #[serde(default)]
    pub is_coinbase: bool,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub size: u64,
}

/// `/block/<height>/tx?page=<n>` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub pagesize: u64,
    #[serde(default)]
    pub list: Vec<TxInfo>,
}
