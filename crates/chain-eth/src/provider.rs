//! Node-facing provider trait and its payload shapes.
//!
//! Everything here is exactly what the engine needs from a JSON-RPC node,
//! already parsed into native values. A concrete transport (HTTP, IPC, test
//! double) implements [`EthRpc`]; transport failures surface as
//! [`WalletError::Transport`] and pass through untouched.

use alloy_primitives::U256;

use wallet_core::WalletError;

/// An `eth_call`/`eth_estimateGas` request.
///
/// `to` is `None` for contract-creation simulations. `value` and `gas_price`
/// default node-side when absent.
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    pub from: String,
    pub to: Option<String>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
    pub data: Vec<u8>,
}

/// A block header plus the raw signed bytes of every transaction in it.
///
/// Carrying the RLP bytes rather than a parsed shape keeps the provider thin;
/// the engine decodes and recovers senders itself.
#[derive(Debug, Clone, Default)]
pub struct EthBlock {
    pub hash: String,
    pub number: u64,
    pub timestamp: i64,
    pub transactions: Vec<Vec<u8>>,
}

/// One ERC-20 `Transfer(address,address,uint256)` event as reported by
/// `eth_getLogs`, with the indexed topics already unpacked.
#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    pub from: String,
    pub to: String,
    pub value: U256,
    pub block_hash: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
    pub data: Vec<u8>,
    /// True when the log was reverted by a chain reorganization.
    pub removed: bool,
}

/// Blocking JSON-RPC surface of an Ethereum node.
pub trait EthRpc {
    fn chain_id(&self) -> Result<u64, WalletError>;

    /// Account balance in wei at `block`, or the pending state when `None`.
    fn balance(&self, addr: &str, block: Option<u64>) -> Result<U256, WalletError>;

    /// Next usable nonce, pending transactions included.
    fn pending_nonce(&self, addr: &str) -> Result<u64, WalletError>;

    fn gas_price(&self) -> Result<U256, WalletError>;

    fn estimate_gas(&self, call: &CallRequest) -> Result<u64, WalletError>;

    /// Executes a read-only contract call and returns the raw return data.
    fn call(&self, call: &CallRequest) -> Result<Vec<u8>, WalletError>;

    fn block_number(&self) -> Result<u64, WalletError>;

    fn block_by_number(&self, number: u64) -> Result<EthBlock, WalletError>;

    fn block_by_hash(&self, hash: &str) -> Result<EthBlock, WalletError>;

    /// Broadcasts raw signed bytes and returns the transaction hash.
    fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, WalletError>;

    /// Transfer events emitted by `contract` over an inclusive block range.
    fn transfer_logs(
        &self,
        contract: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferLog>, WalletError>;
}
