use crate::error::WalletError;
use crate::types::{AccountKeyMaterial, TransactionRecord, TxFrom, TxTo};

/// Capability contract implemented by every chain backend.
///
/// The associated types pin each backend's payloads at compile time (block
/// shape, signed-transaction shape, per-call parameters), so a caller can
/// never hand a Bitcoin descriptor pair to an Ethereum backend. Delegated
/// spend is the one genuinely optional capability: the default
/// implementations fail with [`WalletError::Unsupported`], and only backends
/// that really support the `approve`/`transferFrom` pattern override them.
///
/// All operations are synchronous blocking calls; network transport lives
/// behind the backend's provider handle and its errors pass through as
/// [`WalletError::Transport`] untouched.
pub trait Chain {
    /// Chain-native block representation.
    type Block;
    /// Chain-native signed transaction, opaque between make and send.
    type SignedTx;
    /// Per-chain account-allocation parameter (Bitcoin: address family).
    type AccountParams;
    /// Per-chain transaction parameter (Bitcoin: lock time; Ethereum: gas
    /// limit).
    type TxParams;
    /// Per-chain fee-estimation parameter.
    type FeeParams;

    // Identity.
    fn chain_name(&self) -> &'static str;
    fn coin_name(&self) -> String;
    fn symbol(&self) -> String;
    fn decimals(&self) -> u32;
    /// Total supply in human units; `"0"` where the chain has no fixed cap.
    fn total_supply(&self) -> String;

    // Account.
    fn alloc_account(
        &self,
        password: &str,
        salt: &str,
        params: Self::AccountParams,
    ) -> Result<AccountKeyMaterial, WalletError>;
    fn is_valid_account(&self, addr: &str) -> bool;
    /// Balance in human units at `block`, or the latest state when `None`.
    fn balance_of(&self, addr: &str, block: Option<u64>) -> Result<String, WalletError>;

    // Block.
    fn last_block_number(&self) -> Result<u64, WalletError>;
    fn block_by_number(&self, number: u64) -> Result<Self::Block, WalletError>;
    fn block_by_hash(&self, hash: &str) -> Result<Self::Block, WalletError>;

    // Transaction.
    fn transaction(
        &self,
        tx_hash: &str,
        block_hash: &str,
    ) -> Result<Vec<TransactionRecord>, WalletError>;
    fn transactions_in_blocks(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, WalletError>;
    fn make_transaction(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        params: Self::TxParams,
    ) -> Result<Self::SignedTx, WalletError>;
    /// Broadcasts a signed transaction and returns its hash.
    fn send_transaction(&self, tx: &Self::SignedTx) -> Result<String, WalletError>;

    // Delegated spend (ERC-20 approve/transferFrom pattern).
    fn approve_agent(
        &self,
        _owner: &TxFrom,
        _agent: &TxTo,
    ) -> Result<Self::SignedTx, WalletError> {
        Err(WalletError::Unsupported("approve_agent"))
    }
    fn make_agent_transaction(
        &self,
        _owner: &str,
        _agent: &[TxFrom],
        _to: &[TxTo],
        _params: Self::TxParams,
    ) -> Result<Self::SignedTx, WalletError> {
        Err(WalletError::Unsupported("make_agent_transaction"))
    }
    fn allowance(&self, _owner: &str, _agent: &str) -> Result<String, WalletError> {
        Err(WalletError::Unsupported("allowance"))
    }

    // Fee.
    /// Returns the estimated fee in human units plus the chain's cost basis
    /// (serialized byte size for Bitcoin, gas limit for Ethereum).
    fn estimate_fee(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        params: Self::FeeParams,
    ) -> Result<(String, u64), WalletError>;

    fn is_token(&self) -> bool {
        false
    }
}

/// Validates an inclusive block range; shared by every range scan.
pub fn check_block_range(from: u64, to: u64) -> Result<(), WalletError> {
    if from > to {
        return Err(WalletError::InvalidParams(format!(
            "block range start {from} is after end {to}"
        )));
    }
    Ok(())
}
