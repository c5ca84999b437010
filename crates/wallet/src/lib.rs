//! Batteries-included facade over the chain backends.
//!
//! Pulls the capability trait, the shared descriptor types and both concrete
//! backends into one dependency, so an embedding application needs a single
//! crate in its manifest.

pub use keystore;
pub use wallet_core;

pub use chain_btc;
pub use chain_eth;

pub use chain_btc::Bitcoin;
pub use chain_eth::{EthToken, Ethereum};
pub use wallet_core::{
    check_block_range, AccountKeyMaterial, Chain, TransactionRecord, TxFrom, TxTo, UtxoRef,
    WalletError,
};
