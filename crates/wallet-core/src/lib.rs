//! Chain-agnostic core of the multi-chain wallet engine.
//!
//! This crate holds everything the chain backends share:
//! - the [`chain::Chain`] capability trait every backend implements
//! - the transfer descriptor types ([`types::TxFrom`], [`types::TxTo`]) and
//!   the normalized [`types::TransactionRecord`]
//! - the lossless decimal/unit converter ([`units`])
//! - the unified [`error::WalletError`] taxonomy

pub mod chain;
pub mod error;
pub mod types;
pub mod units;

pub use chain::{check_block_range, Chain};
pub use error::WalletError;
pub use types::{AccountKeyMaterial, TransactionRecord, TxFrom, TxTo, UtxoRef};
