//! Ethereum backend: account-model transfers, EIP-155 legacy signing,
//! ERC-20 delegated spend, an RPC provider trait and record normalization.

pub mod abi;
pub mod address;
pub mod backend;
pub mod provider;
pub mod records;
pub mod token;
pub mod transaction;

pub use abi::DecodedCall;
pub use backend::Ethereum;
pub use provider::{CallRequest, EthBlock, EthRpc, TransferLog};
pub use token::EthToken;
pub use transaction::{DecodedTx, SignedEthTransaction};
