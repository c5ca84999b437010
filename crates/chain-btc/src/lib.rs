//! Bitcoin backend: UTXO transaction assembly, per-script-family signing,
//! explorer/node provider traits, fee estimation and record normalization.

pub mod address;
pub mod backend;
pub mod fee;
pub mod provider;
pub mod records;
pub mod transaction;

pub use address::AddressKind;
pub use backend::Bitcoin;
pub use provider::{AddrInfo, ApiEnvelope, BlockInfo, ExplorerApi, NodeRpc, TxInfo, TxPage};
pub use transaction::SignedBtcTx;
