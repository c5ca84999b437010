use thiserror::Error;

/// Unified error taxonomy for all chain backends.
///
/// Every sufficiency check (`InsufficientFunds`) and key check (`KeyMismatch`,
/// `KeyNotFound`) fires locally, before any signing or network mutation, so a
/// failed call never leaves a partial transaction behind. `Transport` is an
/// opaque passthrough from the external provider; the engine never retries it.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("private key does not match address {0}")]
    KeyMismatch(String),

    #[error("no key available for address {0}")]
    KeyNotFound(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("keystore error: {0}")]
    Keystore(#[from] keystore::KeystoreError),

    #[error("transport error: {0}")]
    Transport(String),
}
