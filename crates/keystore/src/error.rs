use thiserror::Error;

/// Keystore operation errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("key derivation failed: {0}")]
    KdfFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("wrong password or corrupted key blob")]
    WrongPassword,
}
