//! Private-key-at-rest encryption for the multi-chain wallet.
//!
//! A key blob is the hex encoding of AES-256-GCM ciphertext over
//! `salt || plaintext`, keyed by an Argon2id-derived key. Decryption strips
//! and verifies the salt prefix, so a wrong password or a corrupted blob is
//! detected before the plaintext is ever handed back.

pub mod blob;
pub mod error;
pub mod kdf;

pub use blob::{decrypt_priv_key, encrypt_priv_key};
pub use error::KeystoreError;
