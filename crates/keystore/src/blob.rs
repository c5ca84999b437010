use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use zeroize::{Zeroize, Zeroizing};

use crate::error::KeystoreError;
use crate::kdf::derive_key;

/// AES-256-GCM nonce size in bytes.
const NONCE_SIZE: usize = 12;

/// Encrypts a plaintext private key into a hex blob.
///
/// The sealed payload is `salt || plaintext`; the salt prefix is what lets
/// [`decrypt_priv_key`] distinguish a wrong password from a valid blob. The
/// layout of the raw ciphertext is `[nonce (12 bytes) | ciphertext + tag]`,
/// hex-encoded as the final blob.
pub fn encrypt_priv_key(
    password: &str,
    salt: &str,
    plaintext: &str,
) -> Result<String, KeystoreError> {
    check_inputs(password, salt)?;
    let key = Zeroizing::new(derive_key(password, salt)?);

    let mut payload = Vec::with_capacity(salt.len() + plaintext.len());
    payload.extend_from_slice(salt.as_bytes());
    payload.extend_from_slice(plaintext.as_bytes());

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&*key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, payload.as_slice())
        .map_err(|e| KeystoreError::EncryptionFailed(e.to_string()))?;
    payload.zeroize();

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);

    Ok(hex::encode(output))
}

/// Decrypts a blob produced by [`encrypt_priv_key`] and strips the salt
/// prefix.
///
/// Returns the plaintext in a [`Zeroizing`] wrapper so it is wiped when the
/// caller drops it. A failed GCM authentication or a salt prefix that does
/// not match signals a wrong password or a corrupted blob.
pub fn decrypt_priv_key(
    password: &str,
    salt: &str,
    blob: &str,
) -> Result<Zeroizing<String>, KeystoreError> {
    check_inputs(password, salt)?;
    let raw = hex::decode(blob)
        .map_err(|e| KeystoreError::InvalidInput(format!("blob is not valid hex: {e}")))?;
    if raw.len() < NONCE_SIZE {
        return Err(KeystoreError::InvalidInput(format!(
            "blob too short: expected at least {} bytes, got {}",
            NONCE_SIZE,
            raw.len()
        )));
    }

    let key = Zeroizing::new(derive_key(password, salt)?);
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&*key));
    let mut payload = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| KeystoreError::WrongPassword)?;

    // The salt prefix must survive the round trip.
    if payload.len() < salt.len() || &payload[..salt.len()] != salt.as_bytes() {
        payload.zeroize();
        return Err(KeystoreError::WrongPassword);
    }

    let plaintext = String::from_utf8(payload[salt.len()..].to_vec());
    payload.zeroize();
    match plaintext {
        Ok(p) => Ok(Zeroizing::new(p)),
        Err(_) => Err(KeystoreError::WrongPassword),
    }
}

fn check_inputs(password: &str, salt: &str) -> Result<(), KeystoreError> {
    if password.is_empty() {
        return Err(KeystoreError::InvalidInput("password must not be empty".into()));
    }
    if salt.is_empty() {
        return Err(KeystoreError::InvalidInput("salt must not be empty".into()));
    }
    Ok(())
}
