use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};

use crate::error::KeystoreError;

/// Derives a 32-byte AES key from `password` and the caller's salt string
/// using Argon2id.
///
/// The wallet salt is free-form text, so it is widened to the 16-byte KDF
/// salt by hashing: `SHA-256(salt)[..16]`.
///
/// Argon2id parameters: 64 MiB memory, 3 iterations, 4 lanes, 32-byte output.
pub fn derive_key(password: &str, salt: &str) -> Result<[u8; 32], KeystoreError> {
    let params = Params::new(65536, 3, 4, Some(32))
        .map_err(|e| KeystoreError::KdfFailed(format!("invalid argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let kdf_salt = widen_salt(salt);
    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), &kdf_salt, &mut output)
        .map_err(|e| KeystoreError::KdfFailed(format!("argon2 hash failed: {e}")))?;

    Ok(output)
}

fn widen_salt(salt: &str) -> [u8; 16] {
    let digest = Sha256::digest(salt.as_bytes());
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}
