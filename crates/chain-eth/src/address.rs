//! Key and address handling: secp256k1 keypair generation, Keccak address
//! derivation and EIP-55 checksum encoding.

use alloy_primitives::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use zeroize::{Zeroize, Zeroizing};

use wallet_core::WalletError;

/// Generates a fresh random keypair.
///
/// Returns the EIP-55 checksummed address and the 0x-prefixed hex private
/// key, the latter wiped on drop.
pub fn alloc_keypair() -> Result<(String, Zeroizing<String>), WalletError> {
    let key = SigningKey::random(&mut rand::thread_rng());
    let addr = checksum_address(&address_of_key(key.verifying_key()));

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&key.to_bytes());
    let priv_hex = Zeroizing::new(format!("0x{}", hex::encode(bytes)));
    bytes.zeroize();

    Ok((addr, priv_hex))
}

/// Derives the checksummed address controlled by a hex private key.
pub fn derive_address(priv_hex: &str) -> Result<String, WalletError> {
    let key = signing_key(priv_hex)?;
    Ok(checksum_address(&address_of_key(key.verifying_key())))
}

/// Parses a hex private key (0x prefix optional) into a signing key.
///
/// The error never carries the offending material.
pub(crate) fn signing_key(priv_hex: &str) -> Result<SigningKey, WalletError> {
    let stripped = priv_hex.strip_prefix("0x").unwrap_or(priv_hex);
    let bytes = Zeroizing::new(
        hex::decode(stripped).map_err(|_| WalletError::Signing("private key is not hex".into()))?,
    );
    if bytes.len() != 32 {
        return Err(WalletError::Signing("private key must be 32 bytes".into()));
    }
    SigningKey::from_slice(&bytes)
        .map_err(|_| WalletError::Signing("private key is out of range".into()))
}

/// Address of a public key: the low 20 bytes of the Keccak-256 of the
/// uncompressed point, tag byte excluded.
pub(crate) fn address_of_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

/// EIP-55 mixed-case encoding: a hex letter is uppercased when the matching
/// nibble of the Keccak-256 of the lowercase hex address is 8 or above.
pub fn checksum_address(addr: &Address) -> String {
    let lower = hex::encode(addr.as_slice());
    let digest = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Accepts any 0x-prefixed 40-hex-digit string; mixed case carries no
/// meaning here, so a wrong EIP-55 checksum does not reject.
pub fn validate_address(addr: &str) -> bool {
    match addr.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parses an address string into its 20-byte form.
pub fn parse_address(addr: &str) -> Result<Address, WalletError> {
    if !validate_address(addr) {
        return Err(WalletError::InvalidAddress(addr.to_string()));
    }
    let bytes = hex::decode(&addr[2..]).map_err(|_| WalletError::InvalidAddress(addr.into()))?;
    Ok(Address::from_slice(&bytes))
}
