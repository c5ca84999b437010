use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{CompressedPublicKey, Network, PrivateKey};
use zeroize::Zeroizing;

use wallet_core::WalletError;

/// The three supported address/script families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Base58Check pay-to-pubkey-hash (`1...` / `m`/`n...`).
    Legacy,
    /// Base58Check P2SH wrapping a P2WPKH redeem script (`3...` / `2...`).
    P2shSegwit,
    /// Native segwit v0 pay-to-witness-pubkey-hash (`bc1q...` / `tb1q...`).
    Bech32,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Legacy => "legacy",
            AddressKind::P2shSegwit => "p2sh-segwit",
            AddressKind::Bech32 => "bech32",
        }
    }
}

/// Generates a fresh keypair and derives the address of the requested family.
///
/// Returns the address and the WIF-encoded private key. The WIF carries the
/// network and compression flag, so the same string round-trips through
/// [`derive_address`] to the same address.
pub fn alloc_keypair(
    kind: AddressKind,
    network: Network,
    compressed: bool,
) -> Result<(String, Zeroizing<String>), WalletError> {
    let secret = bitcoin::secp256k1::SecretKey::new(&mut bitcoin::secp256k1::rand::thread_rng());
    let key = PrivateKey {
        compressed,
        network: network.into(),
        inner: secret,
    };
    let wif = Zeroizing::new(key.to_wif());
    let addr = derive_address(&wif, kind, network)?;
    Ok((addr, wif))
}

/// Derives the address of the given family from a WIF private key.
///
/// Each family has its own derivation; the caller picks exactly one. The
/// segwit families require a compressed key, so an uncompressed WIF is
/// rejected for them.
pub fn derive_address(
    wif: &str,
    kind: AddressKind,
    network: Network,
) -> Result<String, WalletError> {
    let key = PrivateKey::from_wif(wif)
        .map_err(|e| WalletError::InvalidParams(format!("bad WIF private key: {e}")))?;
    if key.network != network.into() {
        return Err(WalletError::InvalidParams(
            "private key is for a different network".into(),
        ));
    }
    let secp = Secp256k1::new();
    let pubkey = key.public_key(&secp);

    let addr = match kind {
        AddressKind::Legacy => Address::p2pkh(&pubkey, network),
        AddressKind::P2shSegwit => {
            let compressed = CompressedPublicKey::try_from(pubkey).map_err(|_| {
                WalletError::InvalidParams(
                    "p2sh-segwit addresses require a compressed key".into(),
                )
            })?;
            Address::p2shwpkh(&compressed, network)
        }
        AddressKind::Bech32 => {
            let compressed = CompressedPublicKey::try_from(pubkey).map_err(|_| {
                WalletError::InvalidParams("bech32 addresses require a compressed key".into())
            })?;
            Address::p2wpkh(&compressed, network)
        }
    };
    Ok(addr.to_string())
}

/// Full-decode address validation under the configured network.
///
/// Cross-network addresses are invalid, not merely suspicious.
pub fn validate_address(addr: &str, network: Network) -> bool {
    if addr.is_empty() {
        return false;
    }
    match addr.parse::<Address<NetworkUnchecked>>() {
        Ok(parsed) => parsed.is_valid_for_network(network),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic derivation vectors, one per family (testnet).
    const WIF_LEGACY: &str = "cRkzCe5a5mubPHdnrNNBExsxj46NPJSNypVknKRCebQq72jgto97";
    const WIF_P2SH: &str = "cN4pjWkdGZfjQ6p5bgjTKPJTKt3kTGn33hSY8THs3XLPGWgRC2vc";
    const WIF_BECH32: &str = "cPNuBTZztqXvk1JEyDEngRqbzyHh54rK4Ph2djP79ULCRYLwvTRb";

    #[test]
    fn legacy_derivation_vector() {
        let addr = derive_address(WIF_LEGACY, AddressKind::Legacy, Network::Testnet).unwrap();
        assert_eq!(addr, "n3dquXGC7y46H9JvDMZ4zVtqygsLXJqaRT");
    }

    #[test]
    fn p2sh_segwit_derivation_vector() {
        let addr = derive_address(WIF_P2SH, AddressKind::P2shSegwit, Network::Testnet).unwrap();
        assert_eq!(addr, "2N2fjVuY29MNeb7bA7PLg7uyZrCCnyQU22b");
    }

    #[test]
    fn bech32_derivation_vector() {
        let addr = derive_address(WIF_BECH32, AddressKind::Bech32, Network::Testnet).unwrap();
        assert_eq!(addr, "tb1q3w4ealuv2ptyccm5ntawn9n7td7km0ydy3079j");
    }

    #[test]
    fn families_never_collide_for_one_key() {
        let legacy = derive_address(WIF_LEGACY, AddressKind::Legacy, Network::Testnet).unwrap();
        let p2sh = derive_address(WIF_LEGACY, AddressKind::P2shSegwit, Network::Testnet).unwrap();
        let bech32 = derive_address(WIF_LEGACY, AddressKind::Bech32, Network::Testnet).unwrap();
        assert_ne!(legacy, p2sh);
        assert_ne!(legacy, bech32);
        assert_ne!(p2sh, bech32);
    }

    #[test]
    fn alloc_keypair_roundtrips_through_derive() {
        for kind in [AddressKind::Legacy, AddressKind::P2shSegwit, AddressKind::Bech32] {
            let (addr, wif) = alloc_keypair(kind, Network::Testnet, true).unwrap();
            let again = derive_address(&wif, kind, Network::Testnet).unwrap();
            assert_eq!(addr, again, "family {}", kind.as_str());
        }
    }

    #[test]
    fn alloc_keypair_is_randomized() {
        let (a, _) = alloc_keypair(AddressKind::Bech32, Network::Testnet, true).unwrap();
        let (b, _) = alloc_keypair(AddressKind::Bech32, Network::Testnet, true).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_network_wif_is_rejected() {
        let err = derive_address(WIF_LEGACY, AddressKind::Legacy, Network::Bitcoin);
        assert!(matches!(err, Err(WalletError::InvalidParams(_))));
    }

    #[test]
    fn validate_accepts_all_families() {
        assert!(validate_address(
            "n3dquXGC7y46H9JvDMZ4zVtqygsLXJqaRT",
            Network::Testnet
        ));
        assert!(validate_address(
            "2N2fjVuY29MNeb7bA7PLg7uyZrCCnyQU22b",
            Network::Testnet
        ));
        assert!(validate_address(
            "tb1q3w4ealuv2ptyccm5ntawn9n7td7km0ydy3079j",
            Network::Testnet
        ));
    }

    #[test]
    fn validate_rejects_cross_network() {
        assert!(!validate_address(
            "tb1q3w4ealuv2ptyccm5ntawn9n7td7km0ydy3079j",
            Network::Bitcoin
        ));
        assert!(!validate_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            Network::Testnet
        ));
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(!validate_address("", Network::Testnet));
        assert!(!validate_address("notanaddress!!!", Network::Testnet));
    }
}
