//! Legacy transaction codec with EIP-155 replay protection: RLP assembly,
//! Keccak sighash, recoverable secp256k1 signing and sender recovery.

use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use wallet_core::WalletError;

use crate::address;

/// An unsigned transfer, `to: None` deploys a contract.
#[derive(Debug, Clone)]
pub struct EthTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    /// Transfer value in wei.
    pub value: U256,
    /// Calldata, empty for plain ETH transfers.
    pub data: Vec<u8>,
}

/// A signed transaction ready for broadcast, opaque between make and send.
#[derive(Debug, Clone)]
pub struct SignedEthTransaction {
    raw: Vec<u8>,
    tx_hash: String,
}

impl SignedEthTransaction {
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    /// Keccak-256 of the signed RLP, 0x-prefixed.
    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }
}

/// A transaction pulled off the wire, sender already recovered.
#[derive(Debug, Clone)]
pub struct DecodedTx {
    pub tx_hash: String,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub data: Vec<u8>,
    /// `None` for pre-replay-protection signatures (v of 27 or 28).
    pub chain_id: Option<u64>,
}

/// Signs a transaction under EIP-155: the sighash commits to the chain id,
/// and v encodes both the chain id and the recovery parity
/// (`35 + 2 * chain_id + parity`).
pub fn sign_transaction(
    tx: &EthTransaction,
    chain_id: u64,
    priv_hex: &str,
) -> Result<SignedEthTransaction, WalletError> {
    let key = address::signing_key(priv_hex)?;
    let digest = sighash(tx, Some(chain_id));

    let (signature, recovery): (Signature, RecoveryId) = key
        .sign_prehash(&digest)
        .map_err(|e| WalletError::Signing(e.to_string()))?;

    let v = 35 + 2 * chain_id + u64::from(recovery.is_y_odd());
    let signed = LegacyFields {
        nonce: tx.nonce,
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        to: tx_kind(tx.to),
        value: tx.value,
        data: Bytes::from(tx.data.clone()),
        v,
        r: U256::from_be_slice(&signature.r().to_bytes()),
        s: U256::from_be_slice(&signature.s().to_bytes()),
    };

    let mut raw = Vec::with_capacity(signed.length());
    signed.encode(&mut raw);

    let tx_hash = format!("0x{}", hex::encode(Keccak256::digest(&raw)));
    Ok(SignedEthTransaction { raw, tx_hash })
}

/// Decodes raw signed bytes and recovers the sender from the signature.
///
/// Accepts EIP-155 v values for any chain plus the historic 27/28 pair.
pub fn decode_transaction(raw: &[u8]) -> Result<DecodedTx, WalletError> {
    let mut buf = raw;
    let fields =
        LegacyFields::decode(&mut buf).map_err(|e| WalletError::Decode(e.to_string()))?;
    if !buf.is_empty() {
        return Err(WalletError::Decode("trailing bytes after transaction".into()));
    }

    let (chain_id, parity) = match fields.v {
        27 | 28 => (None, (fields.v - 27) as u8),
        v if v >= 35 => (Some((v - 35) / 2), ((v - 35) % 2) as u8),
        v => {
            return Err(WalletError::Decode(format!("invalid signature v {v}")));
        }
    };

    let tx = EthTransaction {
        nonce: fields.nonce,
        gas_price: fields.gas_price,
        gas_limit: fields.gas_limit,
        to: match fields.to {
            TxKind::Call(addr) => Some(addr),
            TxKind::Create => None,
        },
        value: fields.value,
        data: fields.data.to_vec(),
    };

    let digest = sighash(&tx, chain_id);
    let signature = Signature::from_scalars(
        fields.r.to_be_bytes::<32>(),
        fields.s.to_be_bytes::<32>(),
    )
    .map_err(|e| WalletError::Decode(e.to_string()))?;
    let recovery = RecoveryId::from_byte(parity)
        .ok_or_else(|| WalletError::Decode("invalid recovery parity".into()))?;
    let sender = VerifyingKey::recover_from_prehash(&digest, &signature, recovery)
        .map_err(|e| WalletError::Decode(format!("sender recovery failed: {e}")))?;

    Ok(DecodedTx {
        tx_hash: format!("0x{}", hex::encode(Keccak256::digest(raw))),
        from: address::address_of_key(&sender),
        to: tx.to,
        value: tx.value,
        nonce: tx.nonce,
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        data: tx.data,
        chain_id,
    })
}

/// Keccak-256 of the unsigned RLP. With a chain id the list carries the
/// EIP-155 trailer `[chain_id, 0, 0]`; without it, the six-field historic
/// form.
fn sighash(tx: &EthTransaction, chain_id: Option<u64>) -> [u8; 32] {
    let mut encoded = Vec::new();
    match chain_id {
        Some(id) => Eip155Unsigned {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: tx_kind(tx.to),
            value: tx.value,
            data: Bytes::from(tx.data.clone()),
            chain_id: id,
            zero_r: 0,
            zero_s: 0,
        }
        .encode(&mut encoded),
        None => LegacyUnsigned {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: tx_kind(tx.to),
            value: tx.value,
            data: Bytes::from(tx.data.clone()),
        }
        .encode(&mut encoded),
    }
    Keccak256::digest(&encoded).into()
}

fn tx_kind(to: Option<Address>) -> TxKind {
    match to {
        Some(addr) => TxKind::Call(addr),
        None => TxKind::Create,
    }
}

#[derive(RlpEncodable, RlpDecodable)]
struct LegacyFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: TxKind,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

#[derive(RlpEncodable)]
struct Eip155Unsigned {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: TxKind,
    value: U256,
    data: Bytes,
    chain_id: u64,
    zero_r: u8,
    zero_s: u8,
}

#[derive(RlpEncodable)]
struct LegacyUnsigned {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: TxKind,
    value: U256,
    data: Bytes,
}
