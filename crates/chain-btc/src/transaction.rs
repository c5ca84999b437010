use bitcoin::absolute::LockTime;
use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, CompressedPublicKey, Network, OutPoint, PrivateKey, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
};

use wallet_core::units::to_base_units;
use wallet_core::{TxFrom, WalletError};

/// 21 million coins in satoshi; no single output may reach it.
const MAX_MONEY_SAT: u64 = 21_000_000 * 100_000_000;

/// A fully signed transaction, opaque between make and send.
#[derive(Debug, Clone)]
pub struct SignedBtcTx {
    pub tx: Transaction,
}

impl SignedBtcTx {
    /// Consensus-serialized wire bytes, witness included.
    pub fn raw_bytes(&self) -> Vec<u8> {
        bitcoin::consensus::serialize(&self.tx)
    }

    pub fn raw_hex(&self) -> String {
        hex::encode(self.raw_bytes())
    }

    pub fn txid(&self) -> String {
        self.tx.compute_txid().to_string()
    }
}

/// Resolves the signing key for an input address from the caller-supplied
/// descriptor list.
struct TxSecrets<'a> {
    inputs: &'a [TxFrom],
}

impl TxSecrets<'_> {
    fn resolve(&self, addr: &str) -> Result<PrivateKey, WalletError> {
        let from = self
            .inputs
            .iter()
            .find(|f| f.address == addr)
            .ok_or_else(|| WalletError::KeyNotFound(addr.to_string()))?;
        let wif = from
            .private_key
            .as_ref()
            .ok_or_else(|| WalletError::KeyNotFound(addr.to_string()))?;
        PrivateKey::from_wif(wif)
            .map_err(|e| WalletError::InvalidParams(format!("bad WIF private key: {e}")))
    }
}

fn parse_checked(addr: &str, network: Network) -> Result<Address, WalletError> {
    addr.parse::<Address<NetworkUnchecked>>()
        .map_err(|e| WalletError::InvalidAddress(format!("{addr}: {e}")))?
        .require_network(network)
        .map_err(|_| WalletError::InvalidAddress(format!("{addr} is for the wrong network")))
}

fn output_sats(value: &str) -> Result<u64, WalletError> {
    let base = to_base_units(value, 8)?;
    let sats: u64 = base
        .parse()
        .map_err(|_| WalletError::InvalidNumber(format!("amount out of range: {value}")))?;
    if sats == 0 || sats >= MAX_MONEY_SAT {
        return Err(WalletError::InvalidNumber(format!(
            "invalid amount: {value}"
        )));
    }
    Ok(sats)
}

/// Assembles an unsigned transaction: one input per source descriptor, one
/// output per destination.
///
/// Every input must name the prior output it spends. Destinations are
/// network-checked and restricted to the P2PKH/P2SH/P2WPKH script families.
/// No change output is ever synthesized; callers pre-balance inputs, outputs
/// and the intended fee themselves. A nonzero `lock_time` marks every input
/// sequence non-final so the lock can take effect.
pub fn build_transaction(
    from: &[TxFrom],
    to: &[wallet_core::TxTo],
    lock_time: Option<u32>,
    network: Network,
) -> Result<Transaction, WalletError> {
    if from.is_empty() || to.is_empty() {
        return Err(WalletError::InvalidParams(
            "at least one input and one output are required".into(),
        ));
    }
    let lock = lock_time.unwrap_or(0);

    let mut inputs = Vec::with_capacity(from.len());
    for f in from {
        let utxo = f.utxo.as_ref().ok_or_else(|| {
            WalletError::InvalidParams(format!("input {} names no prior output", f.address))
        })?;
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| WalletError::InvalidParams(format!("bad txid {}: {e}", utxo.txid)))?;
        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.index),
            script_sig: ScriptBuf::new(),
            sequence: if lock != 0 {
                Sequence::ENABLE_LOCKTIME_NO_RBF
            } else {
                Sequence::MAX
            },
            witness: Witness::default(),
        });
    }

    let mut outputs = Vec::with_capacity(to.len());
    for t in to {
        let sats = output_sats(&t.value)?;
        let addr = parse_checked(&t.address, network)?;
        let script = addr.script_pubkey();
        if !(script.is_p2pkh() || script.is_p2sh() || script.is_p2wpkh()) {
            return Err(WalletError::InvalidAddress(format!(
                "unsupported destination script for {}",
                t.address
            )));
        }
        outputs.push(TxOut {
            value: Amount::from_sat(sats),
            script_pubkey: script,
        });
    }

    Ok(Transaction {
        version: Version::ONE,
        lock_time: if lock != 0 {
            LockTime::from_consensus(lock)
        } else {
            LockTime::ZERO
        },
        input: inputs,
        output: outputs,
    })
}

/// Signs every input, dispatching on the spent output's script family.
///
/// P2SH sources are treated as nested P2SH-P2WPKH (redeem-script push plus a
/// BIP143 witness), native P2WPKH gets the witness alone, and anything else
/// takes the legacy signature-script path. Each resolved key must derive the
/// claimed input address; a mismatch aborts before any signature is produced.
pub fn sign_transaction(
    unsigned: &Transaction,
    from: &[TxFrom],
    network: Network,
) -> Result<SignedBtcTx, WalletError> {
    if unsigned.input.len() != from.len() {
        return Err(WalletError::InvalidParams(
            "input count does not match source descriptors".into(),
        ));
    }
    let secp = Secp256k1::new();
    let secrets = TxSecrets { inputs: from };
    let mut signed = unsigned.clone();
    let mut cache = SighashCache::new(unsigned);

    for (i, f) in from.iter().enumerate() {
        let addr = parse_checked(&f.address, network)?;
        let prev_script = addr.script_pubkey();
        let key = secrets.resolve(&f.address)?;
        let pubkey = key.public_key(&secp);

        if prev_script.is_p2sh() {
            let compressed = CompressedPublicKey::try_from(pubkey)
                .map_err(|_| WalletError::KeyMismatch(f.address.clone()))?;
            if Address::p2shwpkh(&compressed, network) != addr {
                return Err(WalletError::KeyMismatch(f.address.clone()));
            }
            let redeem = ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash());
            let value = input_value(f)?;
            let sighash = cache
                .p2wpkh_signature_hash(i, &redeem, value, EcdsaSighashType::All)
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let sig = der_sig(&secp, &key, sighash.to_byte_array());

            let redeem_push = PushBytesBuf::try_from(redeem.to_bytes())
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            signed.input[i].script_sig = Builder::new().push_slice(redeem_push).into_script();
            signed.input[i].witness = witness_stack(&sig, &compressed.to_bytes());
        } else if prev_script.is_p2wpkh() {
            let compressed = CompressedPublicKey::try_from(pubkey)
                .map_err(|_| WalletError::KeyMismatch(f.address.clone()))?;
            if Address::p2wpkh(&compressed, network) != addr {
                return Err(WalletError::KeyMismatch(f.address.clone()));
            }
            let script_code = ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash());
            let value = input_value(f)?;
            let sighash = cache
                .p2wpkh_signature_hash(i, &script_code, value, EcdsaSighashType::All)
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let sig = der_sig(&secp, &key, sighash.to_byte_array());
            signed.input[i].witness = witness_stack(&sig, &compressed.to_bytes());
        } else if prev_script.is_p2pkh() {
            if Address::p2pkh(&pubkey, network) != addr {
                return Err(WalletError::KeyMismatch(f.address.clone()));
            }
            let sighash = cache
                .legacy_signature_hash(i, &prev_script, EcdsaSighashType::All.to_u32())
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let sig = der_sig(&secp, &key, sighash.to_byte_array());

            let sig_push = PushBytesBuf::try_from(sig)
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let key_push = PushBytesBuf::try_from(pubkey.to_bytes())
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            signed.input[i].script_sig = Builder::new()
                .push_slice(sig_push)
                .push_slice(key_push)
                .into_script();
        } else {
            return Err(WalletError::InvalidAddress(format!(
                "unsupported source script for {}",
                f.address
            )));
        }
    }

    Ok(SignedBtcTx { tx: signed })
}

/// Witness signing commits to the exact spent value, so the descriptor must
/// carry it.
fn input_value(f: &TxFrom) -> Result<Amount, WalletError> {
    let amount = f.amount.as_ref().ok_or_else(|| {
        WalletError::InvalidParams(format!("input {} carries no spent value", f.address))
    })?;
    Ok(Amount::from_sat(output_sats(amount)?))
}

fn der_sig(
    secp: &Secp256k1<bitcoin::secp256k1::All>,
    key: &PrivateKey,
    digest: [u8; 32],
) -> Vec<u8> {
    let msg = Message::from_digest(digest);
    let mut sig = secp.sign_ecdsa(&msg, &key.inner).serialize_der().to_vec();
    sig.push(EcdsaSighashType::All as u8);
    sig
}

fn witness_stack(sig: &[u8], pubkey: &[u8]) -> Witness {
    let mut witness = Witness::new();
    witness.push(sig);
    witness.push(pubkey);
    witness
}
