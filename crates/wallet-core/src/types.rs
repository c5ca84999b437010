use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Reference to a prior transaction output being spent (Bitcoin only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoRef {
    /// Hash of the funding transaction, hex display order.
    pub txid: String,
    /// Output index within the funding transaction.
    pub index: u32,
}

/// Source descriptor for one transfer input.
///
/// The plaintext private key is present only for the duration of a signing
/// call; the `Zeroizing` wrapper wipes it as soon as the descriptor is
/// dropped. `utxo` and `amount` are Bitcoin-specific: the amount is required
/// because witness-input signature hashing commits to the exact spent value.
#[derive(Debug, Clone)]
pub struct TxFrom {
    /// Source address in chain-native encoding.
    pub address: String,
    /// Plaintext private key (WIF for Bitcoin, hex for Ethereum), signing
    /// calls only.
    pub private_key: Option<Zeroizing<String>>,
    /// The prior output this input spends.
    pub utxo: Option<UtxoRef>,
    /// Decimal value of the spent output, human units.
    pub amount: Option<String>,
}

impl TxFrom {
    /// Descriptor carrying only an address, for queries and fee estimation.
    pub fn address_only(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            private_key: None,
            utxo: None,
            amount: None,
        }
    }
}

/// Destination descriptor: address plus decimal amount in human units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxTo {
    pub address: String,
    pub value: String,
}

impl TxTo {
    pub fn new(address: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            value: value.into(),
        }
    }
}

/// A freshly allocated account: the address and the keystore-encrypted
/// private key. The plaintext key is never part of the persisted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKeyMaterial {
    pub address: String,
    pub encrypted_key: String,
}

/// Normalized chain-agnostic transfer event.
///
/// The serialized shape is the external contract:
/// `{token_flag, from, to, value, hash, tx_hash, blk_num, time_stamp}`.
/// Transaction/log indices and the chain-specific payload are internal only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub token_flag: String,
    /// Transaction index within its block.
    #[serde(skip)]
    pub index: u64,
    /// Log index (ERC-20 events only).
    #[serde(skip)]
    pub log_index: u64,
    pub from: String,
    pub to: String,
    /// Decimal value in human units.
    pub value: String,
    #[serde(rename = "hash")]
    pub block_hash: String,
    pub tx_hash: String,
    #[serde(rename = "blk_num")]
    pub block_number: u64,
    pub time_stamp: i64,
    /// Opaque chain payload: OP_RETURN data or Ethereum call data.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_from_address_only_has_no_secrets() {
        let f = TxFrom::address_only("n3dquXGC7y46H9JvDMZ4zVtqygsLXJqaRT");
        assert!(f.private_key.is_none());
        assert!(f.utxo.is_none());
        assert!(f.amount.is_none());
    }

    #[test]
    fn record_json_shape_matches_contract() {
        let rec = TransactionRecord {
            token_flag: "btc".into(),
            index: 3,
            log_index: 7,
            from: "".into(),
            to: "tb1q3w4ealuv2ptyccm5ntawn9n7td7km0ydy3079j".into(),
            value: "0.00093".into(),
            block_hash: "00000000deadbeef".into(),
            tx_hash: "2fe793d7375d0cc4".into(),
            block_number: 1570000,
            time_stamp: 1560000000,
            data: Some(vec![1, 2, 3]),
        };

        let json: serde_json::Value = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["token_flag"], "btc");
        assert_eq!(json["hash"], "00000000deadbeef");
        assert_eq!(json["blk_num"], 1570000);
        assert_eq!(json["time_stamp"], 1560000000);
        // Internal fields never serialize.
        assert!(json.get("index").is_none());
        assert!(json.get("log_index").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let rec = TransactionRecord {
            token_flag: "eth".into(),
            from: "0xabc".into(),
            to: "0xdef".into(),
            value: "1.5".into(),
            block_hash: "0x11".into(),
            tx_hash: "0x22".into(),
            block_number: 42,
            time_stamp: 99,
            ..Default::default()
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.from, rec.from);
        assert_eq!(back.block_number, 42);
        assert_eq!(back.index, 0);
    }
}
