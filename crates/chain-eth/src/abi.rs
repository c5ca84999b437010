//! Minimal ERC-20 ABI codec: the handful of calls the engine issues, plus a
//! strict decoder for the two transfer shapes it recognizes in calldata.

use alloy_primitives::{Address, U256};

use wallet_core::WalletError;

// Keccak-256 selectors of the ERC-20 surface the engine touches.
pub const SEL_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb]; // transfer(address,uint256)
pub const SEL_TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd]; // transferFrom(address,address,uint256)
pub const SEL_APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3]; // approve(address,uint256)
pub const SEL_ALLOWANCE: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e]; // allowance(address,address)
pub const SEL_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31]; // balanceOf(address)
pub const SEL_NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03]; // name()
pub const SEL_SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41]; // symbol()
pub const SEL_DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67]; // decimals()
pub const SEL_TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd]; // totalSupply()

/// A transfer-shaped call recovered from raw calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedCall {
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
}

pub fn encode_transfer(to: Address, amount: U256) -> Vec<u8> {
    let mut data = SEL_TRANSFER.to_vec();
    push_address(&mut data, to);
    push_uint(&mut data, amount);
    data
}

pub fn encode_transfer_from(from: Address, to: Address, amount: U256) -> Vec<u8> {
    let mut data = SEL_TRANSFER_FROM.to_vec();
    push_address(&mut data, from);
    push_address(&mut data, to);
    push_uint(&mut data, amount);
    data
}

pub fn encode_approve(agent: Address, amount: U256) -> Vec<u8> {
    let mut data = SEL_APPROVE.to_vec();
    push_address(&mut data, agent);
    push_uint(&mut data, amount);
    data
}

pub fn encode_allowance(owner: Address, agent: Address) -> Vec<u8> {
    let mut data = SEL_ALLOWANCE.to_vec();
    push_address(&mut data, owner);
    push_address(&mut data, agent);
    data
}

pub fn encode_balance_of(owner: Address) -> Vec<u8> {
    let mut data = SEL_BALANCE_OF.to_vec();
    push_address(&mut data, owner);
    data
}

/// Transfer-call decoder with fixed judgment on payload length: `transfer`
/// takes exactly two words after the selector, `transferFrom` exactly three.
/// Anything else, other selectors included, is a [`WalletError::Decode`].
pub fn decode_call(data: &[u8]) -> Result<DecodedCall, WalletError> {
    if data.len() < 4 {
        return Err(WalletError::Decode("calldata shorter than a selector".into()));
    }
    let (selector, payload) = data.split_at(4);
    match selector {
        s if s == SEL_TRANSFER => {
            if payload.len() != 64 {
                return Err(WalletError::Decode(format!(
                    "transfer payload must be 64 bytes, got {}",
                    payload.len()
                )));
            }
            Ok(DecodedCall::Transfer {
                to: word_address(&payload[..32]),
                amount: U256::from_be_slice(&payload[32..64]),
            })
        }
        s if s == SEL_TRANSFER_FROM => {
            if payload.len() != 96 {
                return Err(WalletError::Decode(format!(
                    "transferFrom payload must be 96 bytes, got {}",
                    payload.len()
                )));
            }
            Ok(DecodedCall::TransferFrom {
                from: word_address(&payload[..32]),
                to: word_address(&payload[32..64]),
                amount: U256::from_be_slice(&payload[64..96]),
            })
        }
        _ => Err(WalletError::Decode(format!(
            "unrecognized selector 0x{}",
            hex::encode(selector)
        ))),
    }
}

/// Reads a single uint256 return word.
pub fn decode_uint(ret: &[u8]) -> Result<U256, WalletError> {
    if ret.len() != 32 {
        return Err(WalletError::Decode(format!(
            "expected a 32-byte word, got {} bytes",
            ret.len()
        )));
    }
    Ok(U256::from_be_slice(ret))
}

/// Reads an ABI-encoded dynamic string return (offset word, length word,
/// padded bytes), as `name()` and `symbol()` produce.
pub fn decode_string(ret: &[u8]) -> Result<String, WalletError> {
    if ret.len() < 64 {
        return Err(WalletError::Decode("string return is truncated".into()));
    }
    let offset: usize = U256::from_be_slice(&ret[..32])
        .try_into()
        .map_err(|_| WalletError::Decode("string offset overflows".into()))?;
    // Offset and length words arrive untrusted; a value near usize::MAX must
    // not wrap past the bounds checks.
    let start = offset
        .checked_add(32)
        .ok_or_else(|| WalletError::Decode("string offset overflows".into()))?;
    if start > ret.len() {
        return Err(WalletError::Decode("string offset out of bounds".into()));
    }
    let len: usize = U256::from_be_slice(&ret[offset..start])
        .try_into()
        .map_err(|_| WalletError::Decode("string length overflows".into()))?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| WalletError::Decode("string length overflows".into()))?;
    if end > ret.len() {
        return Err(WalletError::Decode("string body out of bounds".into()));
    }
    String::from_utf8(ret[start..end].to_vec())
        .map_err(|_| WalletError::Decode("string body is not UTF-8".into()))
}

fn push_address(out: &mut Vec<u8>, addr: Address) {
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(addr.as_slice());
}

fn push_uint(out: &mut Vec<u8>, value: U256) {
    out.extend_from_slice(&value.to_be_bytes::<32>());
}

/// Address from a left-padded 32-byte word.
fn word_address(word: &[u8]) -> Address {
    Address::from_slice(&word[12..32])
}
