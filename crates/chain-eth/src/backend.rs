use alloy_primitives::{Address, U256};
use zeroize::Zeroizing;

use wallet_core::units::{from_base_units, to_base_units};
use wallet_core::{
    check_block_range, AccountKeyMaterial, Chain, TransactionRecord, TxFrom, TxTo, WalletError,
};

use crate::address;
use crate::provider::{CallRequest, EthBlock, EthRpc};
use crate::records;
use crate::token::EthToken;
use crate::transaction::{self, EthTransaction, SignedEthTransaction};

/// Native-ETH backend over a JSON-RPC node.
///
/// The chain id is fetched once at construction and committed into every
/// signature, so a transaction made here can never replay on another chain.
pub struct Ethereum {
    rpc: Box<dyn EthRpc>,
    chain_id: u64,
}

impl Ethereum {
    pub fn new(rpc: Box<dyn EthRpc>) -> Result<Self, WalletError> {
        let chain_id = rpc.chain_id()?;
        Ok(Self { rpc, chain_id })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// A token backend bound to an ERC-20 contract, sharing this node handle.
    pub fn token(&self, contract: &str) -> Result<EthToken<'_>, WalletError> {
        EthToken::new(self, contract)
    }

    pub(crate) fn rpc(&self) -> &dyn EthRpc {
        self.rpc.as_ref()
    }

    /// Decodes raw signed bytes and recovers the sender.
    pub fn decode_raw_transaction(
        &self,
        raw: &[u8],
    ) -> Result<transaction::DecodedTx, WalletError> {
        transaction::decode_transaction(raw)
    }

    /// Gates, funds-checks and signs one outgoing transaction.
    ///
    /// The key must derive the claimed source address and the source must
    /// hold `value` plus the full gas cost; a zero `gas_limit` asks the node
    /// for an estimate first. Nothing is broadcast here.
    pub(crate) fn sign_outgoing(
        &self,
        from: &TxFrom,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
        gas_limit: u64,
    ) -> Result<SignedEthTransaction, WalletError> {
        let key = require_key(from)?;

        let gas_price = self.rpc.gas_price()?;
        let gas_limit = if gas_limit == 0 {
            self.rpc.estimate_gas(&CallRequest {
                from: from.address.clone(),
                to: to.map(|a| address::checksum_address(&a)),
                gas_price: None,
                value: Some(value),
                data: data.clone(),
            })?
        } else {
            gas_limit
        };

        let fee = gas_price
            .checked_mul(U256::from(gas_limit))
            .ok_or_else(|| WalletError::InvalidNumber("gas cost overflows".into()))?;
        let cost = value
            .checked_add(fee)
            .ok_or_else(|| WalletError::InvalidNumber("transaction cost overflows".into()))?;
        let balance = self.rpc.balance(&from.address, None)?;
        if balance < cost {
            return Err(WalletError::InsufficientFunds(format!(
                "{} holds {balance} wei, needs {cost}",
                from.address
            )));
        }

        let nonce = self.rpc.pending_nonce(&from.address)?;
        transaction::sign_transaction(
            &EthTransaction {
                nonce,
                gas_price,
                gas_limit,
                to,
                value,
                data,
            },
            self.chain_id,
            key,
        )
    }
}

/// Resolves the signing key and checks it derives the claimed source
/// address. Mutation paths run this before anything touches the node.
pub(crate) fn require_key(from: &TxFrom) -> Result<&Zeroizing<String>, WalletError> {
    let key = from
        .private_key
        .as_ref()
        .ok_or_else(|| WalletError::KeyNotFound(from.address.clone()))?;
    let derived = address::derive_address(key)?;
    if !derived.eq_ignore_ascii_case(&from.address) {
        return Err(WalletError::KeyMismatch(from.address.clone()));
    }
    Ok(key)
}

/// Requires exactly one descriptor; account-model transfers have a single
/// source and a single destination.
pub(crate) fn single<T>(items: &[T], what: &str) -> Result<usize, WalletError> {
    if items.len() != 1 {
        return Err(WalletError::InvalidParams(format!(
            "expected exactly one {what}, got {}",
            items.len()
        )));
    }
    Ok(0)
}

/// Destination amount in wei-style base units.
pub(crate) fn base_amount(value: &str, decimals: u32) -> Result<U256, WalletError> {
    let base = to_base_units(value, decimals)?;
    U256::from_str_radix(&base, 10).map_err(|e| WalletError::InvalidNumber(e.to_string()))
}

impl Chain for Ethereum {
    type Block = EthBlock;
    type SignedTx = SignedEthTransaction;
    type AccountParams = ();
    /// Gas limit; zero defers to the node's estimate.
    type TxParams = u64;
    type FeeParams = ();

    fn chain_name(&self) -> &'static str {
        "ethereum"
    }

    fn coin_name(&self) -> String {
        "Ethereum".into()
    }

    fn symbol(&self) -> String {
        "eth".into()
    }

    fn decimals(&self) -> u32 {
        18
    }

    /// ETH issuance has no fixed cap.
    fn total_supply(&self) -> String {
        "0".into()
    }

    fn alloc_account(
        &self,
        password: &str,
        salt: &str,
        _params: (),
    ) -> Result<AccountKeyMaterial, WalletError> {
        let (addr, priv_hex) = address::alloc_keypair()?;
        let encrypted_key = keystore::encrypt_priv_key(password, salt, &priv_hex)?;
        Ok(AccountKeyMaterial {
            address: addr,
            encrypted_key,
        })
    }

    fn is_valid_account(&self, addr: &str) -> bool {
        address::validate_address(addr)
    }

    fn balance_of(&self, addr: &str, block: Option<u64>) -> Result<String, WalletError> {
        if !self.is_valid_account(addr) {
            return Err(WalletError::InvalidAddress(addr.to_string()));
        }
        let wei = self.rpc.balance(addr, block)?;
        from_base_units(&wei.to_string(), 18)
    }

    fn last_block_number(&self) -> Result<u64, WalletError> {
        self.rpc.block_number()
    }

    fn block_by_number(&self, number: u64) -> Result<EthBlock, WalletError> {
        self.rpc.block_by_number(number)
    }

    fn block_by_hash(&self, hash: &str) -> Result<EthBlock, WalletError> {
        self.rpc.block_by_hash(hash)
    }

    fn transaction(
        &self,
        tx_hash: &str,
        block_hash: &str,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let block = self.rpc.block_by_hash(block_hash)?;
        let mut recs = records::native_records(&self.symbol(), &block);
        recs.retain(|r| r.tx_hash.eq_ignore_ascii_case(tx_hash));
        Ok(recs)
    }

    fn transactions_in_blocks(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        check_block_range(from, to)?;
        let symbol = self.symbol();
        let mut all = Vec::new();
        for number in from..=to {
            let block = self.rpc.block_by_number(number)?;
            all.extend(records::native_records(&symbol, &block));
        }
        Ok(all)
    }

    fn make_transaction(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        gas_limit: u64,
    ) -> Result<SignedEthTransaction, WalletError> {
        let from = &from[single(from, "source")?];
        let to = &to[single(to, "destination")?];
        let dest = address::parse_address(&to.address)?;
        let value = base_amount(&to.value, 18)?;
        self.sign_outgoing(from, Some(dest), value, Vec::new(), gas_limit)
    }

    fn send_transaction(&self, tx: &SignedEthTransaction) -> Result<String, WalletError> {
        self.rpc.send_raw_transaction(tx.raw_bytes())
    }

    fn estimate_fee(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        _params: (),
    ) -> Result<(String, u64), WalletError> {
        let from = &from[single(from, "source")?];
        let to = &to[single(to, "destination")?];
        if !address::validate_address(&to.address) {
            return Err(WalletError::InvalidAddress(to.address.clone()));
        }
        let value = base_amount(&to.value, 18)?;

        let gas = self.rpc.estimate_gas(&CallRequest {
            from: from.address.clone(),
            to: Some(to.address.clone()),
            gas_price: None,
            value: Some(value),
            data: Vec::new(),
        })?;
        let fee = self
            .rpc
            .gas_price()?
            .checked_mul(U256::from(gas))
            .ok_or_else(|| WalletError::InvalidNumber("gas cost overflows".into()))?;
        Ok((from_base_units(&fee.to_string(), 18)?, gas))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::TransferLog;
    use std::cell::RefCell;
    use std::rc::Rc;
    use zeroize::Zeroizing;

    pub(crate) const KEY_ONE: &str =
        "0x0000000000000000000000000000000000000000000000000000000000000001";
    pub(crate) const KEY_ONE_ADDR: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
    pub(crate) const KEY_TWO: &str =
        "0x0000000000000000000000000000000000000000000000000000000000000002";
    pub(crate) const KEY_TWO_ADDR: &str = "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF";

    /// One wei-denominated ETH.
    pub(crate) const ONE_ETH: u64 = 1_000_000_000_000_000_000;

    pub(crate) struct MockRpc {
        pub chain_id: u64,
        pub balance: U256,
        pub nonce: u64,
        pub gas_price: U256,
        pub gas_estimate: u64,
        pub block: Option<EthBlock>,
        pub logs: Vec<TransferLog>,
        /// Return payloads for `call`, consumed front to back.
        pub call_returns: RefCell<Vec<Vec<u8>>>,
        pub sent: Rc<RefCell<Vec<Vec<u8>>>>,
        /// Every `call`/`estimate_gas` request, shared so tests keep a handle
        /// after the mock moves into the backend.
        pub calls: Rc<RefCell<Vec<CallRequest>>>,
    }

    impl Default for MockRpc {
        fn default() -> Self {
            Self {
                chain_id: 1,
                balance: U256::from(10u64) * U256::from(ONE_ETH),
                nonce: 0,
                gas_price: U256::from(1_000_000_000u64),
                gas_estimate: 21_000,
                block: None,
                logs: Vec::new(),
                call_returns: RefCell::new(Vec::new()),
                sent: Rc::new(RefCell::new(Vec::new())),
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl EthRpc for MockRpc {
        fn chain_id(&self) -> Result<u64, WalletError> {
            Ok(self.chain_id)
        }
        fn balance(&self, _addr: &str, _block: Option<u64>) -> Result<U256, WalletError> {
            Ok(self.balance)
        }
        fn pending_nonce(&self, _addr: &str) -> Result<u64, WalletError> {
            Ok(self.nonce)
        }
        fn gas_price(&self) -> Result<U256, WalletError> {
            Ok(self.gas_price)
        }
        fn estimate_gas(&self, call: &CallRequest) -> Result<u64, WalletError> {
            self.calls.borrow_mut().push(call.clone());
            Ok(self.gas_estimate)
        }
        fn call(&self, call: &CallRequest) -> Result<Vec<u8>, WalletError> {
            self.calls.borrow_mut().push(call.clone());
            let mut returns = self.call_returns.borrow_mut();
            if returns.is_empty() {
                return Err(WalletError::Transport("execution reverted".into()));
            }
            Ok(returns.remove(0))
        }
        fn block_number(&self) -> Result<u64, WalletError> {
            Ok(self.block.as_ref().map(|b| b.number).unwrap_or(0))
        }
        fn block_by_number(&self, number: u64) -> Result<EthBlock, WalletError> {
            match &self.block {
                Some(b) if b.number == number => Ok(b.clone()),
                _ => Ok(EthBlock {
                    number,
                    hash: format!("0xhash{number}"),
                    ..Default::default()
                }),
            }
        }
        fn block_by_hash(&self, hash: &str) -> Result<EthBlock, WalletError> {
            match &self.block {
                Some(b) if b.hash == hash => Ok(b.clone()),
                _ => Err(WalletError::Transport("block not found".into())),
            }
        }
        fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, WalletError> {
            self.sent.borrow_mut().push(raw.to_vec());
            Ok("0xsent".into())
        }
        fn transfer_logs(
            &self,
            _contract: &str,
            _from: u64,
            _to: u64,
        ) -> Result<Vec<TransferLog>, WalletError> {
            Ok(self.logs.clone())
        }
    }

    pub(crate) fn spender() -> TxFrom {
        TxFrom {
            address: KEY_ONE_ADDR.into(),
            private_key: Some(Zeroizing::new(KEY_ONE.into())),
            utxo: None,
            amount: None,
        }
    }

    #[test]
    fn identity_surface() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        assert_eq!(eth.chain_name(), "ethereum");
        assert_eq!(eth.symbol(), "eth");
        assert_eq!(eth.decimals(), 18);
        assert_eq!(eth.total_supply(), "0");
        assert_eq!(eth.chain_id(), 1);
        assert!(!eth.is_token());
    }

    #[test]
    fn balance_converts_wei_to_ether() {
        let eth = Ethereum::new(Box::new(MockRpc {
            balance: U256::from(1_500_000_000_000_000_000u64),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(eth.balance_of(KEY_ONE_ADDR, None).unwrap(), "1.5");
    }

    #[test]
    fn balance_of_invalid_address_fails_locally() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        assert!(matches!(
            eth.balance_of("0xshort", None),
            Err(WalletError::InvalidAddress(_))
        ));
    }

    #[test]
    fn alloc_account_roundtrips_through_keystore() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        let acct = eth.alloc_account("hunter2", "pepper", ()).unwrap();
        assert!(eth.is_valid_account(&acct.address));

        let key = keystore::decrypt_priv_key("hunter2", "pepper", &acct.encrypted_key).unwrap();
        assert_eq!(address::derive_address(&key).unwrap(), acct.address);
    }

    #[test]
    fn make_transaction_signs_a_replay_protected_transfer() {
        let eth = Ethereum::new(Box::new(MockRpc {
            chain_id: 1337,
            nonce: 7,
            ..Default::default()
        }))
        .unwrap();
        let to = vec![TxTo::new(KEY_TWO_ADDR, "1.5")];
        let signed = eth.make_transaction(&[spender()], &to, 21_000).unwrap();

        let decoded = transaction::decode_transaction(signed.raw_bytes()).unwrap();
        assert_eq!(address::checksum_address(&decoded.from), KEY_ONE_ADDR);
        assert_eq!(
            decoded.to.map(|a| address::checksum_address(&a)),
            Some(KEY_TWO_ADDR.to_string())
        );
        assert_eq!(decoded.value, U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(decoded.nonce, 7);
        assert_eq!(decoded.chain_id, Some(1337));
    }

    #[test]
    fn zero_gas_limit_defers_to_the_node_estimate() {
        let eth = Ethereum::new(Box::new(MockRpc {
            gas_estimate: 38_000,
            ..Default::default()
        }))
        .unwrap();
        let to = vec![TxTo::new(KEY_TWO_ADDR, "0.1")];
        let signed = eth.make_transaction(&[spender()], &to, 0).unwrap();
        let decoded = transaction::decode_transaction(signed.raw_bytes()).unwrap();
        assert_eq!(decoded.gas_limit, 38_000);
    }

    #[test]
    fn key_gate_fires_before_signing() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        let to = vec![TxTo::new(KEY_TWO_ADDR, "1")];

        let keyless = TxFrom::address_only(KEY_ONE_ADDR);
        assert!(matches!(
            eth.make_transaction(&[keyless], &to, 21_000),
            Err(WalletError::KeyNotFound(_))
        ));

        let mismatched = TxFrom {
            address: KEY_TWO_ADDR.into(),
            private_key: Some(Zeroizing::new(KEY_ONE.into())),
            utxo: None,
            amount: None,
        };
        assert!(matches!(
            eth.make_transaction(&[mismatched], &to, 21_000),
            Err(WalletError::KeyMismatch(_))
        ));
    }

    #[test]
    fn balance_must_cover_value_plus_gas() {
        // Exactly 1 ETH in the account and a 1 ETH transfer: the gas cost
        // alone pushes it over.
        let eth = Ethereum::new(Box::new(MockRpc {
            balance: U256::from(ONE_ETH),
            ..Default::default()
        }))
        .unwrap();
        let to = vec![TxTo::new(KEY_TWO_ADDR, "1")];
        assert!(matches!(
            eth.make_transaction(&[spender()], &to, 21_000),
            Err(WalletError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn multiple_sources_or_destinations_are_rejected() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        let to = vec![
            TxTo::new(KEY_TWO_ADDR, "1"),
            TxTo::new(KEY_ONE_ADDR, "1"),
        ];
        assert!(matches!(
            eth.make_transaction(&[spender()], &to, 21_000),
            Err(WalletError::InvalidParams(_))
        ));
        assert!(matches!(
            eth.make_transaction(&[spender(), spender()], &[TxTo::new(KEY_TWO_ADDR, "1")], 21_000),
            Err(WalletError::InvalidParams(_))
        ));
    }

    #[test]
    fn send_passes_the_raw_bytes_to_the_node() {
        let mock = MockRpc::default();
        let eth = Ethereum::new(Box::new(mock)).unwrap();
        let to = vec![TxTo::new(KEY_TWO_ADDR, "0.25")];
        let signed = eth.make_transaction(&[spender()], &to, 21_000).unwrap();
        assert_eq!(eth.send_transaction(&signed).unwrap(), "0xsent");
    }

    #[test]
    fn estimate_fee_prices_the_node_gas_figure() {
        let eth = Ethereum::new(Box::new(MockRpc {
            gas_price: U256::from(2_000_000_000u64), // 2 gwei
            gas_estimate: 21_000,
            ..Default::default()
        }))
        .unwrap();
        let (fee, gas) = eth
            .estimate_fee(
                &[TxFrom::address_only(KEY_ONE_ADDR)],
                &[TxTo::new(KEY_TWO_ADDR, "1")],
                (),
            )
            .unwrap();
        assert_eq!(gas, 21_000);
        // 21000 * 2 gwei = 42000 gwei = 0.000042 ETH.
        assert_eq!(fee, "0.000042");
    }

    #[test]
    fn single_transaction_lookup_filters_the_block() {
        let tx = EthTransaction {
            nonce: 0,
            gas_price: U256::from(1_000_000_000u64),
            gas_limit: 21_000,
            to: Some(address::parse_address(KEY_TWO_ADDR).unwrap()),
            value: U256::from(ONE_ETH),
            data: Vec::new(),
        };
        let signed = transaction::sign_transaction(&tx, 1, KEY_ONE).unwrap();
        let wanted = signed.tx_hash().to_string();

        let other = EthTransaction { nonce: 1, ..tx };
        let other_signed = transaction::sign_transaction(&other, 1, KEY_ONE).unwrap();

        let eth = Ethereum::new(Box::new(MockRpc {
            block: Some(EthBlock {
                hash: "0xblk".into(),
                number: 11,
                timestamp: 1_700_000_000,
                transactions: vec![
                    signed.raw_bytes().to_vec(),
                    other_signed.raw_bytes().to_vec(),
                ],
            }),
            ..Default::default()
        }))
        .unwrap();

        let recs = eth.transaction(&wanted, "0xblk").unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].tx_hash, wanted);
        assert_eq!(recs[0].block_number, 11);
    }

    #[test]
    fn inverted_block_range_is_invalid() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        assert!(matches!(
            eth.transactions_in_blocks(10, 5),
            Err(WalletError::InvalidParams(_))
        ));
    }

    #[test]
    fn delegated_spend_is_unsupported_for_native_eth() {
        let eth = Ethereum::new(Box::new(MockRpc::default())).unwrap();
        assert!(matches!(
            eth.approve_agent(&spender(), &TxTo::new(KEY_TWO_ADDR, "1")),
            Err(WalletError::Unsupported(_))
        ));
        assert!(matches!(
            eth.allowance(KEY_ONE_ADDR, KEY_TWO_ADDR),
            Err(WalletError::Unsupported(_))
        ));
    }
}
