use bitcoin::Network;

use wallet_core::units::from_base_units;
use wallet_core::{
    check_block_range, AccountKeyMaterial, Chain, TransactionRecord, TxFrom, TxTo, WalletError,
};

use crate::address::{self, AddressKind};
use crate::fee;
use crate::provider::{BlockInfo, ExplorerApi, NodeRpc};
use crate::records;
use crate::transaction::{self, SignedBtcTx};

/// Bitcoin backend over a block explorer, with an optional Core node for fee
/// estimation and broadcast.
pub struct Bitcoin {
    api: Box<dyn ExplorerApi>,
    rpc: Option<Box<dyn NodeRpc>>,
    network: Network,
    compressed: bool,
}

impl Bitcoin {
    pub fn new(api: Box<dyn ExplorerApi>, network: Network, compressed: bool) -> Self {
        Self {
            api,
            rpc: None,
            network,
            compressed,
        }
    }

    /// Attaches a Core node; fee RPCs and broadcast then prefer it over the
    /// explorer.
    pub fn with_node(mut self, rpc: Box<dyn NodeRpc>) -> Self {
        self.rpc = Some(rpc);
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

impl Chain for Bitcoin {
    type Block = BlockInfo;
    type SignedTx = SignedBtcTx;
    type AccountParams = AddressKind;
    /// Consensus lock time; `None` or zero leaves inputs final.
    type TxParams = Option<u32>;
    type FeeParams = ();

    fn chain_name(&self) -> &'static str {
        "bitcoin"
    }

    fn coin_name(&self) -> String {
        "Bitcoin".into()
    }

    fn symbol(&self) -> String {
        "btc".into()
    }

    fn decimals(&self) -> u32 {
        8
    }

    fn total_supply(&self) -> String {
        "21000000".into()
    }

    fn alloc_account(
        &self,
        password: &str,
        salt: &str,
        kind: AddressKind,
    ) -> Result<AccountKeyMaterial, WalletError> {
        let (addr, wif) = address::alloc_keypair(kind, self.network, self.compressed)?;
        let encrypted_key = keystore::encrypt_priv_key(password, salt, &wif)?;
        Ok(AccountKeyMaterial {
            address: addr,
            encrypted_key,
        })
    }

    fn is_valid_account(&self, addr: &str) -> bool {
        address::validate_address(addr, self.network)
    }

    /// Current balance; the explorer has no historical state, so `block` is
    /// ignored.
    fn balance_of(&self, addr: &str, _block: Option<u64>) -> Result<String, WalletError> {
        if !self.is_valid_account(addr) {
            return Err(WalletError::InvalidAddress(addr.to_string()));
        }
        let info = self.api.address_info(addr)?;
        from_base_units(&info.balance.to_string(), 8)
    }

    fn last_block_number(&self) -> Result<u64, WalletError> {
        Ok(self.api.latest_block()?.height)
    }

    fn block_by_number(&self, number: u64) -> Result<BlockInfo, WalletError> {
        self.api.block_by_number(number)
    }

    fn block_by_hash(&self, hash: &str) -> Result<BlockInfo, WalletError> {
        self.api.block_by_hash(hash)
    }

    fn transaction(
        &self,
        tx_hash: &str,
        block_hash: &str,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let tx = self.api.transaction(tx_hash)?;
        Ok(records::records_from_tx(
            &self.symbol(),
            &tx,
            block_hash,
            self.network,
        ))
    }

    fn transactions_in_blocks(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        check_block_range(from, to)?;
        let symbol = self.symbol();
        let mut all = Vec::new();
        for height in from..=to {
            all.extend(records::block_records(
                self.api.as_ref(),
                &symbol,
                height,
                self.network,
            )?);
        }
        Ok(all)
    }

    fn make_transaction(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        lock_time: Option<u32>,
    ) -> Result<SignedBtcTx, WalletError> {
        let unsigned = transaction::build_transaction(from, to, lock_time, self.network)?;
        transaction::sign_transaction(&unsigned, from, self.network)
    }

    fn send_transaction(&self, tx: &SignedBtcTx) -> Result<String, WalletError> {
        let raw = tx.raw_hex();
        match &self.rpc {
            Some(node) => node.send_raw_transaction(&raw),
            None => self.api.broadcast(&raw),
        }
    }

    fn estimate_fee(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        _params: (),
    ) -> Result<(String, u64), WalletError> {
        let rate = fee::resolve_fee_rate(self.api.as_ref(), self.rpc.as_deref())?;
        fee::estimate_fee(from, to, rate, self.network)
    }
}
