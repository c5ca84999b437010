//! ERC-20 token backend layered over the native [`Ethereum`] handle.
//!
//! Token transfers are contract calls: the signed transaction carries zero
//! native value and the transfer intent lives in the calldata. Gas is still
//! paid in ETH by whoever signs, so every mutation checks both the signer's
//! native balance (inside the shared signing path) and the relevant token
//! balance here.

use std::sync::OnceLock;

use alloy_primitives::{Address, U256};

use wallet_core::units::from_base_units;
use wallet_core::{AccountKeyMaterial, Chain, TransactionRecord, TxFrom, TxTo, WalletError};

use crate::abi;
use crate::address;
use crate::backend::{base_amount, require_key, single, Ethereum};
use crate::provider::{CallRequest, EthBlock};
use crate::records;
use crate::transaction::{self, SignedEthTransaction};

/// A token bound to one contract.
///
/// Contract metadata is immutable on any sane token, so `name`, `symbol`,
/// `decimals` and `totalSupply` are fetched once and memoized.
pub struct EthToken<'a> {
    eth: &'a Ethereum,
    contract: Address,
    contract_addr: String,
    name: OnceLock<String>,
    symbol: OnceLock<String>,
    decimals: OnceLock<u32>,
    total_supply: OnceLock<String>,
}

impl<'a> EthToken<'a> {
    pub(crate) fn new(eth: &'a Ethereum, contract: &str) -> Result<Self, WalletError> {
        let parsed = address::parse_address(contract)?;
        Ok(Self {
            eth,
            contract: parsed,
            contract_addr: address::checksum_address(&parsed),
            name: OnceLock::new(),
            symbol: OnceLock::new(),
            decimals: OnceLock::new(),
            total_supply: OnceLock::new(),
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_addr
    }

    /// Decodes a raw signed transaction and the transfer intent inside its
    /// calldata. A transaction addressed to a different contract is rejected.
    pub fn decode_raw_transaction(
        &self,
        raw: &[u8],
    ) -> Result<(transaction::DecodedTx, abi::DecodedCall), WalletError> {
        let tx = transaction::decode_transaction(raw)?;
        if tx.to != Some(self.contract) {
            return Err(WalletError::Decode(
                "transaction is not addressed to this contract".into(),
            ));
        }
        let call = abi::decode_call(&tx.data)?;
        Ok((tx, call))
    }

    /// Read-only contract call against the bound contract.
    fn view(&self, data: Vec<u8>) -> Result<Vec<u8>, WalletError> {
        self.eth.rpc().call(&CallRequest {
            from: String::new(),
            to: Some(self.contract_addr.clone()),
            gas_price: None,
            value: None,
            data,
        })
    }

    fn token_name(&self) -> Result<String, WalletError> {
        if let Some(name) = self.name.get() {
            return Ok(name.clone());
        }
        let ret = self.view(abi::SEL_NAME.to_vec())?;
        let name = abi::decode_string(&ret)?;
        Ok(self.name.get_or_init(|| name).clone())
    }

    fn token_symbol(&self) -> Result<String, WalletError> {
        if let Some(symbol) = self.symbol.get() {
            return Ok(symbol.clone());
        }
        let ret = self.view(abi::SEL_SYMBOL.to_vec())?;
        let symbol = abi::decode_string(&ret)?;
        Ok(self.symbol.get_or_init(|| symbol).clone())
    }

    fn fetch_decimals(&self) -> Result<u32, WalletError> {
        let ret = self.view(abi::SEL_DECIMALS.to_vec())?;
        let decimals: u32 = abi::decode_uint(&ret)?
            .try_into()
            .map_err(|_| WalletError::Decode("decimals out of range".into()))?;
        // A uint256 balance holds fewer than 78 decimal digits.
        if decimals > 77 {
            return Err(WalletError::Decode("decimals out of range".into()));
        }
        Ok(decimals)
    }

    /// Token balance in base units.
    fn balance_raw(&self, addr: &str) -> Result<U256, WalletError> {
        let ret = self.view(abi::encode_balance_of(address::parse_address(addr)?))?;
        abi::decode_uint(&ret)
    }

    /// Gas and native-denominated fee for an `approve` call, priced without
    /// signing anything.
    pub fn approve_fee(
        &self,
        owner: &str,
        agent: &str,
        value: &str,
    ) -> Result<(String, u64), WalletError> {
        let amount = base_amount(value, self.decimals())?;
        let data = abi::encode_approve(address::parse_address(agent)?, amount);
        self.price_call(owner, data)
    }

    fn price_call(&self, from: &str, data: Vec<u8>) -> Result<(String, u64), WalletError> {
        let gas = self.eth.rpc().estimate_gas(&CallRequest {
            from: from.to_string(),
            to: Some(self.contract_addr.clone()),
            gas_price: None,
            value: None,
            data,
        })?;
        let fee = self
            .eth
            .rpc()
            .gas_price()?
            .checked_mul(U256::from(gas))
            .ok_or_else(|| WalletError::InvalidNumber("gas cost overflows".into()))?;
        Ok((from_base_units(&fee.to_string(), 18)?, gas))
    }

    fn require_token_balance(&self, holder: &str, amount: U256) -> Result<(), WalletError> {
        let balance = self.balance_raw(holder)?;
        if balance < amount {
            return Err(WalletError::InsufficientFunds(format!(
                "{holder} holds {balance} token units, needs {amount}"
            )));
        }
        Ok(())
    }
}

impl Chain for EthToken<'_> {
    type Block = EthBlock;
    type SignedTx = SignedEthTransaction;
    type AccountParams = ();
    /// Gas limit; zero defers to the node's estimate.
    type TxParams = u64;
    /// `Some(owner)` prices a delegated `transferFrom` spend instead of a
    /// direct transfer.
    type FeeParams = Option<String>;

    fn chain_name(&self) -> &'static str {
        "ethereum"
    }

    fn coin_name(&self) -> String {
        match self.token_name() {
            Ok(name) => name,
            Err(e) => {
                log::warn!("name() failed for {}: {e}", self.contract_addr);
                self.contract_addr.clone()
            }
        }
    }

    fn symbol(&self) -> String {
        match self.token_symbol() {
            Ok(symbol) => symbol,
            Err(e) => {
                log::warn!("symbol() failed for {}: {e}", self.contract_addr);
                self.contract_addr.clone()
            }
        }
    }

    fn decimals(&self) -> u32 {
        if let Some(d) = self.decimals.get() {
            return *d;
        }
        match self.fetch_decimals() {
            Ok(d) => *self.decimals.get_or_init(|| d),
            Err(e) => {
                log::warn!(
                    "decimals() failed for {}: {e}, assuming 18",
                    self.contract_addr
                );
                18
            }
        }
    }

    fn total_supply(&self) -> String {
        if let Some(supply) = self.total_supply.get() {
            return supply.clone();
        }
        let fetched = self
            .view(abi::SEL_TOTAL_SUPPLY.to_vec())
            .and_then(|ret| abi::decode_uint(&ret))
            .and_then(|raw| from_base_units(&raw.to_string(), self.decimals()));
        match fetched {
            Ok(supply) => self.total_supply.get_or_init(|| supply).clone(),
            Err(e) => {
                log::warn!("totalSupply() failed for {}: {e}", self.contract_addr);
                "0".into()
            }
        }
    }

    fn alloc_account(
        &self,
        password: &str,
        salt: &str,
        params: (),
    ) -> Result<AccountKeyMaterial, WalletError> {
        self.eth.alloc_account(password, salt, params)
    }

    fn is_valid_account(&self, addr: &str) -> bool {
        self.eth.is_valid_account(addr)
    }

    /// Token balance via `balanceOf` at the latest state; the node call has
    /// no historical form here, so `block` is ignored.
    fn balance_of(&self, addr: &str, _block: Option<u64>) -> Result<String, WalletError> {
        if !self.is_valid_account(addr) {
            return Err(WalletError::InvalidAddress(addr.to_string()));
        }
        let raw = self.balance_raw(addr)?;
        from_base_units(&raw.to_string(), self.decimals())
    }

    fn last_block_number(&self) -> Result<u64, WalletError> {
        self.eth.last_block_number()
    }

    fn block_by_number(&self, number: u64) -> Result<EthBlock, WalletError> {
        self.eth.block_by_number(number)
    }

    fn block_by_hash(&self, hash: &str) -> Result<EthBlock, WalletError> {
        self.eth.block_by_hash(hash)
    }

    fn transaction(
        &self,
        tx_hash: &str,
        block_hash: &str,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let block = self.eth.block_by_hash(block_hash)?;
        let logs = self
            .eth
            .rpc()
            .transfer_logs(&self.contract_addr, block.number, block.number)?;
        let mut recs = records::log_records(&self.symbol(), self.decimals(), &logs);
        recs.retain(|r| r.tx_hash.eq_ignore_ascii_case(tx_hash));
        for rec in &mut recs {
            rec.time_stamp = block.timestamp;
        }
        Ok(recs)
    }

    fn transactions_in_blocks(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        wallet_core::check_block_range(from, to)?;
        let logs = self.eth.rpc().transfer_logs(&self.contract_addr, from, to)?;
        Ok(records::log_records(&self.symbol(), self.decimals(), &logs))
    }

    fn make_transaction(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        gas_limit: u64,
    ) -> Result<SignedEthTransaction, WalletError> {
        let from = &from[single(from, "source")?];
        let to = &to[single(to, "destination")?];
        require_key(from)?;
        let dest = address::parse_address(&to.address)?;
        let amount = base_amount(&to.value, self.decimals())?;

        self.require_token_balance(&from.address, amount)?;
        self.eth.sign_outgoing(
            from,
            Some(self.contract),
            U256::ZERO,
            abi::encode_transfer(dest, amount),
            gas_limit,
        )
    }

    fn send_transaction(&self, tx: &SignedEthTransaction) -> Result<String, WalletError> {
        self.eth.send_transaction(tx)
    }

    /// Grants `agent` a spend allowance of `agent.value` tokens, signed by
    /// the owner. The gas limit always comes from simulating the call.
    fn approve_agent(
        &self,
        owner: &TxFrom,
        agent: &TxTo,
    ) -> Result<SignedEthTransaction, WalletError> {
        require_key(owner)?;
        let spender = address::parse_address(&agent.address)?;
        let amount = base_amount(&agent.value, self.decimals())?;
        self.eth.sign_outgoing(
            owner,
            Some(self.contract),
            U256::ZERO,
            abi::encode_approve(spender, amount),
            0,
        )
    }

    /// Spends from the owner's balance under a prior allowance; the agent
    /// signs and pays the gas, the owner must hold the tokens.
    fn make_agent_transaction(
        &self,
        owner: &str,
        agent: &[TxFrom],
        to: &[TxTo],
        gas_limit: u64,
    ) -> Result<SignedEthTransaction, WalletError> {
        let agent = &agent[single(agent, "agent")?];
        let to = &to[single(to, "destination")?];
        require_key(agent)?;
        let owner_addr = address::parse_address(owner)?;
        let dest = address::parse_address(&to.address)?;
        let amount = base_amount(&to.value, self.decimals())?;

        self.require_token_balance(owner, amount)?;
        self.eth.sign_outgoing(
            agent,
            Some(self.contract),
            U256::ZERO,
            abi::encode_transfer_from(owner_addr, dest, amount),
            gas_limit,
        )
    }

    fn allowance(&self, owner: &str, agent: &str) -> Result<String, WalletError> {
        let data = abi::encode_allowance(
            address::parse_address(owner)?,
            address::parse_address(agent)?,
        );
        let raw = abi::decode_uint(&self.view(data)?)?;
        from_base_units(&raw.to_string(), self.decimals())
    }

    fn estimate_fee(
        &self,
        from: &[TxFrom],
        to: &[TxTo],
        owner: Option<String>,
    ) -> Result<(String, u64), WalletError> {
        let from = &from[single(from, "source")?];
        let to = &to[single(to, "destination")?];
        let dest = address::parse_address(&to.address)?;
        let amount = base_amount(&to.value, self.decimals())?;

        let data = match owner {
            Some(owner) => {
                abi::encode_transfer_from(address::parse_address(&owner)?, dest, amount)
            }
            None => abi::encode_transfer(dest, amount),
        };
        self.price_call(&from.address, data)
    }

    fn is_token(&self) -> bool {
        true
    }
}
