//! Ethers-backed [`ChainClient`] implementation.
//!
//! One JSON-RPC provider shared by every wallet, plus one signer per
//! configured key. Submission errors are classified into the typed
//! taxonomy by provider message, since nonce staleness must be
//! distinguishable upstream.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swap_core::{ChainClient, ChainError, Receipt, SigningKey, SwapParams, TxHandle, WalletAccount};

/// Bound on the receipt wait before the transaction is reported as
/// timed out.
const CONFIRMATION_TIMEOUT_SECS: u64 = 180;

const ERC20_ABI: &str = r#"[
    {"constant":true,"inputs":[{"name":"_owner","type":"address"}],"name":"balanceOf","outputs":[{"name":"balance","type":"uint256"}],"type":"function"},
    {"constant":true,"inputs":[{"name":"_owner","type":"address"},{"name":"_spender","type":"address"}],"name":"allowance","outputs":[{"name":"","type":"uint256"}],"type":"function"},
    {"constant":false,"inputs":[{"name":"_spender","type":"address"},{"name":"_value","type":"uint256"}],"name":"approve","outputs":[{"name":"","type":"bool"}],"type":"function"}
]"#;

const ROUTER_ABI: &str = r#"[
    {"inputs":[{"components":[{"internalType":"address","name":"tokenIn","type":"address"},{"internalType":"address","name":"tokenOut","type":"address"},{"internalType":"uint24","name":"fee","type":"uint24"},{"internalType":"address","name":"recipient","type":"address"},{"internalType":"uint256","name":"deadline","type":"uint256"},{"internalType":"uint256","name":"amountIn","type":"uint256"},{"internalType":"uint256","name":"amountOutMinimum","type":"uint256"},{"internalType":"uint160","name":"sqrtPriceLimitX96","type":"uint160"}],"internalType":"struct ISwapRouter.ExactInputSingleParams","name":"params","type":"tuple"}],"name":"exactInputSingle","outputs":[{"internalType":"uint256","name":"amountOut","type":"uint256"}],"stateMutability":"payable","type":"function"}
]"#;

type WalletSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersChainClient {
    provider: Arc<Provider<Http>>,
    router_address: Address,
    erc20_abi: Abi,
    router_abi: Abi,
    approval_gas_limit: u64,
    swap_gas_limit: u64,
    /// Keyed by lowercase address.
    signers: HashMap<String, Arc<WalletSigner>>,
}

impl EthersChainClient {
    /// Connects the provider, derives one account per key and returns
    /// the accounts in key order with 1-based ids.
    pub async fn connect(
        config: &swap_core::SwapConfig,
        keys: &[SigningKey],
    ) -> Result<(Arc<Self>, Vec<WalletAccount>)> {
        let provider =
            Provider::<Http>::try_from(config.rpc_url.as_str()).context("invalid RPC_URL")?;
        let chain_id = provider
            .get_chainid()
            .await
            .context("failed to query chain id")?
            .as_u64();

        let router_address: Address = config
            .router_address
            .parse()
            .context("invalid ROUTER_ADDRESS")?;
        let erc20_abi: Abi = serde_json::from_str(ERC20_ABI)?;
        let router_abi: Abi = serde_json::from_str(ROUTER_ABI)?;

        let mut signers = HashMap::new();
        let mut accounts = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let wallet = key
                .expose()
                .parse::<LocalWallet>()
                .with_context(|| format!("PRIVATE_KEYS entry {} is not a valid key", i + 1))?
                .with_chain_id(chain_id);
            let address = format!("{:?}", wallet.address());
            signers.insert(
                address.clone(),
                Arc::new(SignerMiddleware::new(provider.clone(), wallet)),
            );
            accounts.push(WalletAccount::new(i + 1, address, key.clone()));
        }

        let client = Arc::new(Self {
            provider: Arc::new(provider),
            router_address,
            erc20_abi,
            router_abi,
            approval_gas_limit: config.approval_gas_limit,
            swap_gas_limit: config.swap_gas_limit,
            signers,
        });
        Ok((client, accounts))
    }

    fn signer(&self, owner: &str) -> Result<&Arc<WalletSigner>, ChainError> {
        self.signers
            .get(&owner.to_lowercase())
            .ok_or_else(|| ChainError::rpc(format!("no signer for {}", owner)))
    }

    fn erc20(&self, token: Address) -> Contract<Provider<Http>> {
        Contract::new(token, self.erc20_abi.clone(), Arc::clone(&self.provider))
    }

    async fn send(
        &self,
        owner: &str,
        to: Address,
        data: Bytes,
        gas_limit: u64,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError> {
        let signer = self.signer(owner)?;
        let tx = TransactionRequest::new()
            .to(to)
            .data(data)
            .gas(gas_limit)
            .gas_price(U256::from(gas_price))
            .nonce(U256::from(nonce));

        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(|e| classify_send_error(owner, e))?;
        Ok(TxHandle {
            hash: format!("{:?}", pending.tx_hash()),
        })
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn get_balance(&self, address: &str) -> Result<u128, ChainError> {
        let address = parse_address(address)?;
        let balance = self
            .provider
            .get_balance(address, None)
            .await
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        Ok(to_u128(balance))
    }

    async fn get_token_balance(&self, token: &str, address: &str) -> Result<u128, ChainError> {
        let contract = self.erc20(parse_address(token)?);
        let balance: U256 = contract
            .method("balanceOf", parse_address(address)?)
            .map_err(|e| ChainError::rpc(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        Ok(to_u128(balance))
    }

    async fn get_allowance(
        &self,
        token: &str,
        owner: &str,
        spender: &str,
    ) -> Result<u128, ChainError> {
        let contract = self.erc20(parse_address(token)?);
        let allowance: U256 = contract
            .method("allowance", (parse_address(owner)?, parse_address(spender)?))
            .map_err(|e| ChainError::rpc(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        Ok(to_u128(allowance))
    }

    async fn get_pending_nonce(&self, address: &str) -> Result<u64, ChainError> {
        let address = parse_address(address)?;
        let count = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        Ok(count.as_u64())
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        Ok(to_u128(price))
    }

    async fn submit_approval(
        &self,
        token: &str,
        owner: &str,
        spender: &str,
        amount: u128,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError> {
        let token = parse_address(token)?;
        let data = self
            .erc20(token)
            .encode("approve", (parse_address(spender)?, U256::from(amount)))
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        self.send(owner, token, data, self.approval_gas_limit, nonce, gas_price)
            .await
    }

    async fn submit_swap(
        &self,
        owner: &str,
        params: SwapParams,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError> {
        let router = Contract::new(
            self.router_address,
            self.router_abi.clone(),
            Arc::clone(&self.provider),
        );
        let call_params = (
            parse_address(&params.token_in)?,
            parse_address(&params.token_out)?,
            U256::from(params.fee),
            parse_address(&params.recipient)?,
            U256::from(params.deadline),
            U256::from(params.amount_in),
            U256::from(params.amount_out_minimum),
            U256::from(params.sqrt_price_limit_x96),
        );
        let data = router
            .encode("exactInputSingle", (call_params,))
            .map_err(|e| ChainError::rpc(e.to_string()))?;
        self.send(
            owner,
            self.router_address,
            data,
            self.swap_gas_limit,
            nonce,
            gas_price,
        )
        .await
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, ChainError> {
        let hash: TxHash = handle
            .hash
            .parse()
            .map_err(|_| ChainError::rpc(format!("malformed tx hash {}", handle.hash)))?;
        let pending = PendingTransaction::new(hash, &*self.provider);

        let receipt = tokio::time::timeout(
            Duration::from_secs(CONFIRMATION_TIMEOUT_SECS),
            pending,
        )
        .await
        .map_err(|_| ChainError::ConfirmationTimeout {
            hash: handle.hash.clone(),
            seconds: CONFIRMATION_TIMEOUT_SECS,
        })?
        .map_err(|e| ChainError::rpc(e.to_string()))?
        .ok_or_else(|| ChainError::rpc("transaction dropped from the mempool"))?;

        Ok(Receipt {
            hash: handle.hash.clone(),
            success: receipt.status == Some(U64::from(1)),
        })
    }
}

fn parse_address(address: &str) -> Result<Address, ChainError> {
    address
        .parse()
        .map_err(|_| ChainError::rpc(format!("malformed address {}", address)))
}

fn to_u128(value: U256) -> u128 {
    if value > U256::from(u128::MAX) {
        u128::MAX
    } else {
        value.as_u128()
    }
}

fn classify_send_error(owner: &str, error: impl ToString) -> ChainError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("nonce too low")
        || lower.contains("already known")
        || lower.contains("replacement transaction underpriced")
    {
        ChainError::NonceMismatch {
            address: owner.to_string(),
            message,
        }
    } else if lower.contains("insufficient funds") {
        ChainError::InsufficientFunds {
            address: owner.to_string(),
            message,
        }
    } else {
        ChainError::Rpc { message }
    }
}
