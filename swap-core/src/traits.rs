use crate::error::ChainError;
use async_trait::async_trait;

/// Handle for a submitted, not yet confirmed transaction.
#[derive(Debug, Clone)]
pub struct TxHandle {
    pub hash: String,
}

/// Settled outcome of a submitted transaction.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub hash: String,
    pub success: bool,
}

/// Parameters for an `exactInputSingle` router call.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub token_in: String,
    pub token_out: String,
    pub fee: u32,
    pub recipient: String,
    /// Absolute unix deadline enforced by the router contract.
    pub deadline: u64,
    pub amount_in: u128,
    pub amount_out_minimum: u128,
    pub sqrt_price_limit_x96: u128,
}

/// Abstract RPC surface the core runs against.
///
/// Every call may block on the network or fail; nonce-related submission
/// failures must come back as [`ChainError::NonceMismatch`] so the queue
/// can invalidate the wallet's cursor.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native balance of an account, in wei.
    async fn get_balance(&self, address: &str) -> Result<u128, ChainError>;

    /// ERC-20 balance of `address` for `token`.
    async fn get_token_balance(&self, token: &str, address: &str) -> Result<u128, ChainError>;

    /// Amount `owner` has approved `spender` to move for `token`.
    async fn get_allowance(
        &self,
        token: &str,
        owner: &str,
        spender: &str,
    ) -> Result<u128, ChainError>;

    /// Pending-inclusive transaction count for an account.
    async fn get_pending_nonce(&self, address: &str) -> Result<u64, ChainError>;

    /// Current suggested gas price, in wei.
    async fn get_gas_price(&self) -> Result<u128, ChainError>;

    /// Submit an ERC-20 `approve` signed by `owner`.
    async fn submit_approval(
        &self,
        token: &str,
        owner: &str,
        spender: &str,
        amount: u128,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError>;

    /// Submit an `exactInputSingle` swap signed by `owner`.
    async fn submit_swap(
        &self,
        owner: &str,
        params: SwapParams,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError>;

    /// Wait for a submitted transaction to settle.
    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, ChainError>;
}
