//! Error taxonomy for the swap core.
//!
//! `ChainError` is the typed boundary with the RPC layer; everything the
//! queue and campaign need to react to (nonce staleness in particular)
//! is distinguishable here rather than by string matching at the call
//! site.

use thiserror::Error;

/// Errors surfaced by a [`crate::traits::ChainClient`] implementation.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    /// The submitted nonce was stale or duplicated. The cached cursor
    /// for the wallet must be invalidated before the next submission.
    #[error("nonce mismatch for {address}: {message}")]
    NonceMismatch { address: String, message: String },

    /// The account cannot cover the transfer or the gas for it.
    #[error("insufficient funds for {address}: {message}")]
    InsufficientFunds { address: String, message: String },

    /// The transaction was mined but reverted.
    #[error("transaction reverted: {hash}")]
    Reverted { hash: String },

    /// The confirmation wait exceeded the client's bound.
    #[error("confirmation wait for {hash} timed out after {seconds}s")]
    ConfirmationTimeout { hash: String, seconds: u64 },

    /// Any other RPC or transport failure.
    #[error("rpc error: {message}")]
    Rpc { message: String },
}

impl ChainError {
    pub fn rpc(message: impl Into<String>) -> Self {
        ChainError::Rpc {
            message: message.into(),
        }
    }

    /// Whether the submitted nonce itself was stale or duplicated.
    pub fn is_nonce_related(&self) -> bool {
        matches!(self, ChainError::NonceMismatch { .. })
    }

    /// Whether the failure left an allocated nonce unused on chain.
    /// The wallet's cursor must be re-fetched before the next item or
    /// every later submission carries a gapped, too-high nonce.
    pub fn leaves_nonce_unused(&self) -> bool {
        matches!(
            self,
            ChainError::NonceMismatch { .. }
                | ChainError::InsufficientFunds { .. }
                | ChainError::Rpc { .. }
        )
    }
}

/// Errors from the campaign state machine.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("a campaign is already running")]
    AlreadyRunning,

    #[error("no wallets configured")]
    NoWallets,

    #[error("swap count must be greater than zero")]
    InvalidSwapCount,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Errors from the transaction queue.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("no execution pipeline for wallet {0}")]
    UnknownWallet(usize),

    #[error("execution pipeline for wallet {0} has shut down")]
    WorkerGone(usize),
}
