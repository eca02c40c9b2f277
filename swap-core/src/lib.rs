//! # Swap Core - Per-wallet Transaction Sequencing
//!
//! Core subsystem of the auto-swap bot: per-wallet nonce management,
//! the serialized transaction queue, approve-then-swap execution and
//! the campaign state machine. The RPC layer sits behind the
//! [`traits::ChainClient`] trait and the terminal observer consumes the
//! typed event stream from [`events`]; neither is implemented here.
//!
//! ## Modules
//!
//! - [`action`] - Token pairs, swap actions, campaign plan generation
//! - [`campaign`] - Idle/Running/Waiting campaign driver
//! - [`config`] - Process configuration and gas constants
//! - [`error`] - Typed error taxonomy with thiserror
//! - [`events`] - Observer-facing log/queue/balance events
//! - [`gas`] - Gas tier math and fee display
//! - [`nonce`] - Per-wallet nonce cursors
//! - [`queue`] - Per-wallet serial execution pipelines
//! - [`traits`] - The abstract chain client
//! - [`wallet`] - Wallet accounts and balance snapshots

pub mod action;
pub mod campaign;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod gas;
pub mod logger;
pub mod nonce;
pub mod queue;
pub mod traits;
pub mod wallet;

pub use action::{
    plan_all_pairs, plan_single_pair, PlannedSwap, SwapAction, SwapPair, Token, FEE_TIER,
};
pub use campaign::{
    CampaignMode, CampaignOptions, CampaignPhase, CampaignStatus, SwapCampaign,
};
pub use config::SwapConfig;
pub use error::{CampaignError, ChainError, QueueError};
pub use events::{
    short_hash, CoreEvent, LogCategory, LogEvent, QueueEvent, Reporter, TxStatus,
};
pub use gas::{estimated_fee, format_gwei, format_units, GasTier};
pub use logger::setup_logger;
pub use nonce::NonceManager;
pub use queue::{QueueOptions, QueuedTransaction, RetryPolicy, TransactionQueue};
pub use traits::{ChainClient, Receipt, SwapParams, TxHandle};
pub use wallet::{
    collect_balances, collect_wallet_balances, SigningKey, WalletAccount, WalletBalances,
};
