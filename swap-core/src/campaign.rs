//! Campaign driver: Idle -> Running -> (Waiting ->) Idle.
//!
//! A campaign turns a start command into a bounded (or 24h-repeating)
//! sequence of swap actions, checks balances before each one, feeds the
//! queue, and sleeps a randomized interval between swaps. Cancellation
//! is cooperative through a `CancellationToken` observed at every loop
//! boundary and inside every wait, so a stop request takes effect
//! without aborting a transaction already handed to the chain.

use crate::action::{plan_all_pairs, plan_single_pair, PlannedSwap, SwapAction, SwapPair};
use crate::config::SwapConfig;
use crate::error::CampaignError;
use crate::events::Reporter;
use crate::gas::{format_gwei, GasTier};
use crate::queue::TransactionQueue;
use crate::traits::ChainClient;
use crate::wallet::WalletAccount;
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignMode {
    /// Alternate the two directions of one pair across iterations.
    Single(SwapPair),
    /// Full cross-product of supported pairs per iteration.
    AllPairs,
    /// All pairs, re-armed on a fixed interval until stopped.
    Repeating,
}

impl CampaignMode {
    pub fn label(&self) -> String {
        match self {
            CampaignMode::Single(pair) => format!("{} & {}", pair.token_in.symbol(), pair.token_out.symbol()),
            CampaignMode::AllPairs => "All pairs".to_string(),
            CampaignMode::Repeating => "All pairs (24h repeat)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignPhase {
    Idle,
    Running,
    Waiting,
}

#[derive(Debug, Clone)]
pub struct CampaignStatus {
    pub phase: CampaignPhase,
    pub mode: Option<CampaignMode>,
    pub total_swaps: u32,
    /// Wei; fixed for the run once the tier is applied.
    pub gas_price: u128,
    pub next_run_at: Option<DateTime<Local>>,
}

impl Default for CampaignStatus {
    fn default() -> Self {
        Self {
            phase: CampaignPhase::Idle,
            mode: None,
            total_swaps: 0,
            gas_price: 0,
            next_run_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CampaignOptions {
    /// Inclusive bounds for the randomized inter-swap delay, seconds.
    pub delay_secs: (u64, u64),
    /// Re-arm interval for repeating campaigns.
    pub repeat_interval: Duration,
}

impl Default for CampaignOptions {
    fn default() -> Self {
        Self {
            delay_secs: (30, 60),
            repeat_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

struct CampaignInner {
    client: Arc<dyn ChainClient>,
    queue: TransactionQueue,
    wallets: Arc<Vec<WalletAccount>>,
    config: Arc<SwapConfig>,
    reporter: Reporter,
    options: CampaignOptions,
    status: Mutex<CampaignStatus>,
    run_token: Mutex<Option<CancellationToken>>,
}

#[derive(Clone)]
pub struct SwapCampaign {
    inner: Arc<CampaignInner>,
}

impl SwapCampaign {
    pub fn new(
        client: Arc<dyn ChainClient>,
        queue: TransactionQueue,
        wallets: Arc<Vec<WalletAccount>>,
        config: Arc<SwapConfig>,
        reporter: Reporter,
        options: CampaignOptions,
    ) -> Self {
        Self {
            inner: Arc::new(CampaignInner {
                client,
                queue,
                wallets,
                config,
                reporter,
                options,
                status: Mutex::new(CampaignStatus::default()),
                run_token: Mutex::new(None),
            }),
        }
    }

    /// Start a run. Only legal from `Idle`; captures the gas price once
    /// (tier applied) and spawns the driver.
    pub async fn start(
        &self,
        mode: CampaignMode,
        total_swaps: u32,
        tier: GasTier,
    ) -> Result<(), CampaignError> {
        if total_swaps == 0 {
            return Err(CampaignError::InvalidSwapCount);
        }
        if self.inner.wallets.is_empty() {
            return Err(CampaignError::NoWallets);
        }

        // Claim the Idle -> Running transition before any await so a
        // concurrent start cannot slip in during the gas fetch.
        {
            let mut status = self.inner.status.lock().unwrap();
            if status.phase != CampaignPhase::Idle {
                return Err(CampaignError::AlreadyRunning);
            }
            status.phase = CampaignPhase::Running;
        }

        let base = match self.inner.client.get_gas_price().await {
            Ok(price) => price,
            Err(e) => {
                *self.inner.status.lock().unwrap() = CampaignStatus::default();
                return Err(e.into());
            }
        };
        let gas_price = tier.apply(base);
        self.inner.reporter.system(format!(
            "Gas price selected: {} Gwei ({})",
            format_gwei(gas_price),
            tier.label()
        ));

        {
            let mut status = self.inner.status.lock().unwrap();
            status.mode = Some(mode);
            status.total_swaps = total_swaps;
            status.gas_price = gas_price;
            status.next_run_at = None;
        }

        let token = CancellationToken::new();
        *self.inner.run_token.lock().unwrap() = Some(token.clone());

        self.inner.reporter.system(format!(
            "Campaign started: {}, {} iteration(s), {} wallet(s)",
            mode.label(),
            total_swaps,
            self.inner.wallets.len()
        ));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(drive(inner, mode, total_swaps, gas_price, token));
        Ok(())
    }

    /// Request a stop. Legal from `Running` or `Waiting`; in-flight
    /// queue items run to completion, nothing new is dequeued after the
    /// next checkpoint, and any pending repeat timer is cancelled.
    pub fn stop(&self) {
        let token = self.inner.run_token.lock().unwrap().take();
        match token {
            Some(token) => {
                token.cancel();
                self.inner.status.lock().unwrap().next_run_at = None;
                self.inner.reporter.system("Stop requested; finishing in-flight work.");
            }
            None => {
                self.inner.reporter.system("No campaign is running.");
            }
        }
    }

    pub fn status(&self) -> CampaignStatus {
        self.inner.status.lock().unwrap().clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.status.lock().unwrap().phase != CampaignPhase::Idle
    }
}

async fn drive(
    inner: Arc<CampaignInner>,
    mode: CampaignMode,
    total_swaps: u32,
    gas_price: u128,
    token: CancellationToken,
) {
    let wallet_count = inner.wallets.len();

    loop {
        let plan = match mode {
            CampaignMode::Single(pair) => plan_single_pair(pair, total_swaps, wallet_count),
            CampaignMode::AllPairs | CampaignMode::Repeating => {
                plan_all_pairs(total_swaps, wallet_count)
            }
        };

        run_sequence(&inner, &plan, gas_price, &token).await;

        if token.is_cancelled() || mode != CampaignMode::Repeating {
            break;
        }

        // Re-arm: expose the scheduled time, then wait out the interval
        // unless stopped first.
        let next_run = Local::now()
            + chrono::Duration::from_std(inner.options.repeat_interval)
                .unwrap_or_else(|_| chrono::Duration::hours(24));
        {
            let mut status = inner.status.lock().unwrap();
            status.phase = CampaignPhase::Waiting;
            status.next_run_at = Some(next_run);
        }
        inner.reporter.system(format!(
            "All pairs complete; next run scheduled at {}",
            next_run.format("%Y-%m-%d %H:%M:%S")
        ));

        tokio::select! {
            _ = token.cancelled() => break,
            _ = sleep(inner.options.repeat_interval) => {}
        }

        {
            let mut status = inner.status.lock().unwrap();
            status.phase = CampaignPhase::Running;
            status.next_run_at = None;
        }
        inner.reporter.system("Scheduled run starting.");
    }

    let stopped = token.is_cancelled();
    // Release the token slot before the phase goes back to Idle: the
    // instant the status reads Idle a new start() may claim it and
    // store a fresh token, which this driver must not clear.
    *inner.run_token.lock().unwrap() = None;
    *inner.status.lock().unwrap() = CampaignStatus::default();
    if stopped {
        inner.reporter.system("Campaign stopped.");
    } else {
        inner.reporter.trade("Campaign finished: all scheduled swaps handed to the queue.");
    }
}

async fn run_sequence(
    inner: &Arc<CampaignInner>,
    plan: &[PlannedSwap],
    gas_price: u128,
    token: &CancellationToken,
) {
    for planned in plan {
        if token.is_cancelled() {
            return;
        }

        let wallet = &inner.wallets[planned.wallet_index];
        let token_in = planned.pair.token_in;
        let amount = token_in.default_amount();

        match inner
            .client
            .get_token_balance(inner.config.token_address(token_in), &wallet.address)
            .await
        {
            Ok(balance) if balance < amount => {
                // Soft skip: log and continue with the rest of the run.
                inner.reporter.error(format!(
                    "Wallet {}: insufficient {} balance, skipping swap",
                    wallet.id,
                    token_in.symbol()
                ));
            }
            Ok(_) => {
                let action = SwapAction::new(
                    wallet.id,
                    planned.pair,
                    amount,
                    gas_price,
                    inner.config.swap_deadline_secs,
                );
                let description = format!(
                    "Wallet {}: {}, {} {}",
                    wallet.id,
                    planned.pair.label(),
                    token_in.display_amount(),
                    token_in.symbol()
                );
                if let Err(e) = inner.queue.enqueue(action, description, token) {
                    inner
                        .reporter
                        .error(format!("Wallet {}: enqueue failed: {}", wallet.id, e));
                }
            }
            Err(e) => {
                inner.reporter.error(format!(
                    "Wallet {}: balance check failed: {}",
                    wallet.id, e
                ));
            }
        }

        if token.is_cancelled() {
            return;
        }
        wait_between(inner, token).await;
    }
}

/// Randomized inter-swap delay, interruptible by the stop token.
async fn wait_between(inner: &Arc<CampaignInner>, token: &CancellationToken) {
    let (min, max) = inner.options.delay_secs;
    let secs = if max > min {
        rand::Rng::gen_range(&mut rand::thread_rng(), min..=max)
    } else {
        min
    };
    if secs > 0 {
        inner
            .reporter
            .trade(format!("Waiting {} seconds before the next swap...", secs));
    }
    tokio::select! {
        _ = token.cancelled() => {}
        _ = sleep(Duration::from_secs(secs)) => {}
    }
}
