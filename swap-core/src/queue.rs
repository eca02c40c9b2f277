//! Per-wallet transaction sequencing.
//!
//! Every wallet gets one dedicated serial worker task consuming a FIFO
//! channel, so no two units of work for the same wallet ever run
//! concurrently while different wallets advance independently. A global
//! visible list mirrors all in-flight items for the observer; terminal
//! items are pruned after a short grace period.

use crate::action::SwapAction;
use crate::config::SwapConfig;
use crate::error::QueueError;
use crate::events::{QueueEvent, Reporter, TxStatus};
use crate::executor::execute_swap;
use crate::nonce::NonceManager;
use crate::traits::ChainClient;
use crate::wallet::{collect_wallet_balances, WalletAccount};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What to do when a submission fails with a stale nonce.
///
/// The cursor is invalidated either way; `RetryOnce` additionally
/// re-executes the same action with the refreshed nonce instead of
/// dropping the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Mark the item failed and move on (source behavior).
    Drop,
    /// Re-execute the failed action once with a fresh nonce.
    #[default]
    RetryOnce,
}

#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub retry_policy: RetryPolicy,
    /// How long a settled item stays on the visible list.
    pub prune_grace: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            prune_grace: Duration::from_secs(2),
        }
    }
}

/// Observer-visible queue entry.
#[derive(Debug, Clone)]
pub struct QueuedTransaction {
    pub id: u64,
    pub wallet_id: usize,
    pub description: String,
    pub status: TxStatus,
    pub enqueued_at: DateTime<Local>,
}

struct QueuedWork {
    id: u64,
    description: String,
    action: SwapAction,
    cancel: CancellationToken,
}

struct QueueInner {
    client: Arc<dyn ChainClient>,
    nonces: Arc<NonceManager>,
    config: Arc<SwapConfig>,
    reporter: Reporter,
    visible: Mutex<Vec<QueuedTransaction>>,
    next_id: AtomicU64,
    options: QueueOptions,
    senders: HashMap<usize, UnboundedSender<QueuedWork>>,
}

#[derive(Clone)]
pub struct TransactionQueue {
    inner: Arc<QueueInner>,
}

impl TransactionQueue {
    /// Spawns one serial worker per configured wallet.
    pub fn new(
        client: Arc<dyn ChainClient>,
        nonces: Arc<NonceManager>,
        config: Arc<SwapConfig>,
        wallets: &[WalletAccount],
        reporter: Reporter,
        options: QueueOptions,
    ) -> Self {
        let mut senders = HashMap::new();
        let mut receivers: Vec<(WalletAccount, UnboundedReceiver<QueuedWork>)> = Vec::new();
        for wallet in wallets {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(wallet.id, tx);
            receivers.push((wallet.clone(), rx));
        }

        let inner = Arc::new(QueueInner {
            client,
            nonces,
            config,
            reporter,
            visible: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            options,
            senders,
        });

        for (wallet, rx) in receivers {
            tokio::spawn(worker_loop(Arc::clone(&inner), wallet, rx));
        }

        Self { inner }
    }

    /// Append an action to its wallet's execution chain. The item
    /// enters the visible list as `pending` immediately; `cancel`
    /// is checked at the dequeue boundary, so a stop request prevents
    /// execution of anything not yet started.
    pub fn enqueue(
        &self,
        action: SwapAction,
        description: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<u64, QueueError> {
        let wallet_id = action.wallet_id;
        let sender = self
            .inner
            .senders
            .get(&wallet_id)
            .ok_or(QueueError::UnknownWallet(wallet_id))?;

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let description = description.into();

        {
            let mut visible = self.inner.visible.lock().unwrap();
            visible.push(QueuedTransaction {
                id,
                wallet_id,
                description: description.clone(),
                status: TxStatus::Pending,
                enqueued_at: Local::now(),
            });
        }
        self.inner.emit(id, wallet_id, &description, TxStatus::Pending);
        self.inner
            .reporter
            .system(format!("Transaction [{}] queued: {}", id, description));

        sender
            .send(QueuedWork {
                id,
                description,
                action,
                cancel: cancel.clone(),
            })
            .map_err(|_| QueueError::WorkerGone(wallet_id))?;

        Ok(id)
    }

    /// Snapshot of the visible list, for the queue viewer.
    pub fn snapshot(&self) -> Vec<QueuedTransaction> {
        self.inner.visible.lock().unwrap().clone()
    }
}

impl QueueInner {
    fn emit(&self, id: u64, wallet_id: usize, description: &str, status: TxStatus) {
        self.reporter.queue(QueueEvent {
            id,
            wallet_id,
            description: description.to_string(),
            status,
            timestamp: Local::now(),
        });
    }

    fn set_status(&self, id: u64, status: TxStatus) {
        let entry = {
            let mut visible = self.visible.lock().unwrap();
            visible.iter_mut().find(|tx| tx.id == id).map(|tx| {
                tx.status = status;
                (tx.wallet_id, tx.description.clone())
            })
        };
        if let Some((wallet_id, description)) = entry {
            self.emit(id, wallet_id, &description, status);
        }
    }

    fn remove(&self, id: u64) {
        let mut visible = self.visible.lock().unwrap();
        visible.retain(|tx| tx.id != id);
    }
}

async fn worker_loop(
    inner: Arc<QueueInner>,
    wallet: WalletAccount,
    mut rx: UnboundedReceiver<QueuedWork>,
) {
    debug!("wallet {}: queue worker started", wallet.id);

    while let Some(work) = rx.recv().await {
        // Dequeue boundary: a stop request issued before this point
        // prevents execution entirely.
        if work.cancel.is_cancelled() {
            inner.set_status(work.id, TxStatus::Failed);
            inner.reporter.system(format!(
                "Transaction [{}] cancelled before execution",
                work.id
            ));
            prune_later(&inner, work.id);
            continue;
        }

        inner.set_status(work.id, TxStatus::Processing);

        let mut result = execute_swap(
            &work.action,
            &wallet,
            &*inner.client,
            &inner.nonces,
            &inner.config,
            &inner.reporter,
        )
        .await;

        if let Err(e) = &result {
            // A submission the chain rejected without consuming its
            // nonce leaves the cursor one ahead; re-fetch before the
            // next item so it does not submit a gapped nonce.
            if e.leaves_nonce_unused() {
                inner.nonces.invalidate(wallet.id).await;
            }
            if e.is_nonce_related() && inner.options.retry_policy == RetryPolicy::RetryOnce {
                inner.reporter.system(format!(
                    "Transaction [{}] hit a stale nonce, retrying with a fresh one",
                    work.id
                ));
                result = execute_swap(
                    &work.action,
                    &wallet,
                    &*inner.client,
                    &inner.nonces,
                    &inner.config,
                    &inner.reporter,
                )
                .await;
                if let Err(e2) = &result {
                    if e2.leaves_nonce_unused() {
                        inner.nonces.invalidate(wallet.id).await;
                    }
                }
            }
        }

        match result {
            Ok(()) => {
                inner.set_status(work.id, TxStatus::Complete);
                // Balances changed; push a fresh snapshot for this wallet.
                if let Ok(snapshot) =
                    collect_wallet_balances(&*inner.client, &inner.config, &wallet).await
                {
                    inner.reporter.balances(vec![snapshot]);
                }
            }
            Err(e) => {
                inner.reporter.error(format!(
                    "Transaction [{}] failed: {} ({})",
                    work.id, work.description, e
                ));
                inner.set_status(work.id, TxStatus::Failed);
            }
        }

        prune_later(&inner, work.id);
    }

    debug!("wallet {}: queue worker shut down", wallet.id);
}

fn prune_later(inner: &Arc<QueueInner>, id: u64) {
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        sleep(inner.options.prune_grace).await;
        inner.remove(id);
    });
}
