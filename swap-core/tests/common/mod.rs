#![allow(dead_code)]

//! In-memory chain double shared by the integration tests.
//!
//! Records every submission (owner, nonce, gas price) so tests can
//! assert on the exact sequences the queue produced, supports scripted
//! failures by submission ordinal, and counts concurrent submissions
//! per owner to catch serialization violations.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swap_core::{
    ChainClient, ChainError, CoreEvent, QueueEvent, Receipt, SigningKey, SwapConfig, SwapParams,
    TxHandle, WalletAccount,
};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Approval,
    Swap,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub owner: String,
    pub nonce: u64,
    pub gas_price: u128,
    pub kind: SubmissionKind,
    pub ok: bool,
}

#[derive(Default)]
struct FakeState {
    pending_nonces: HashMap<String, u64>,
    token_balances: HashMap<(String, String), u128>,
    allowances: HashMap<(String, String), u128>,
    gas_price: u128,
    default_token_balance: u128,
    submissions: Vec<Submission>,
    fail_submissions: HashMap<usize, ChainError>,
    nonce_fetches: usize,
    fail_nonce_fetch: bool,
}

pub struct FakeChainClient {
    state: Mutex<FakeState>,
    in_flight: Mutex<HashSet<String>>,
    overlap_violations: AtomicUsize,
    submit_delay: Duration,
}

impl FakeChainClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                gas_price: 1_000_000_000,
                default_token_balance: 1_000_000_000_000_000_000_000,
                ..FakeState::default()
            }),
            in_flight: Mutex::new(HashSet::new()),
            overlap_violations: AtomicUsize::new(0),
            submit_delay: Duration::from_millis(20),
        })
    }

    pub fn set_pending_nonce(&self, owner: &str, nonce: u64) {
        self.state
            .lock()
            .unwrap()
            .pending_nonces
            .insert(owner.to_string(), nonce);
    }

    pub fn set_gas_price(&self, price: u128) {
        self.state.lock().unwrap().gas_price = price;
    }

    pub fn set_allowance(&self, token: &str, owner: &str, amount: u128) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token.to_string(), owner.to_string()), amount);
    }

    pub fn set_token_balance(&self, token: &str, owner: &str, amount: u128) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert((token.to_string(), owner.to_string()), amount);
    }

    pub fn set_default_token_balance(&self, amount: u128) {
        self.state.lock().unwrap().default_token_balance = amount;
    }

    /// Fail the nth submission (1-based, counted across all wallets).
    pub fn fail_submission(&self, ordinal: usize, error: ChainError) {
        self.state
            .lock()
            .unwrap()
            .fail_submissions
            .insert(ordinal, error);
    }

    pub fn fail_nonce_fetches(&self, fail: bool) {
        self.state.lock().unwrap().fail_nonce_fetch = fail;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn nonce_fetches(&self) -> usize {
        self.state.lock().unwrap().nonce_fetches
    }

    pub fn overlap_violations(&self) -> usize {
        self.overlap_violations.load(Ordering::SeqCst)
    }

    async fn submit(
        &self,
        owner: &str,
        nonce: u64,
        gas_price: u128,
        kind: SubmissionKind,
    ) -> Result<TxHandle, ChainError> {
        // Overlap detection: two concurrent submissions for the same
        // owner mean the per-wallet serialization broke.
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if !in_flight.insert(owner.to_string()) {
                self.overlap_violations.fetch_add(1, Ordering::SeqCst);
            }
        }
        tokio::time::sleep(self.submit_delay).await;
        self.in_flight.lock().unwrap().remove(owner);

        let mut state = self.state.lock().unwrap();
        let ordinal = state.submissions.len() + 1;
        let failure = state.fail_submissions.get(&ordinal).cloned();
        let ok = failure.is_none();
        state.submissions.push(Submission {
            owner: owner.to_string(),
            nonce,
            gas_price,
            kind,
            ok,
        });
        if ok {
            // Accepted by the chain: the pending count advances.
            state.pending_nonces.insert(owner.to_string(), nonce + 1);
        }
        drop(state);

        match failure {
            Some(error) => Err(error),
            None => Ok(TxHandle {
                hash: format!("0xfake{:08x}{:08x}", ordinal, nonce),
            }),
        }
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn get_balance(&self, _address: &str) -> Result<u128, ChainError> {
        Ok(1_000_000_000_000_000_000)
    }

    async fn get_token_balance(&self, token: &str, address: &str) -> Result<u128, ChainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .token_balances
            .get(&(token.to_string(), address.to_string()))
            .copied()
            .unwrap_or(state.default_token_balance))
    }

    async fn get_allowance(
        &self,
        token: &str,
        owner: &str,
        _spender: &str,
    ) -> Result<u128, ChainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .allowances
            .get(&(token.to_string(), owner.to_string()))
            .copied()
            .unwrap_or(u128::MAX))
    }

    async fn get_pending_nonce(&self, address: &str) -> Result<u64, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.nonce_fetches += 1;
        if state.fail_nonce_fetch {
            return Err(ChainError::rpc("nonce fetch unavailable"));
        }
        Ok(state
            .pending_nonces
            .get(address)
            .copied()
            .unwrap_or_default())
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn submit_approval(
        &self,
        _token: &str,
        owner: &str,
        _spender: &str,
        _amount: u128,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError> {
        self.submit(owner, nonce, gas_price, SubmissionKind::Approval)
            .await
    }

    async fn submit_swap(
        &self,
        owner: &str,
        _params: SwapParams,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxHandle, ChainError> {
        self.submit(owner, nonce, gas_price, SubmissionKind::Swap)
            .await
    }

    async fn await_confirmation(&self, handle: &TxHandle) -> Result<Receipt, ChainError> {
        Ok(Receipt {
            hash: handle.hash.clone(),
            success: true,
        })
    }
}

pub fn test_config() -> SwapConfig {
    SwapConfig::new(
        "http://localhost:8545",
        "Testnet",
        "0xrouter00000000000000000000000000000000000",
        "0xusdt0000000000000000000000000000000000000",
        "0xeth00000000000000000000000000000000000000",
        "0xbtc00000000000000000000000000000000000000",
    )
}

pub fn test_wallets(count: usize) -> Vec<WalletAccount> {
    (1..=count)
        .map(|i| {
            WalletAccount::new(
                i,
                format!("0xwallet{:037}", i),
                SigningKey::new(format!("0xkey{}", i)),
            )
        })
        .collect()
}

/// Drain queue-state events into a shared vec in the background.
pub fn collect_queue_events(
    mut rx: UnboundedReceiver<CoreEvent>,
) -> Arc<Mutex<Vec<QueueEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let CoreEvent::Queue(queue_event) = event {
                sink.lock().unwrap().push(queue_event);
            }
        }
    });
    events
}

/// Poll `condition` until it holds or two seconds elapse.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not met within 2s");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
