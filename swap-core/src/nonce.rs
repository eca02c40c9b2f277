//! Per-wallet nonce cursors.
//!
//! Each wallet gets a private, monotonically increasing nonce sequence.
//! The cursor starts unknown, is seeded from the chain's pending count
//! on first use, and is advanced locally afterwards. A nonce-related
//! submission failure invalidates the cursor so the next allocation
//! re-fetches from the chain.

use crate::error::ChainError;
use crate::traits::ChainClient;
use crate::wallet::WalletAccount;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NonceManager {
    /// wallet id -> next nonce to hand out. Absent = unknown.
    cursors: Mutex<HashMap<usize, u64>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce for `wallet`, fetching the pending count from the
    /// chain when the cursor is unset. Fetch failures propagate and
    /// leave the cursor unset so the next call re-fetches.
    pub async fn next_nonce(
        &self,
        wallet: &WalletAccount,
        client: &dyn ChainClient,
    ) -> Result<u64, ChainError> {
        {
            let mut cursors = self.cursors.lock().await;
            if let Some(next) = cursors.get(&wallet.id).copied() {
                cursors.insert(wallet.id, next + 1);
                return Ok(next);
            }
        }

        // Cursor unknown: seed from the chain. The wallet's pipeline is
        // serial, so no other task can race this wallet's entry.
        let fetched = client.get_pending_nonce(&wallet.address).await?;
        debug!("wallet {}: nonce cursor seeded at {}", wallet.id, fetched);

        let mut cursors = self.cursors.lock().await;
        cursors.insert(wallet.id, fetched + 1);
        Ok(fetched)
    }

    /// Force the next allocation for `wallet_id` to re-fetch from chain.
    pub async fn invalidate(&self, wallet_id: usize) {
        let mut cursors = self.cursors.lock().await;
        if cursors.remove(&wallet_id).is_some() {
            debug!("wallet {}: nonce cursor invalidated", wallet_id);
        }
    }

    /// Current cursor value without advancing it.
    pub async fn peek(&self, wallet_id: usize) -> Option<u64> {
        self.cursors.lock().await.get(&wallet_id).copied()
    }
}
