//! Observer-facing event stream.
//!
//! The core never draws anything; it emits typed log, queue-state and
//! balance events over a channel. The application side decides how to
//! render them. Every event is mirrored to `tracing` under the
//! `swap_log` target so the rolling file log captures the same history.

use crate::wallet::WalletBalances;
use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    System,
    Trade,
    Error,
}

impl LogCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LogCategory::System => "system",
            LogCategory::Trade => "trade",
            LogCategory::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub category: LogCategory,
    pub message: String,
}

/// Queue item lifecycle. Terminal states are pruned from the visible
/// list shortly after being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl TxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Processing => "processing",
            TxStatus::Complete => "complete",
            TxStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Complete | TxStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct QueueEvent {
    pub id: u64,
    pub wallet_id: usize,
    pub description: String,
    pub status: TxStatus,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub enum CoreEvent {
    Log(LogEvent),
    Queue(QueueEvent),
    Balances(Vec<WalletBalances>),
}

/// Cloneable sender half handed to every core component.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: UnboundedSender<CoreEvent>,
}

impl Reporter {
    pub fn new() -> (Self, UnboundedReceiver<CoreEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn log(&self, category: LogCategory, message: String) {
        match category {
            LogCategory::Error => warn!(target: "swap_log", "{}", message),
            _ => info!(target: "swap_log", "{}", message),
        }
        let _ = self.tx.send(CoreEvent::Log(LogEvent {
            timestamp: Local::now(),
            category,
            message,
        }));
    }

    pub fn system(&self, message: impl Into<String>) {
        self.log(LogCategory::System, message.into());
    }

    pub fn trade(&self, message: impl Into<String>) {
        self.log(LogCategory::Trade, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogCategory::Error, message.into());
    }

    pub fn queue(&self, event: QueueEvent) {
        let _ = self.tx.send(CoreEvent::Queue(event));
    }

    pub fn balances(&self, snapshots: Vec<WalletBalances>) {
        let _ = self.tx.send(CoreEvent::Balances(snapshots));
    }
}

/// `0xabcdef…` to `0xabcd...f01` style truncation for tx hashes.
pub fn short_hash(hash: &str) -> String {
    if hash.len() <= 10 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_long_hashes() {
        let hash = "0x1234567890abcdef1234567890abcdef12345678";
        assert_eq!(short_hash(hash), "0x1234...5678");
        assert_eq!(short_hash("0xabc"), "0xabc");
    }
}
