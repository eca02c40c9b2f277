use crate::action::Token;
use serde::Deserialize;

/// Gas limit for ERC-20 approvals.
pub const APPROVAL_GAS_LIMIT: u64 = 100_000;

/// Gas limit for router swaps.
pub const SWAP_GAS_LIMIT: u64 = 150_000;

/// Gas usage assumed when previewing fees per tier.
pub const ESTIMATED_GAS_USAGE: u64 = 150_000;

/// Window added to "now" for the router deadline, seconds.
pub const SWAP_DEADLINE_SECS: u64 = 120;

/// Static configuration for one bot process: endpoint, contracts,
/// display label and gas constants. Built from the environment by the
/// application crate; the core assumes it is pre-validated.
#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    pub rpc_url: String,
    pub network_name: String,
    pub router_address: String,
    pub usdt_address: String,
    pub eth_address: String,
    pub btc_address: String,
    pub approval_gas_limit: u64,
    pub swap_gas_limit: u64,
    pub estimated_gas_usage: u64,
    pub swap_deadline_secs: u64,
}

impl SwapConfig {
    pub fn new(
        rpc_url: impl Into<String>,
        network_name: impl Into<String>,
        router_address: impl Into<String>,
        usdt_address: impl Into<String>,
        eth_address: impl Into<String>,
        btc_address: impl Into<String>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            network_name: network_name.into(),
            router_address: router_address.into(),
            usdt_address: usdt_address.into(),
            eth_address: eth_address.into(),
            btc_address: btc_address.into(),
            approval_gas_limit: APPROVAL_GAS_LIMIT,
            swap_gas_limit: SWAP_GAS_LIMIT,
            estimated_gas_usage: ESTIMATED_GAS_USAGE,
            swap_deadline_secs: SWAP_DEADLINE_SECS,
        }
    }

    pub fn token_address(&self, token: Token) -> &str {
        match token {
            Token::Usdt => &self.usdt_address,
            Token::Eth => &self.eth_address,
            Token::Btc => &self.btc_address,
        }
    }
}
