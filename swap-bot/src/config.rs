use anyhow::{bail, Context, Result};
use std::env;
use swap_core::{SigningKey, SwapConfig};

/// Everything the process needs from the environment, validated before
/// any network work starts. A malformed key is fatal here rather than a
/// surprise mid-campaign.
pub struct BotEnvironment {
    pub config: SwapConfig,
    pub keys: Vec<SigningKey>,
}

pub fn load_environment() -> Result<BotEnvironment> {
    let rpc_url = require("RPC_URL")?;
    let router_address = require("ROUTER_ADDRESS")?;
    let usdt_address = require("USDT_ADDRESS")?;
    let eth_address = require("ETH_ADDRESS")?;
    let btc_address = require("BTC_ADDRESS")?;
    let network_name = env::var("NETWORK_NAME").unwrap_or_else(|_| "Unknown Network".to_string());

    let raw_keys = require("PRIVATE_KEYS")?;
    let keys = parse_private_keys(&raw_keys)?;
    if keys.is_empty() {
        bail!("PRIVATE_KEYS is set but contains no keys");
    }

    Ok(BotEnvironment {
        config: SwapConfig::new(
            rpc_url,
            network_name,
            router_address,
            usdt_address,
            eth_address,
            btc_address,
        ),
        keys,
    })
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} is not set in the environment or .env", name))
}

/// Comma-separated hex keys, with or without the 0x prefix.
fn parse_private_keys(raw: &str) -> Result<Vec<SigningKey>> {
    let mut keys = Vec::new();
    for (i, entry) in raw.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let normalized = if entry.starts_with("0x") {
            entry.to_string()
        } else {
            format!("0x{}", entry)
        };
        let hex = &normalized[2..];
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("PRIVATE_KEYS entry {} is not a 64-character hex key", i + 1);
        }
        keys.push(SigningKey::new(normalized));
    }
    Ok(keys)
}
