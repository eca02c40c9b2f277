mod chain;
mod config;
mod ui;

use anyhow::Result;
use chain::EthersChainClient;
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::sync::Arc;
use swap_core::{
    setup_logger, CampaignOptions, ChainClient, NonceManager, QueueOptions, Reporter, RetryPolicy,
    SwapCampaign, TransactionQueue,
};
use tracing::{error, info};
use ui::Menu;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to do with a swap that failed on a stale nonce.
    #[arg(long, value_enum, default_value_t = RetryArg::RetryOnce)]
    retry: RetryArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RetryArg {
    /// Drop the swap after refreshing the nonce cursor.
    Drop,
    /// Resubmit once with the refreshed nonce.
    RetryOnce,
}

impl From<RetryArg> for RetryPolicy {
    fn from(arg: RetryArg) -> Self {
        match arg {
            RetryArg::Drop => RetryPolicy::Drop,
            RetryArg::RetryOnce => RetryPolicy::RetryOnce,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = setup_logger();
    dotenv().ok();

    let args = Args::parse();

    let env = match config::load_environment() {
        Ok(env) => env,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    let config = Arc::new(env.config);
    let (client, accounts) = EthersChainClient::connect(&config, &env.keys).await?;
    info!(
        "Connected to {} with {} wallet(s).",
        config.network_name,
        accounts.len()
    );

    let wallets = Arc::new(accounts);
    let (reporter, mut rx) = Reporter::new();
    // Log events reach the terminal through the logger already; the
    // menu reads queue and balance state on demand, so the channel only
    // needs draining.
    tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let client: Arc<dyn ChainClient> = client;
    let queue = TransactionQueue::new(
        Arc::clone(&client),
        Arc::new(NonceManager::new()),
        Arc::clone(&config),
        &wallets,
        reporter.clone(),
        QueueOptions {
            retry_policy: args.retry.into(),
            ..QueueOptions::default()
        },
    );
    let campaign = SwapCampaign::new(
        Arc::clone(&client),
        queue.clone(),
        Arc::clone(&wallets),
        Arc::clone(&config),
        reporter,
        CampaignOptions::default(),
    );

    Menu::new(client, config, wallets, queue, campaign)
        .run()
        .await
}
