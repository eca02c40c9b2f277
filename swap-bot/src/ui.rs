//! Interactive terminal menu.
//!
//! Menu prompts print directly; everything the core does while a
//! campaign runs arrives through the logger, so the operator can leave
//! a campaign running and come back to the menu at any time.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::sync::Arc;
use swap_core::{
    collect_balances, estimated_fee, format_gwei, format_units, CampaignMode, CampaignPhase,
    ChainClient, GasTier, SwapCampaign, SwapConfig, SwapPair, Token, TransactionQueue,
    WalletAccount,
};

pub struct Menu {
    client: Arc<dyn ChainClient>,
    config: Arc<SwapConfig>,
    wallets: Arc<Vec<WalletAccount>>,
    queue: TransactionQueue,
    campaign: SwapCampaign,
}

impl Menu {
    pub fn new(
        client: Arc<dyn ChainClient>,
        config: Arc<SwapConfig>,
        wallets: Arc<Vec<WalletAccount>>,
        queue: TransactionQueue,
        campaign: SwapCampaign,
    ) -> Self {
        Self {
            client,
            config,
            wallets,
            queue,
            campaign,
        }
    }

    pub async fn run(&self) -> Result<()> {
        println!(
            "--- Auto Swap Bot | {} | {} wallet(s) ---",
            self.config.network_name,
            self.wallets.len()
        );

        loop {
            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Main menu")
                .items(&[
                    "Start auto swap",
                    "View wallet balances",
                    "View transaction queue",
                    "Campaign status",
                    "Stop campaign",
                    "Exit",
                ])
                .default(0)
                .interact_opt()?;

            match choice {
                Some(0) => self.start_campaign().await?,
                Some(1) => self.show_balances().await,
                Some(2) => self.show_queue(),
                Some(3) => self.show_status(),
                Some(4) => self.campaign.stop(),
                Some(5) | None => break,
                _ => {}
            }
        }

        if self.campaign.is_running() {
            self.campaign.stop();
        }
        Ok(())
    }

    async fn start_campaign(&self) -> Result<()> {
        let mode = match self.pick_mode()? {
            Some(mode) => mode,
            None => return Ok(()),
        };

        let total_swaps: u32 = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Number of swaps")
            .default(10)
            .interact_text()?;

        let tier = match self.pick_gas_tier().await? {
            Some(tier) => tier,
            None => return Ok(()),
        };

        if let Err(e) = self.campaign.start(mode, total_swaps, tier).await {
            println!("Cannot start: {}", e);
        }
        Ok(())
    }

    fn pick_mode(&self) -> Result<Option<CampaignMode>> {
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Swap mode")
            .items(&[
                "Swap USDT & ETH",
                "Swap USDT & BTC",
                "Swap BTC & ETH",
                "All pairs",
                "All pairs, repeat every 24h",
                "Back",
            ])
            .default(0)
            .interact_opt()?;

        Ok(match choice {
            Some(0) => Some(CampaignMode::Single(SwapPair::new(Token::Usdt, Token::Eth))),
            Some(1) => Some(CampaignMode::Single(SwapPair::new(Token::Usdt, Token::Btc))),
            Some(2) => Some(CampaignMode::Single(SwapPair::new(Token::Btc, Token::Eth))),
            Some(3) => Some(CampaignMode::AllPairs),
            Some(4) => Some(CampaignMode::Repeating),
            _ => None,
        })
    }

    /// Tier menu with a live fee preview at the current network price.
    async fn pick_gas_tier(&self) -> Result<Option<GasTier>> {
        let base = match self.client.get_gas_price().await {
            Ok(price) => price,
            Err(e) => {
                println!("Could not fetch the gas price: {}", e);
                return Ok(None);
            }
        };

        let items: Vec<String> = GasTier::all()
            .iter()
            .map(|tier| {
                let price = tier.apply(base);
                format!(
                    "{} ({} Gwei, ~{} per swap)",
                    tier.label(),
                    format_gwei(price),
                    format_units(estimated_fee(price, self.config.estimated_gas_usage))
                )
            })
            .collect();

        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Gas price")
            .items(&items)
            .default(0)
            .interact_opt()?;

        Ok(choice.map(|i| GasTier::all()[i]))
    }

    async fn show_balances(&self) {
        match collect_balances(&*self.client, &self.config, &self.wallets).await {
            Ok(snapshots) => {
                println!(
                    "{:<4} {:<15} {:>12} {:>12} {:>12} {:>12}",
                    "ID", "Address", "Native", "USDT", "ETH", "BTC"
                );
                for (wallet, snapshot) in self.wallets.iter().zip(&snapshots) {
                    let token = |t: Token| {
                        snapshot
                            .tokens
                            .iter()
                            .find(|(token, _)| *token == t)
                            .map(|(_, amount)| format_units(*amount))
                            .unwrap_or_else(|| "-".to_string())
                    };
                    println!(
                        "{:<4} {:<15} {:>12} {:>12} {:>12} {:>12}",
                        wallet.id,
                        wallet.short_address(),
                        format_units(snapshot.native),
                        token(Token::Usdt),
                        token(Token::Eth),
                        token(Token::Btc)
                    );
                }
            }
            Err(e) => println!("Balance lookup failed: {}", e),
        }
    }

    fn show_queue(&self) {
        let snapshot = self.queue.snapshot();
        if snapshot.is_empty() {
            println!("Transaction queue is empty.");
            return;
        }
        for tx in snapshot {
            println!(
                "[{}] {} | wallet {} | {} | {}",
                tx.id,
                tx.status.label(),
                tx.wallet_id,
                tx.description,
                tx.enqueued_at.format("%H:%M:%S")
            );
        }
    }

    fn show_status(&self) {
        let status = self.campaign.status();
        match status.phase {
            CampaignPhase::Idle => println!("No campaign is running."),
            CampaignPhase::Running => {
                let mode = status.mode.map(|m| m.label()).unwrap_or_default();
                println!(
                    "Running: {}, {} iteration(s), gas {} Gwei",
                    mode,
                    status.total_swaps,
                    format_gwei(status.gas_price)
                );
            }
            CampaignPhase::Waiting => match status.next_run_at {
                Some(at) => println!(
                    "Waiting; next run at {}",
                    at.format("%Y-%m-%d %H:%M:%S")
                ),
                None => println!("Waiting for the next scheduled run."),
            },
        }
    }
}
