//! Approve-then-swap dispatch.
//!
//! Executes one [`SwapAction`] against a [`ChainClient`]: check the
//! router allowance, approve and wait for confirmation when it falls
//! short, then submit the swap with a fresh per-wallet nonce and a
//! short absolute deadline the router enforces on-chain.

use crate::action::SwapAction;
use crate::config::SwapConfig;
use crate::error::ChainError;
use crate::events::{short_hash, Reporter};
use crate::nonce::NonceManager;
use crate::traits::{ChainClient, SwapParams};
use crate::wallet::WalletAccount;
use chrono::Utc;

pub async fn execute_swap(
    action: &SwapAction,
    wallet: &WalletAccount,
    client: &dyn ChainClient,
    nonces: &NonceManager,
    config: &SwapConfig,
    reporter: &Reporter,
) -> Result<(), ChainError> {
    let token_in = config.token_address(action.token_in);
    let router = config.router_address.as_str();

    let allowance = client
        .get_allowance(token_in, &wallet.address, router)
        .await?;

    if allowance >= action.amount_in {
        reporter.system(format!("Wallet {}: no approval needed", wallet.id));
    } else {
        let nonce = nonces.next_nonce(wallet, client).await?;
        let handle = client
            .submit_approval(
                token_in,
                &wallet.address,
                router,
                action.amount_in,
                nonce,
                action.gas_price,
            )
            .await?;
        reporter.trade(format!(
            "Wallet {}: approval sent: {}",
            wallet.id,
            short_hash(&handle.hash)
        ));
        let receipt = client.await_confirmation(&handle).await?;
        if !receipt.success {
            return Err(ChainError::Reverted { hash: receipt.hash });
        }
        reporter.trade(format!("Wallet {}: approval confirmed", wallet.id));
    }

    let nonce = nonces.next_nonce(wallet, client).await?;
    let deadline = Utc::now().timestamp() as u64 + action.deadline_secs;
    let params = SwapParams {
        token_in: token_in.to_string(),
        token_out: config.token_address(action.token_out).to_string(),
        fee: action.fee_tier,
        recipient: wallet.address.clone(),
        deadline,
        amount_in: action.amount_in,
        amount_out_minimum: 0,
        sqrt_price_limit_x96: 0,
    };

    let handle = client
        .submit_swap(&wallet.address, params, nonce, action.gas_price)
        .await?;
    reporter.trade(format!(
        "Wallet {}: swap sent: {}",
        wallet.id,
        short_hash(&handle.hash)
    ));

    let receipt = client.await_confirmation(&handle).await?;
    if !receipt.success {
        return Err(ChainError::Reverted { hash: receipt.hash });
    }
    reporter.trade(format!(
        "Wallet {}: swap confirmed: {}",
        wallet.id,
        short_hash(&receipt.hash)
    ));

    Ok(())
}
