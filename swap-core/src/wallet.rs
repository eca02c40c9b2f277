use crate::action::Token;
use crate::config::SwapConfig;
use crate::error::ChainError;
use crate::traits::ChainClient;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Hex-encoded signing key. Zeroized on drop and redacted from every
/// Debug representation; only the derived address is ever displayed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

/// One configured wallet: stable 1-based ordinal, chain address and
/// signing key. Created at startup, lives for the whole process; the
/// nonce cursor for it is owned by [`crate::nonce::NonceManager`].
#[derive(Clone)]
pub struct WalletAccount {
    pub id: usize,
    pub address: String,
    signing_key: SigningKey,
}

impl WalletAccount {
    pub fn new(id: usize, address: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            id,
            address: address.into(),
            signing_key,
        }
    }

    pub fn signing_key(&self) -> &str {
        self.signing_key.expose()
    }

    /// `0x12345678..abc` style truncation for the wallet panel.
    pub fn short_address(&self) -> String {
        if self.address.len() <= 13 {
            return self.address.clone();
        }
        format!(
            "{}..{}",
            &self.address[..10],
            &self.address[self.address.len() - 3..]
        )
    }
}

impl fmt::Debug for WalletAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletAccount")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("signing_key", &"***REDACTED***")
            .finish()
    }
}

/// Point-in-time balances for one wallet, for the observer.
#[derive(Debug, Clone)]
pub struct WalletBalances {
    pub wallet_id: usize,
    pub address: String,
    pub native: u128,
    pub tokens: Vec<(Token, u128)>,
}

/// Native plus per-token balances for a single wallet.
pub async fn collect_wallet_balances(
    client: &dyn ChainClient,
    config: &SwapConfig,
    wallet: &WalletAccount,
) -> Result<WalletBalances, ChainError> {
    let native = client.get_balance(&wallet.address).await?;
    let mut tokens = Vec::with_capacity(3);
    for token in [Token::Usdt, Token::Eth, Token::Btc] {
        let balance = client
            .get_token_balance(config.token_address(token), &wallet.address)
            .await?;
        tokens.push((token, balance));
    }
    Ok(WalletBalances {
        wallet_id: wallet.id,
        address: wallet.address.clone(),
        native,
        tokens,
    })
}

/// Balance snapshot across all configured wallets.
pub async fn collect_balances(
    client: &dyn ChainClient,
    config: &SwapConfig,
    wallets: &[WalletAccount],
) -> Result<Vec<WalletBalances>, ChainError> {
    let mut snapshots = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        snapshots.push(collect_wallet_balances(client, config, wallet).await?);
    }
    Ok(snapshots)
}
