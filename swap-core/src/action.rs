//! Token-pair model and campaign plan generation.
//!
//! A [`SwapAction`] is a pure description of one exchange; generating
//! the plan for a run is separated from executing it so the round-robin
//! and direction-alternation rules can be tested without a chain.

use serde::{Deserialize, Serialize};

/// Uniswap-V3 style fee tier used for every swap.
pub const FEE_TIER: u32 = 3000;

/// 1.0 of an 18-decimals token.
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// 0.001 of an 18-decimals token.
pub const MILLI_TOKEN: u128 = 1_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Usdt,
    Eth,
    Btc,
}

impl Token {
    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Usdt => "USDT",
            Token::Eth => "ETH",
            Token::Btc => "BTC",
        }
    }

    /// Default amount per swap, smallest unit: 1 USDT when swapping out
    /// of USDT, 0.001 otherwise.
    pub fn default_amount(&self) -> u128 {
        match self {
            Token::Usdt => ONE_TOKEN,
            _ => MILLI_TOKEN,
        }
    }

    /// Human display of [`Token::default_amount`].
    pub fn display_amount(&self) -> &'static str {
        match self {
            Token::Usdt => "1",
            _ => "0.001",
        }
    }
}

/// One directed token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPair {
    pub token_in: Token,
    pub token_out: Token,
}

impl SwapPair {
    pub const fn new(token_in: Token, token_out: Token) -> Self {
        Self {
            token_in,
            token_out,
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            token_in: self.token_out,
            token_out: self.token_in,
        }
    }

    /// The six directed pairs the router supports, in execution order.
    pub fn all() -> [SwapPair; 6] {
        [
            SwapPair::new(Token::Usdt, Token::Eth),
            SwapPair::new(Token::Eth, Token::Usdt),
            SwapPair::new(Token::Usdt, Token::Btc),
            SwapPair::new(Token::Btc, Token::Usdt),
            SwapPair::new(Token::Btc, Token::Eth),
            SwapPair::new(Token::Eth, Token::Btc),
        ]
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", self.token_in.symbol(), self.token_out.symbol())
    }
}

/// Immutable description of one swap, consumed exactly once by the queue.
#[derive(Debug, Clone)]
pub struct SwapAction {
    /// 1-based wallet ordinal.
    pub wallet_id: usize,
    pub token_in: Token,
    pub token_out: Token,
    /// Smallest unit.
    pub amount_in: u128,
    pub fee_tier: u32,
    /// Seconds added to "now" when the router deadline is stamped.
    pub deadline_secs: u64,
    /// Fixed for the whole campaign run, chosen once at start.
    pub gas_price: u128,
}

impl SwapAction {
    pub fn new(wallet_id: usize, pair: SwapPair, amount_in: u128, gas_price: u128, deadline_secs: u64) -> Self {
        Self {
            wallet_id,
            token_in: pair.token_in,
            token_out: pair.token_out,
            amount_in,
            fee_tier: FEE_TIER,
            deadline_secs,
            gas_price,
        }
    }

    pub fn pair(&self) -> SwapPair {
        SwapPair::new(self.token_in, self.token_out)
    }
}

/// One slot of a campaign plan: which wallet swaps which pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSwap {
    /// 0-based index into the configured wallet list.
    pub wallet_index: usize,
    pub pair: SwapPair,
}

/// Single-pair plan: alternates direction by iteration parity and
/// round-robins wallets by iteration index.
pub fn plan_single_pair(pair: SwapPair, total_swaps: u32, wallet_count: usize) -> Vec<PlannedSwap> {
    if wallet_count == 0 {
        return Vec::new();
    }
    (0..total_swaps as usize)
        .map(|i| PlannedSwap {
            wallet_index: i % wallet_count,
            pair: if i % 2 == 0 { pair } else { pair.reversed() },
        })
        .collect()
}

/// All-pairs plan: each iteration picks the next wallet round-robin and
/// runs the full cross-product of supported pairs for it.
pub fn plan_all_pairs(total_swaps: u32, wallet_count: usize) -> Vec<PlannedSwap> {
    if wallet_count == 0 {
        return Vec::new();
    }
    let mut plan = Vec::with_capacity(total_swaps as usize * 6);
    for i in 0..total_swaps as usize {
        let wallet_index = i % wallet_count;
        for pair in SwapPair::all() {
            plan.push(PlannedSwap { wallet_index, pair });
        }
    }
    plan
}
