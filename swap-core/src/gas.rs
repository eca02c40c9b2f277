//! Gas tier selection and fee display helpers.
//!
//! A tier is a one-time multiplier over the network's suggested gas
//! price, captured once per campaign start and applied unchanged to
//! every approval and swap of that run.

/// Fee tier presented to the operator before a campaign starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasTier {
    /// Current network gas price as-is.
    Normal,
    /// 80% of the current price.
    Low,
    /// 200% of the current price.
    Double,
}

impl GasTier {
    pub fn all() -> [GasTier; 3] {
        [GasTier::Normal, GasTier::Low, GasTier::Double]
    }

    pub fn label(&self) -> &'static str {
        match self {
            GasTier::Normal => "Normal gas",
            GasTier::Low => "Low gas",
            GasTier::Double => "Double gas",
        }
    }

    /// Apply the tier multiplier to a base price in wei.
    pub fn apply(&self, base: u128) -> u128 {
        match self {
            GasTier::Normal => base,
            GasTier::Low => base * 80 / 100,
            GasTier::Double => base * 2,
        }
    }
}

/// Estimated total fee for one swap at `gas_price`, in wei.
pub fn estimated_fee(gas_price: u128, estimated_gas_usage: u64) -> u128 {
    gas_price * estimated_gas_usage as u128
}

/// Wei to gwei with three decimals, for display.
pub fn format_gwei(wei: u128) -> String {
    format!("{:.3}", wei as f64 / 1e9)
}

/// Wei to whole-token units with five decimals, for display.
pub fn format_units(wei: u128) -> String {
    format!("{:.5}", wei as f64 / 1e18)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_multipliers() {
        assert_eq!(GasTier::Normal.apply(1_000), 1_000);
        assert_eq!(GasTier::Low.apply(1_000), 800);
        assert_eq!(GasTier::Double.apply(1_000), 2_000);
    }

    #[test]
    fn fee_estimate_scales_with_usage() {
        assert_eq!(estimated_fee(2_000_000_000, 150_000), 300_000_000_000_000);
    }

    #[test]
    fn gwei_display() {
        assert_eq!(format_gwei(1_500_000_000), "1.500");
    }
}
