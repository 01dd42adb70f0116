use ethers::types::U256;

/// Share of the node's gas price offered on every transaction.
pub const GAS_PRICE_PERCENT: u64 = 85;
/// Gas limit as a share of the node's estimate.
pub const GAS_LIMIT_PERCENT: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_price: U256,
    /// `None` leaves the limit to the signer's own estimate.
    pub gas_limit: Option<U256>,
}

pub fn discounted_gas_price(gas_price: U256) -> U256 {
    gas_price * GAS_PRICE_PERCENT / 100
}

pub fn padded_gas_limit(estimate: U256) -> U256 {
    estimate * GAS_LIMIT_PERCENT / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_truncates_like_integer_division() {
        assert_eq!(discounted_gas_price(U256::from(100u64)), U256::from(85u64));
        assert_eq!(discounted_gas_price(U256::from(7u64)), U256::from(5u64));
        assert_eq!(
            discounted_gas_price(U256::from(20_000_000_000u64)),
            U256::from(17_000_000_000u64)
        );
    }

    #[test]
    fn limit_gets_twenty_percent_headroom() {
        assert_eq!(padded_gas_limit(U256::from(21_000u64)), U256::from(25_200u64));
        assert_eq!(padded_gas_limit(U256::from(9u64)), U256::from(10u64));
        assert_eq!(padded_gas_limit(U256::zero()), U256::zero());
    }
}
