//! # Facilitator Reward
//!
//! The receiving side pays the facilitator who finalizes a transfer out of
//! the transferred amount: `reward = min(gasPrice × gasLimit, amount)` with
//! saturating multiplication, and the beneficiary gets the rest.

use mbus_core::U256;
use serde::{Deserialize, Serialize};

/// Split of a transferred amount between beneficiary and facilitator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Paid to the finalizing caller.
    pub reward: U256,
    /// Paid to the beneficiary.
    pub principal: U256,
}

impl RewardSplit {
    /// Split `amount` given the message's gas parameters.
    pub fn compute(amount: U256, gas_price: U256, gas_limit: U256) -> Self {
        let reward = gas_price.saturating_mul(gas_limit).min(amount);
        Self {
            reward,
            principal: amount - reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn units(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_basic_split() {
        let split = RewardSplit::compute(units(1000), units(2), units(50));
        assert_eq!(split.reward, units(100));
        assert_eq!(split.principal, units(900));
    }

    #[test]
    fn test_reward_capped_at_amount() {
        let split = RewardSplit::compute(units(10), units(2), units(50));
        assert_eq!(split.reward, units(10));
        assert_eq!(split.principal, U256::ZERO);
    }

    #[test]
    fn test_zero_gas_price_pays_no_reward() {
        let split = RewardSplit::compute(units(10), U256::ZERO, units(50));
        assert_eq!(split.reward, U256::ZERO);
        assert_eq!(split.principal, units(10));
    }

    #[test]
    fn test_overflowing_product_saturates() {
        let split = RewardSplit::compute(units(7), U256::MAX, U256::MAX);
        assert_eq!(split.reward, units(7));
        assert_eq!(split.principal, U256::ZERO);
    }

    proptest! {
        #[test]
        fn prop_split_conserves_amount(
            amount in any::<u128>(),
            gas_price in any::<u64>(),
            gas_limit in any::<u64>(),
        ) {
            let amount = U256::from(amount);
            let split = RewardSplit::compute(amount, U256::from(gas_price), U256::from(gas_limit));
            prop_assert_eq!(split.reward + split.principal, amount);
            prop_assert!(split.reward <= amount);
            prop_assert!(split.reward <= U256::from(gas_price) * U256::from(gas_limit));
        }
    }
}
