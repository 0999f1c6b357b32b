//! The single payload ceiling applied to every message, whatever its command.
//!
//! Block-carrying messages need the full allowance, so the cap follows the
//! consensus maximum block size. It is raised one step ahead of the limit in
//! force so that a block built for the next permitted limit is not rejected
//! before that limit activates.

use serde::Deserialize;
use serde::Serialize;

use super::error::ConfigError;

/// Read access to the chain-state value that drives the cap.
///
/// Passed into the framer at call time so the framer never reads ambient
/// global state, and so the value is fresh for every header.
pub trait ChainState {
    fn current_consensus_max_block_size(&self) -> u64;
}

impl<F> ChainState for F
where
    F: Fn() -> u64,
{
    fn current_consensus_max_block_size(&self) -> u64 {
        self()
    }
}

/// A block-size limit that never changes. Handy for tools and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBlockSize(pub u64);

impl ChainState for FixedBlockSize {
    fn current_consensus_max_block_size(&self) -> u64 {
        self.0
    }
}

/// Raise schedule for the consensus block-size limit.
///
/// The limit may move by at most `raise_numerator / raise_denominator` per
/// adjustment period. The default is the 5% step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCapPolicy {
    raise_numerator: u64,
    raise_denominator: u64,
}

impl Default for SizeCapPolicy {
    fn default() -> Self {
        Self {
            raise_numerator: 105,
            raise_denominator: 100,
        }
    }
}

impl SizeCapPolicy {
    pub fn new(raise_numerator: u64, raise_denominator: u64) -> Result<Self, ConfigError> {
        let policy = Self {
            raise_numerator,
            raise_denominator,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Deserialized policies bypass [`Self::new`] and must be checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.raise_denominator == 0 {
            return Err(ConfigError::ZeroDenominator);
        }
        if self.raise_numerator < self.raise_denominator {
            return Err(ConfigError::ShrinkingRaise {
                numerator: self.raise_numerator,
                denominator: self.raise_denominator,
            });
        }

        Ok(())
    }

    /// Schedule expressed as a percentage raise, e.g. `5` for 105/100.
    pub fn from_raise_percent(percent: u64) -> Result<Self, ConfigError> {
        Self::new(percent.saturating_add(100), 100)
    }

    /// The next cap the consensus limit is allowed to reach.
    ///
    /// Never less than `current_consensus_max_block_size`, monotonic in it,
    /// and saturating at `u64::MAX`. Do not cache the result across chain-tip
    /// changes.
    pub fn max_payload_bytes(&self, current_consensus_max_block_size: u64) -> u64 {
        let raised = (u128::from(current_consensus_max_block_size)
            * u128::from(self.raise_numerator))
        .checked_div(u128::from(self.raise_denominator))
        .unwrap_or(0);

        u64::try_from(raised)
            .unwrap_or(u64::MAX)
            .max(current_consensus_max_block_size)
    }

    /// Convenience for reading the limit through a [`ChainState`].
    pub fn current_cap(&self, chain: &impl ChainState) -> u64 {
        self.max_payload_bytes(chain.current_consensus_max_block_size())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use proptest::prop_assert;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn default_schedule_is_five_percent() {
        let policy = SizeCapPolicy::default();
        assert_eq!(1_050_000, policy.max_payload_bytes(1_000_000));
        assert_eq!(8_400_000, policy.max_payload_bytes(8_000_000));
    }

    #[test]
    fn rounding_never_drops_below_input() {
        let policy = SizeCapPolicy::default();
        assert_eq!(0, policy.max_payload_bytes(0));
        assert_eq!(1, policy.max_payload_bytes(1));
        assert_eq!(19, policy.max_payload_bytes(19));
        assert_eq!(21, policy.max_payload_bytes(20));
    }

    #[test]
    fn saturates_at_u64_max() {
        let policy = SizeCapPolicy::default();
        assert_eq!(u64::MAX, policy.max_payload_bytes(u64::MAX));
        assert_eq!(u64::MAX, policy.max_payload_bytes(u64::MAX / 100 * 99));
    }

    #[test]
    fn invalid_schedules_are_rejected() {
        assert_eq!(Err(ConfigError::ZeroDenominator), SizeCapPolicy::new(1, 0));
        assert_eq!(
            Err(ConfigError::ShrinkingRaise {
                numerator: 99,
                denominator: 100
            }),
            SizeCapPolicy::new(99, 100)
        );
        assert!(SizeCapPolicy::new(1, 1).is_ok());
    }

    #[test]
    fn flat_schedule_is_identity() {
        let policy = SizeCapPolicy::from_raise_percent(0).unwrap();
        assert_eq!(1_000_000, policy.max_payload_bytes(1_000_000));
    }

    #[test]
    fn chain_state_is_read_on_every_call() {
        let limit = Cell::new(1_000_000u64);
        let chain = || limit.get();
        let policy = SizeCapPolicy::default();

        assert_eq!(1_050_000, policy.current_cap(&chain));
        limit.set(2_000_000);
        assert_eq!(2_100_000, policy.current_cap(&chain));
    }

    #[proptest]
    fn cap_is_monotonic_and_never_below_input(a: u64, b: u64, #[strategy(0u64..1000)] percent: u64) {
        let policy = SizeCapPolicy::from_raise_percent(percent).unwrap();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(policy.max_payload_bytes(low) >= low);
        prop_assert!(policy.max_payload_bytes(low) <= policy.max_payload_bytes(high));
    }
}
