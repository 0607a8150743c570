//! Loan pricing.
//!
//! Kept behind a trait so pricing rules (tiers, discounts) can change without
//! touching the borrow workflow.

use libris_core::{LendingError, LendingResult, Money};

use crate::config::LendingConfig;

/// Maps an item's base price and a loan duration to the fee charged.
///
/// Implementations must be pure: same inputs, same price, no side effects.
pub trait PricingPolicy: Send + Sync {
    /// Reject durations outside the allowed window with `InvalidDuration`.
    fn check_duration(&self, duration_days: u32) -> LendingResult<()>;

    fn price(&self, base_price: Money, duration_days: u32) -> LendingResult<Money>;
}

/// `base_price + duration_days * per_diem_rate`, for durations in
/// `[min_days, max_days]`. A price beyond the decimal range is
/// `InvalidAmount`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PerDiemPricing {
    per_diem_rate: Money,
    min_days: u32,
    max_days: u32,
}

impl PerDiemPricing {
    pub fn new(per_diem_rate: Money, min_days: u32, max_days: u32) -> Self {
        Self {
            per_diem_rate,
            min_days,
            max_days,
        }
    }

    pub fn per_diem_rate(&self) -> Money {
        self.per_diem_rate
    }
}

impl Default for PerDiemPricing {
    fn default() -> Self {
        Self::from(&LendingConfig::default())
    }
}

impl From<&LendingConfig> for PerDiemPricing {
    fn from(config: &LendingConfig) -> Self {
        Self::new(
            config.per_diem_rate,
            config.min_duration_days,
            config.max_duration_days,
        )
    }
}

impl PricingPolicy for PerDiemPricing {
    fn check_duration(&self, duration_days: u32) -> LendingResult<()> {
        if (self.min_days..=self.max_days).contains(&duration_days) {
            Ok(())
        } else {
            Err(LendingError::InvalidDuration(duration_days))
        }
    }

    fn price(&self, base_price: Money, duration_days: u32) -> LendingResult<Money> {
        self.check_duration(duration_days)?;
        self.per_diem_rate
            .checked_mul(duration_days)
            .and_then(|per_diem| base_price.checked_add(per_diem))
            .ok_or_else(|| {
                LendingError::invalid_amount(format!(
                    "price of {base_price} over {duration_days} days is out of range"
                ))
            })
    }
}
