use crate::engine::clock::TradingWindow;
use crate::engine::error::ConfigError;
use crate::engine::types::{BasisPoints, Points, Price, Quantity};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One tier of a tiered price-limit policy. `max_price: None` means "and above".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub min_price: Price,
    pub max_price: Option<Price>,
    /// Basis points, e.g. 1000 == 10%.
    pub percent_bps: BasisPoints,
}

impl PriceTier {
    fn contains(&self, price: Price) -> bool {
        price >= self.min_price && self.max_price.map_or(true, |max| price <= max)
    }
}

/// Either a single flat percentage or a sorted, non-overlapping set of tiers.
/// These two shapes never coexist in a snapshot: setting one clears the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLimitPolicy {
    Flat { percent_bps: BasisPoints },
    Tiered {
        tiers: Vec<PriceTier>,
        /// Used as a flat fallback percentage when no tier contains the reference price.
        default_percent_bps: BasisPoints,
    },
}

impl PriceLimitPolicy {
    /// The percentage (in bps) that applies for a given reference price.
    pub fn percent_bps_for(&self, reference_price: Price) -> BasisPoints {
        match self {
            PriceLimitPolicy::Flat { percent_bps } => *percent_bps,
            PriceLimitPolicy::Tiered {
                tiers,
                default_percent_bps,
            } => tiers
                .iter()
                .find(|t| t.contains(reference_price))
                .map(|t| t.percent_bps)
                .unwrap_or(*default_percent_bps),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PriceLimitPolicy::Flat { percent_bps } => validate_percent(*percent_bps),
            PriceLimitPolicy::Tiered {
                tiers,
                default_percent_bps,
            } => {
                validate_percent(*default_percent_bps)?;
                let mut prev_max: Option<Price> = None;
                for (i, tier) in tiers.iter().enumerate() {
                    validate_percent(tier.percent_bps)?;
                    if let Some(max) = tier.max_price {
                        if max < tier.min_price {
                            return Err(ConfigError::InvalidTierSet);
                        }
                    } else if i != tiers.len() - 1 {
                        // an open-ended ("and above") tier must be the last one
                        return Err(ConfigError::InvalidTierSet);
                    }
                    if let Some(prev) = prev_max {
                        if tier.min_price <= prev {
                            return Err(ConfigError::InvalidTierSet);
                        }
                    }
                    prev_max = tier.max_price;
                }
                Ok(())
            }
        }
    }
}

fn validate_percent(percent_bps: BasisPoints) -> Result<(), ConfigError> {
    if percent_bps == 0 || percent_bps > 10_000 {
        return Err(ConfigError::InvalidPercent);
    }
    Ok(())
}

/// System-wide IPO defaults, used to seed or reset the IPO pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpoDefaults {
    pub initial_shares: Quantity,
    pub unit_price: Price,
}

/// Transfer fee parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFeePolicy {
    pub rate_bps: BasisPoints,
    pub min_fee: Points,
}

/// An immutable, atomically-published view of all mutable system parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub transfer_fee: TransferFeePolicy,
    pub ipo_defaults: IpoDefaults,
    pub price_limit_policy: PriceLimitPolicy,
    pub trading_windows: Vec<TradingWindow>,
}

impl ConfigSnapshot {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer_fee.rate_bps > 10_000 {
            return Err(ConfigError::InvalidTransferFeeRate);
        }
        if self.transfer_fee.min_fee < 1 {
            return Err(ConfigError::InvalidTransferMinFee);
        }
        if self.ipo_defaults.unit_price < 1 {
            return Err(ConfigError::InvalidIpoPrice);
        }
        for w in &self.trading_windows {
            if w.start >= w.end {
                return Err(ConfigError::InvalidTradingWindow);
            }
        }
        self.price_limit_policy.validate()
    }
}

/// Holds the live `ConfigSnapshot` behind a lock-free atomic pointer swap, so
/// readers never block on, or observe a partially-applied, a config update.
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
}

impl ConfigStore {
    pub fn new(initial: ConfigSnapshot) -> Result<Self, ConfigError> {
        initial.validate()?;
        Ok(Self {
            current: ArcSwap::from_pointee(initial),
        })
    }

    /// O(1) lock-free read of the current snapshot.
    pub fn get_snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    fn publish(&self, next: ConfigSnapshot) -> Result<(), ConfigError> {
        next.validate()?;
        self.current.store(Arc::new(next));
        Ok(())
    }

    pub fn update_transfer_fee(&self, rate_bps: BasisPoints, min_fee: Points) -> Result<(), ConfigError> {
        let mut next = (*self.get_snapshot()).clone();
        next.transfer_fee = TransferFeePolicy { rate_bps, min_fee };
        self.publish(next)
    }

    pub fn update_ipo_defaults(&self, defaults: IpoDefaults) -> Result<(), ConfigError> {
        let mut next = (*self.get_snapshot()).clone();
        next.ipo_defaults = defaults;
        self.publish(next)
    }

    /// A flat limit supersedes any prior tiered policy, and vice versa.
    pub fn set_trading_limit(&self, percent_bps: BasisPoints) -> Result<(), ConfigError> {
        let mut next = (*self.get_snapshot()).clone();
        next.price_limit_policy = PriceLimitPolicy::Flat { percent_bps };
        self.publish(next)
    }

    pub fn set_dynamic_tiers(
        &self,
        tiers: Vec<PriceTier>,
        default_percent_bps: BasisPoints,
    ) -> Result<(), ConfigError> {
        let mut next = (*self.get_snapshot()).clone();
        next.price_limit_policy = PriceLimitPolicy::Tiered {
            tiers,
            default_percent_bps,
        };
        self.publish(next)
    }

    pub fn update_trading_windows(&self, windows: Vec<TradingWindow>) -> Result<(), ConfigError> {
        let mut next = (*self.get_snapshot()).clone();
        next.trading_windows = windows;
        self.publish(next)
    }
}

/// Deserializable startup configuration, distinct from the runtime
/// `ConfigStore` admin API: this only seeds the first `ConfigSnapshot`, it
/// never mutates a live store. A malformed file fails validation before the
/// engine is constructed at all.
#[derive(Debug, Clone, Deserialize)]
pub struct StartupConfig {
    pub transfer_fee: TransferFeePolicy,
    pub ipo_defaults: IpoDefaults,
    pub price_limit_policy: PriceLimitPolicy,
    pub trading_windows: Vec<TradingWindow>,
}

impl StartupConfig {
    pub fn into_snapshot(self) -> ConfigSnapshot {
        ConfigSnapshot {
            transfer_fee: self.transfer_fee,
            ipo_defaults: self.ipo_defaults,
            price_limit_policy: self.price_limit_policy,
            trading_windows: self.trading_windows,
        }
    }

    pub fn build_store(self) -> Result<ConfigStore, ConfigError> {
        ConfigStore::new(self.into_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn base_snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            transfer_fee: TransferFeePolicy {
                rate_bps: 1_000,
                min_fee: 1,
            },
            ipo_defaults: IpoDefaults {
                initial_shares: 100,
                unit_price: 20,
            },
            price_limit_policy: PriceLimitPolicy::Flat { percent_bps: 1_000 },
            trading_windows: vec![],
        }
    }

    #[test]
    fn flat_policy_supersedes_tiered_and_vice_versa() {
        let store = ConfigStore::new(base_snapshot()).unwrap();
        store
            .set_dynamic_tiers(
                vec![PriceTier {
                    min_price: 0,
                    max_price: None,
                    percent_bps: 2_000,
                }],
                1_000,
            )
            .unwrap();
        assert!(matches!(
            store.get_snapshot().price_limit_policy,
            PriceLimitPolicy::Tiered { .. }
        ));

        store.set_trading_limit(3_000).unwrap();
        assert!(matches!(
            store.get_snapshot().price_limit_policy,
            PriceLimitPolicy::Flat { .. }
        ));
    }

    #[test]
    fn rejects_invalid_transfer_fee_rate() {
        let store = ConfigStore::new(base_snapshot()).unwrap();
        let err = store.update_transfer_fee(10_001, 1).unwrap_err();
        assert_eq!(err, ConfigError::InvalidTransferFeeRate);
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let store = ConfigStore::new(base_snapshot()).unwrap();
        let err = store
            .set_dynamic_tiers(
                vec![
                    PriceTier {
                        min_price: 0,
                        max_price: Some(100),
                        percent_bps: 1_000,
                    },
                    PriceTier {
                        min_price: 50,
                        max_price: Some(200),
                        percent_bps: 1_500,
                    },
                ],
                1_000,
            )
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTierSet);
    }

    #[test]
    fn rejects_window_with_start_after_end() {
        let store = ConfigStore::new(base_snapshot()).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let err = store
            .update_trading_windows(vec![TradingWindow { start, end }])
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTradingWindow);
    }

    #[test]
    fn startup_config_parses_from_json_and_seeds_a_store() {
        let json = r#"{
            "transfer_fee": {"rate_bps": 1000, "min_fee": 1},
            "ipo_defaults": {"initial_shares": 5000, "unit_price": 20},
            "price_limit_policy": {"Flat": {"percent_bps": 1000}},
            "trading_windows": []
        }"#;
        let startup: StartupConfig = serde_json::from_str(json).unwrap();
        let store = startup.build_store().unwrap();
        assert_eq!(store.get_snapshot().ipo_defaults.initial_shares, 5000);
    }

    #[test]
    fn applying_same_update_twice_is_idempotent() {
        let store = ConfigStore::new(base_snapshot()).unwrap();
        store.update_transfer_fee(500, 2).unwrap();
        let first = store.get_snapshot();
        store.update_transfer_fee(500, 2).unwrap();
        let second = store.get_snapshot();
        assert_eq!(*first, *second);
    }
}
