use crate::engine::config::PriceLimitPolicy;
use crate::engine::types::Price;

/// Inclusive `[low, high]` band within which trades and active limit orders must lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PriceBand {
    pub low: Price,
    pub high: Price,
}

impl PriceBand {
    pub fn contains(&self, price: Price) -> bool {
        price >= self.low && price <= self.high
    }
}

/// Computes the price band around a reference price for the given policy.
///
/// Band endpoints round outward (floor for the low end, ceiling for the high
/// end) so the reference price is always itself in-band.
pub fn compute_band(reference_price: Price, policy: &PriceLimitPolicy) -> PriceBand {
    let percent_bps = policy.percent_bps_for(reference_price) as u128;
    let r = reference_price as u128;

    // low = floor(r * (10_000 - percent_bps) / 10_000)
    let low = (r * (10_000 - percent_bps)) / 10_000;
    // high = ceil(r * (10_000 + percent_bps) / 10_000)
    let high_numer = r * (10_000 + percent_bps);
    let high = high_numer.div_ceil(10_000);

    PriceBand {
        low: low as Price,
        high: high as Price,
    }
}
