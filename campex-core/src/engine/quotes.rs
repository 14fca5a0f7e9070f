use crate::engine::price_policy::PriceBand;
use crate::engine::types::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// One price level's aggregated resting quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLevel {
    pub price: Price,
    pub qty: Quantity,
}

/// Top five price levels on each side of the book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiveLevelQuote {
    pub bids: Vec<QuoteLevel>,
    pub asks: Vec<QuoteLevel>,
}

/// Summary statistics derived from the session's trade history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub last: Option<Price>,
    pub change: i64,
    /// Basis points, so 250 == 2.50%.
    pub change_percent_bps: i64,
    pub high: Option<Price>,
    pub low: Option<Price>,
    pub open: Option<Price>,
    pub volume: Quantity,
}

/// What the current price-limit band is, and optionally whether a
/// caller-supplied test price would fall inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLimitInfo {
    pub reference_price: Price,
    pub band: PriceBand,
    pub test_price_in_band: Option<bool>,
}
