use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved id for the system/IPO account that appears as the counterparty
/// on synthetic IPO-sourced trades. No real participant is ever assigned id 0.
pub const SYSTEM_PARTICIPANT: ParticipantId = ParticipantId(0);

/// Unique identifier for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Unique identifier for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

/// Unique identifier for a hold (fund/share reservation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HoldId(pub u64);

/// Unique identifier for a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

/// Unique identifier for a peer-to-peer transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransferId(pub u64);

macro_rules! impl_id_display {
    ($($ty:ident),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}
impl_id_display!(OrderId, ParticipantId, HoldId, TradeId, TransferId);

/// Prices and quantities are plain integers, per the exchange's points/shares accounting.
pub type Price = u64;
/// Quantity of shares.
pub type Quantity = u64;
/// Point balance amount.
pub type Points = u64;
/// Basis-point percentage (1/100 of a percent; 10_000 bps == 100%).
pub type BasisPoints = u32;

/// Side indicates the direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// OrderType determines how the order is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Specifies a price and can rest on the book (or in the pending-limit area).
    Limit,
    /// Executes immediately against the book, then falls back to the IPO pool (buys only).
    Market,
}

/// OrderStatus is the externally visible lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Partial,
    PendingLimit,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Where a trade's liquidity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSource {
    /// Matched against a resting order in the book.
    Book,
    /// Supplied by the system-owned IPO pool.
    Ipo,
}

/// A resting or terminal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub participant: ParticipantId,
    pub side: Side,
    pub order_type: OrderType,
    pub original_qty: Quantity,
    pub remaining_qty: Quantity,
    /// Only meaningful for `OrderType::Limit`.
    pub limit_price: Price,
    pub status: OrderStatus,
    pub hold: Option<HoldId>,
    /// Per-share rate at which this order's hold was reserved: `limit_price`
    /// for limit buys, the conservative estimate price for market buys, 0
    /// for sells (share holds are unit-denominated, not value-denominated).
    /// Used to compute the per-trade consumed/released split against the hold.
    pub reserve_rate: Price,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }

    /// Book priority key: price then submission order (ties break on id, which is
    /// assigned monotonically so a lower id always means an earlier order).
    pub fn book_key(&self) -> BookKey {
        BookKey {
            price: self.limit_price,
            priority: self.created_at,
            tie: self.id,
            side: self.side,
        }
    }
}

/// Composite ordering key for the order book: price, then time, then id as a final
/// tiebreak against equal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookKey {
    pub price: Price,
    pub priority: i64,
    pub tie: OrderId,
    pub side: Side,
}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.side {
            Side::Buy => self
                .price
                .cmp(&other.price)
                .reverse()
                .then(self.priority.cmp(&other.priority))
                .then(self.tie.cmp(&other.tie)),
            Side::Sell => self
                .price
                .cmp(&other.price)
                .then(self.priority.cmp(&other.priority))
                .then(self.tie.cmp(&other.tie)),
        }
    }
}

/// An immutable trade record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub buyer: ParticipantId,
    pub seller: ParticipantId,
    pub price: Price,
    pub qty: Quantity,
    pub timestamp: i64,
    pub source: TradeSource,
}

/// What a hold is set aside for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldKind {
    LimitBuy,
    MarketBuyEstimate,
    Transfer,
    /// The share-side reservation backing a resting sell order.
    SellShares,
}

/// Lifecycle state of a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldState {
    Active,
    Consumed,
    Released,
}

/// What a hold is reserved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldRef {
    Order(OrderId),
    Transfer(TransferId),
}

/// A reservation of points or shares against a pending obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    pub participant: ParticipantId,
    pub kind: HoldKind,
    /// Points for point-kind holds, shares for `SellShares`.
    pub amount: u64,
    pub reference: HoldRef,
    pub state: HoldState,
}

/// A participant's identity and capability tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub team: String,
    pub is_admin: bool,
}

/// A participant's mutable ledger account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub available_points: Points,
    pub reserved_points: Points,
    pub shares: Quantity,
}

/// An append-only entry in a participant's point history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointHistoryEntry {
    pub participant: ParticipantId,
    pub delta: i64,
    pub reason: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: u64, side: Side, price: Price, created_at: i64) -> Order {
        Order {
            id: OrderId(id),
            participant: ParticipantId(1),
            side,
            order_type: OrderType::Limit,
            original_qty: 10,
            remaining_qty: 10,
            limit_price: price,
            status: OrderStatus::Pending,
            hold: None,
            reserve_rate: price,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn buy_side_sorts_higher_price_first() {
        let a = order(1, Side::Buy, 100, 0).book_key();
        let b = order(2, Side::Buy, 105, 0).book_key();
        assert!(b < a, "higher buy price should sort first");
    }

    #[test]
    fn sell_side_sorts_lower_price_first() {
        let a = order(1, Side::Sell, 100, 0).book_key();
        let b = order(2, Side::Sell, 95, 0).book_key();
        assert!(b < a, "lower sell price should sort first");
    }

    #[test]
    fn equal_price_breaks_tie_by_time() {
        let earlier = order(1, Side::Buy, 100, 10).book_key();
        let later = order(2, Side::Buy, 100, 20).book_key();
        assert!(earlier < later, "earlier order should have priority");
    }
}
