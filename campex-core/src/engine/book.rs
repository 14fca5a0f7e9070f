use crate::engine::types::{BookKey, Order, OrderId, Price, Side};
use std::collections::{BTreeMap, VecDeque};

/// The resting order book for one side, kept in price-time priority via the
/// ordering on `BookKey`. A plain `BTreeMap` is sufficient here: the engine
/// has exactly one writer (the caller holds the engine's exclusive lock for
/// the duration of any mutation), so there is no need for a lock-free or
/// epoch-reclaimed structure.
#[derive(Debug, Default)]
struct BookSide {
    index: BTreeMap<BookKey, OrderId>,
}

impl BookSide {
    fn insert(&mut self, key: BookKey, id: OrderId) {
        self.index.insert(key, id);
    }

    fn remove(&mut self, key: &BookKey) {
        self.index.remove(key);
    }

    fn best(&self) -> Option<(&BookKey, &OrderId)> {
        self.index.iter().next()
    }

    fn iter_in_priority(&self) -> impl Iterator<Item = (&BookKey, &OrderId)> {
        self.index.iter()
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

/// Orders quarantined outside the tradeable book because their limit price
/// currently falls outside the price-limit band. Held in strict FIFO
/// submission order and re-evaluated whenever the reference price moves.
#[derive(Debug, Default)]
struct PendingLimitArea {
    queue: VecDeque<OrderId>,
}

impl PendingLimitArea {
    fn push(&mut self, id: OrderId) {
        self.queue.push_back(id);
    }

    fn remove(&mut self, id: OrderId) {
        self.queue.retain(|&x| x != id);
    }

    fn iter(&self) -> impl Iterator<Item = &OrderId> {
        self.queue.iter()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// The full order book for the traded symbol: a live bid side, a live ask
/// side, a pending-limit quarantine area, and the backing store of every
/// order the engine knows about (resting, quarantined, or terminal).
#[derive(Debug, Default)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
    pending_limit: PendingLimitArea,
    orders: BTreeMap<OrderId, Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    /// Inserts a brand-new order as a resting, tradeable order on its side.
    pub fn insert_resting(&mut self, order: Order) {
        let key = order.book_key();
        let id = order.id;
        match order.side {
            Side::Buy => self.bids.insert(key, id),
            Side::Sell => self.asks.insert(key, id),
        }
        self.orders.insert(id, order);
    }

    /// Inserts a brand-new order into the pending-limit quarantine area
    /// instead of the tradeable book.
    pub fn insert_pending_limit(&mut self, order: Order) {
        let id = order.id;
        self.pending_limit.push(id);
        self.orders.insert(id, order);
    }

    /// Inserts an order that is never resting or quarantined: market orders
    /// (which have no meaningful book-priority price) and the synthetic
    /// audit orders recorded against IPO-sourced fills. Kept only in the
    /// lookup/history store.
    pub fn insert_terminal(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Moves a quarantined order onto the tradeable book once its price
    /// re-enters the band.
    pub fn promote_from_pending_limit(&mut self, id: OrderId) {
        self.pending_limit.remove(id);
        if let Some(order) = self.orders.get(&id) {
            let key = order.book_key();
            match order.side {
                Side::Buy => self.bids.insert(key, id),
                Side::Sell => self.asks.insert(key, id),
            }
        }
    }

    /// Moves a resting order off the tradeable book into quarantine, e.g.
    /// when the band moves away from its limit price.
    pub fn demote_to_pending_limit(&mut self, id: OrderId) {
        if let Some(order) = self.orders.get(&id) {
            let key = order.book_key();
            match order.side {
                Side::Buy => self.bids.remove(&key),
                Side::Sell => self.asks.remove(&key),
            }
        }
        self.pending_limit.push(id);
    }

    /// Removes an order entirely from whichever structure currently holds
    /// it (tradeable book or quarantine). Does not touch terminal orders
    /// still kept in `orders` for history/lookup purposes.
    pub fn remove_from_active_structures(&mut self, id: OrderId) {
        if let Some(order) = self.orders.get(&id) {
            let key = order.book_key();
            match order.side {
                Side::Buy => self.bids.remove(&key),
                Side::Sell => self.asks.remove(&key),
            }
        }
        self.pending_limit.remove(id);
    }

    pub fn best_bid(&self) -> Option<&Order> {
        self.bids.best().and_then(|(_, id)| self.orders.get(id))
    }

    pub fn best_ask(&self) -> Option<&Order> {
        self.asks.best().and_then(|(_, id)| self.orders.get(id))
    }

    pub fn best_bid_price(&self) -> Option<Price> {
        self.best_bid().map(|o| o.limit_price)
    }

    pub fn best_ask_price(&self) -> Option<Price> {
        self.best_ask().map(|o| o.limit_price)
    }

    /// Top `n` resting orders on a side, in priority order.
    pub fn top_n(&self, side: Side, n: usize) -> Vec<&Order> {
        let iter: Box<dyn Iterator<Item = (&BookKey, &OrderId)>> = match side {
            Side::Buy => Box::new(self.bids.iter_in_priority()),
            Side::Sell => Box::new(self.asks.iter_in_priority()),
        };
        iter.take(n)
            .filter_map(|(_, id)| self.orders.get(id))
            .collect()
    }

    pub fn pending_limit_ids(&self) -> Vec<OrderId> {
        self.pending_limit.iter().copied().collect()
    }

    pub fn resting_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }

    pub fn pending_limit_count(&self) -> usize {
        self.pending_limit.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{OrderStatus, OrderType};

    fn order(id: u64, side: Side, price: Price, created_at: i64, qty: u64) -> Order {
        Order {
            id: OrderId(id),
            participant: crate::engine::types::ParticipantId(1),
            side,
            order_type: OrderType::Limit,
            original_qty: qty,
            remaining_qty: qty,
            limit_price: price,
            status: OrderStatus::Pending,
            hold: None,
            reserve_rate: price,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn best_bid_is_highest_price() {
        let mut book = OrderBook::new();
        book.insert_resting(order(1, Side::Buy, 100, 0, 10));
        book.insert_resting(order(2, Side::Buy, 110, 1, 10));
        assert_eq!(book.best_bid_price(), Some(110));
    }

    #[test]
    fn best_ask_is_lowest_price() {
        let mut book = OrderBook::new();
        book.insert_resting(order(1, Side::Sell, 100, 0, 10));
        book.insert_resting(order(2, Side::Sell, 95, 1, 10));
        assert_eq!(book.best_ask_price(), Some(95));
    }

    #[test]
    fn pending_limit_is_fifo_and_separate_from_tradeable_book() {
        let mut book = OrderBook::new();
        book.insert_pending_limit(order(1, Side::Buy, 1_000, 0, 10));
        book.insert_pending_limit(order(2, Side::Buy, 900, 1, 10));
        assert_eq!(book.best_bid_price(), None);
        assert_eq!(book.pending_limit_ids(), vec![OrderId(1), OrderId(2)]);
    }

    #[test]
    fn promoting_from_pending_limit_makes_it_tradeable() {
        let mut book = OrderBook::new();
        book.insert_pending_limit(order(1, Side::Buy, 100, 0, 10));
        book.promote_from_pending_limit(OrderId(1));
        assert_eq!(book.best_bid_price(), Some(100));
        assert!(book.pending_limit_ids().is_empty());
    }

    #[test]
    fn removing_order_clears_it_from_both_structures() {
        let mut book = OrderBook::new();
        book.insert_resting(order(1, Side::Buy, 100, 0, 10));
        book.remove_from_active_structures(OrderId(1));
        assert_eq!(book.best_bid_price(), None);
    }
}
