use crate::engine::types::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// The system-owned pool that backs market buys once the book runs dry.
///
/// Conceptually the IPO pool is a standing sell order owned by the system:
/// it has no price-time priority of its own and is only ever consumed after
/// the resting book is exhausted for a market buy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoPool {
    pub shares_remaining: Quantity,
    pub unit_price: Price,
}

/// A point-in-time view of the pool, returned to callers who only need to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpoStatus {
    pub shares_remaining: Quantity,
    pub unit_price: Price,
}

impl IpoPool {
    pub fn new(shares_remaining: Quantity, unit_price: Price) -> Self {
        Self {
            shares_remaining,
            unit_price,
        }
    }

    pub fn status(&self) -> IpoStatus {
        IpoStatus {
            shares_remaining: self.shares_remaining,
            unit_price: self.unit_price,
        }
    }

    /// Draws up to `requested` shares from the pool, returning how many were
    /// actually taken. Never takes more than what remains; a request against
    /// an empty pool returns 0.
    pub fn take(&mut self, requested: Quantity) -> Quantity {
        let taken = requested.min(self.shares_remaining);
        self.shares_remaining -= taken;
        taken
    }

    /// Replaces the pool's parameters outright, used by the admin `update_ipo` operation.
    pub fn set(&mut self, shares_remaining: Quantity, unit_price: Price) {
        self.shares_remaining = shares_remaining;
        self.unit_price = unit_price;
    }

    /// Resets the pool back to a pair of system defaults, used by the admin `reset_ipo` operation.
    pub fn reset(&mut self, shares_remaining: Quantity, unit_price: Price) {
        self.set(shares_remaining, unit_price);
    }

    pub fn is_exhausted(&self) -> bool {
        self.shares_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_never_exceeds_remaining() {
        let mut pool = IpoPool::new(10, 20);
        assert_eq!(pool.take(15), 10);
        assert_eq!(pool.shares_remaining, 0);
        assert!(pool.is_exhausted());
    }

    #[test]
    fn take_partial_leaves_remainder() {
        let mut pool = IpoPool::new(10, 20);
        assert_eq!(pool.take(4), 4);
        assert_eq!(pool.shares_remaining, 6);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut pool = IpoPool::new(0, 20);
        pool.reset(500, 25);
        assert_eq!(pool.status(), IpoStatus { shares_remaining: 500, unit_price: 25 });
    }
}
