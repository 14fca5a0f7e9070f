use crate::engine::types::{HoldId, OrderId, ParticipantId};
use thiserror::Error;

/// Stable error kinds surfaced to callers of the engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Operation attempted outside trading windows.
    #[error("market is closed")]
    MarketClosed,

    /// Pre-trade resource check failed: not enough available points.
    #[error("insufficient funds for participant {participant}")]
    InsufficientFunds { participant: ParticipantId },

    /// Pre-trade resource check failed: not enough owned shares.
    #[error("insufficient shares for participant {participant}")]
    InsufficientShares { participant: ParticipantId },

    /// Cancellation target does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Cancellation attempted by someone other than the order's owner.
    #[error("participant {participant} does not own order {order}")]
    NotOrderOwner {
        participant: ParticipantId,
        order: OrderId,
    },

    /// The order already reached a terminal state; the operation is a no-op.
    #[error("order {0} is already in a terminal state")]
    AlreadyTerminal(OrderId),

    /// An admin configuration change failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The order request itself was malformed, independent of market state.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// The capability predicate refused the operation.
    #[error("permission denied")]
    PermissionDenied,

    /// Optimistic concurrency loss on the ledger, exhausted its retry budget.
    /// Unreachable under the current single-writer-per-symbol lock: there is
    /// no CAS retry loop to lose. Kept for callers matching on a stable error
    /// surface across lock models; not a sign of missing retry logic here.
    #[error("ledger conflict on hold {0}")]
    Conflict(HoldId),

    /// An invariant was violated or a storage fault occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned while mutating an order already resting in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelOrderError {
    #[error("order not found")]
    OrderNotFound,
    #[error("order already in a terminal state")]
    AlreadyTerminal,
}

/// Errors returned by the config store's validation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("transfer fee rate must be within [0, 1]")]
    InvalidTransferFeeRate,
    #[error("transfer minimum fee must be >= 1")]
    InvalidTransferMinFee,
    #[error("IPO shares_remaining must be >= 0")]
    InvalidIpoShares,
    #[error("IPO unit_price must be >= 1")]
    InvalidIpoPrice,
    #[error("price limit tiers must be sorted, non-overlapping, and have percent in (0,100]")]
    InvalidTierSet,
    #[error("percent must be in (0,100]")]
    InvalidPercent,
    #[error("trading window start must be before end")]
    InvalidTradingWindow,
}

/// Errors returned by ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient available funds")]
    InsufficientFunds,
    #[error("insufficient available shares")]
    InsufficientShares,
    #[error("hold not found")]
    HoldNotFound,
    #[error("hold is not active")]
    HoldNotActive,
    #[error("participant not found")]
    ParticipantNotFound,
}
