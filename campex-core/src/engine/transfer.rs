use crate::engine::error::EngineError;
use crate::engine::matching::EngineCore;
use crate::engine::types::{HoldKind, HoldRef, ParticipantId, Points, Price, Quantity, TransferId};

/// Result of a successful peer-to-peer transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub transfer_id: TransferId,
    pub amount: Points,
    pub fee: Points,
}

/// Per-participant result line from a force settlement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementLine {
    pub participant: ParticipantId,
    pub shares_liquidated: Quantity,
    pub points_credited: Points,
}

/// Outcome of a full force-settlement batch.
#[derive(Debug, Clone)]
pub struct ForceSettlementOutcome {
    pub settlement_price: Price,
    pub orders_cancelled: usize,
    pub lines: Vec<SettlementLine>,
}

/// `fee = max(ceil(amount * rate_bps / 10_000), min_fee)`.
pub fn compute_transfer_fee(amount: Points, rate_bps: u32, min_fee: Points) -> Points {
    let numer = amount as u128 * rate_bps as u128;
    let fee = numer.div_ceil(10_000) as Points;
    fee.max(min_fee)
}

impl EngineCore {
    /// Moves `amount` points from `src` to `dst`, charging a fee to a system
    /// account. Reserves `amount + fee` against `src` up front so a failure
    /// partway through never leaves a partially-applied transfer.
    pub fn transfer(
        &mut self,
        src: ParticipantId,
        dst: ParticipantId,
        amount: Points,
    ) -> Result<TransferOutcome, EngineError> {
        let snapshot = self.config.get_snapshot();
        let policy = snapshot.transfer_fee;
        let fee = compute_transfer_fee(amount, policy.rate_bps, policy.min_fee);
        let total = amount + fee;
        let now = self.now_ts();
        let transfer_id = self.next_transfer_id();

        let hold_id = self
            .ledger
            .reserve_points(src, total, HoldKind::Transfer, HoldRef::Transfer(transfer_id))
            .map_err(|_| EngineError::InsufficientFunds { participant: src })?;

        self.ledger
            .consume_hold(hold_id)
            .map_err(|e| self.internal("consume transfer hold", e))?;
        self.ledger
            .credit_points(dst, amount, "transfer received", now)
            .map_err(|e| self.internal("credit transfer recipient", e))?;
        self.system_fee_account += fee;
        self.ledger.append_point_history(crate::engine::types::PointHistoryEntry {
            participant: src,
            delta: -(total as i64),
            reason: format!("transfer to {dst} (fee {fee})"),
            timestamp: now,
        });

        Ok(TransferOutcome { transfer_id, amount, fee })
    }

    /// Liquidates every participant's shares at `settlement_price` (or the
    /// current reference price if none is supplied), cancels every resting
    /// and pending-limit order, and credits `shares * price` to each holder.
    /// Runs as a single batch; bypasses the trading-hours gate.
    pub fn force_settlement(&mut self, settlement_price: Option<Price>) -> Result<ForceSettlementOutcome, EngineError> {
        let price = settlement_price.unwrap_or_else(|| self.reference_price());
        let now = self.now_ts();

        let open_order_ids: Vec<_> = self
            .book
            .top_n(crate::engine::types::Side::Buy, usize::MAX)
            .into_iter()
            .chain(self.book.top_n(crate::engine::types::Side::Sell, usize::MAX))
            .map(|o| o.id)
            .chain(self.book.pending_limit_ids())
            .collect();
        let mut orders_cancelled = 0;
        for id in open_order_ids {
            if self.cancel_order_internal(None, id, now).is_ok() {
                orders_cancelled += 1;
            }
        }

        let participant_ids: Vec<ParticipantId> = self.participants.keys().copied().collect();
        let mut lines = Vec::with_capacity(participant_ids.len());
        for participant in participant_ids {
            let shares = self.ledger.account(participant).map(|a| a.shares).unwrap_or(0);
            if shares == 0 {
                continue;
            }
            let proceeds = price.saturating_mul(shares);
            self.ledger
                .remove_shares(participant, shares)
                .map_err(|e| self.internal("force settlement remove shares", e))?;
            self.ledger
                .credit_points(participant, proceeds, "force settlement liquidation", now)
                .map_err(|e| self.internal("force settlement credit", e))?;
            lines.push(SettlementLine {
                participant,
                shares_liquidated: shares,
                points_credited: proceeds,
            });
        }

        self.last_trade_price = Some(price);
        tracing::warn!(price, orders_cancelled, participants = lines.len(), "force settlement executed");
        Ok(ForceSettlementOutcome {
            settlement_price: price,
            orders_cancelled,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_ceiling_and_respects_minimum() {
        assert_eq!(compute_transfer_fee(100, 1_000, 1), 10);
        assert_eq!(compute_transfer_fee(1, 1_000, 1), 1);
        assert_eq!(compute_transfer_fee(5, 100, 5), 5);
    }
}
