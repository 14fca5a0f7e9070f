use crate::engine::clock::TradingWindow;
use crate::engine::config::{IpoDefaults, PriceTier};
use crate::engine::error::EngineError;
use crate::engine::matching::EngineCore;
use crate::engine::types::{BasisPoints, ParticipantId, Points, Quantity};

/// Who `give_points` credits. Every matched participant gets the **full**
/// amount, never a pooled or divided share — crediting five users under
/// `AllUsers` with amount 100 moves 500 points total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GivePointsTarget {
    User(ParticipantId),
    Group(String),
    AllUsers,
    AllGroups,
}

impl EngineCore {
    /// Credits `amount` to every participant selected by `target`. Bypasses
    /// the trading-hours gate; callers are expected to have already checked
    /// the capability predicate.
    pub fn give_points(&mut self, target: GivePointsTarget, amount: Points) -> Result<usize, EngineError> {
        let now = self.now_ts();
        let recipients: Vec<ParticipantId> = match &target {
            GivePointsTarget::User(id) => vec![*id],
            GivePointsTarget::Group(team) => self
                .participants
                .values()
                .filter(|p| &p.team == team)
                .map(|p| p.id)
                .collect(),
            GivePointsTarget::AllUsers | GivePointsTarget::AllGroups => {
                self.participants.keys().copied().collect()
            }
        };
        for id in &recipients {
            self.ledger
                .credit_points(*id, amount, "admin give_points", now)
                .map_err(|e| self.internal("give_points credit", e))?;
        }
        Ok(recipients.len())
    }

    pub fn set_transfer_fee(&self, rate_bps: BasisPoints, min_fee: Points) -> Result<(), EngineError> {
        self.config
            .update_transfer_fee(rate_bps, min_fee)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn set_trading_limit(&self, percent_bps: BasisPoints) -> Result<(), EngineError> {
        self.config
            .set_trading_limit(percent_bps)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn set_dynamic_tiers(
        &self,
        tiers: Vec<PriceTier>,
        default_percent_bps: BasisPoints,
    ) -> Result<(), EngineError> {
        self.config
            .set_dynamic_tiers(tiers, default_percent_bps)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn update_market_hours(&self, windows: Vec<TradingWindow>) -> Result<(), EngineError> {
        self.config
            .update_trading_windows(windows)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn update_ipo_defaults(&self, defaults: IpoDefaults) -> Result<(), EngineError> {
        self.config
            .update_ipo_defaults(defaults)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Replaces the live IPO pool's parameters directly; unlike
    /// `update_ipo_defaults`, this takes effect immediately rather than only
    /// seeding the next reset.
    pub fn update_ipo(&mut self, shares_remaining: Option<Points>, unit_price: Option<Points>) {
        let current = self.ipo.status();
        self.ipo.set(
            shares_remaining.unwrap_or(current.shares_remaining),
            unit_price.unwrap_or(current.unit_price),
        );
    }

    pub fn reset_ipo(&mut self) {
        let defaults = self.config.get_snapshot().ipo_defaults;
        self.ipo.reset(defaults.initial_shares, defaults.unit_price);
    }

    /// Directly credits shares to a participant's holdings, bypassing the
    /// book entirely. Used for initial share distribution before trading
    /// opens; ordinary share acquisition happens only through buy fills.
    pub fn credit_shares(&mut self, participant: ParticipantId, qty: Quantity) -> Result<(), EngineError> {
        self.ledger
            .add_shares(participant, qty)
            .map_err(|e| self.internal("credit_shares", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::SystemClock;
    use crate::engine::config::{ConfigSnapshot, ConfigStore, TransferFeePolicy};
    use crate::engine::ipo::IpoPool;
    use crate::engine::observer::NullObserver;
    use crate::engine::types::Participant;
    use std::sync::Arc;

    fn core() -> EngineCore {
        let snapshot = ConfigSnapshot {
            transfer_fee: TransferFeePolicy { rate_bps: 1_000, min_fee: 1 },
            ipo_defaults: IpoDefaults { initial_shares: 1_000, unit_price: 20 },
            price_limit_policy: crate::engine::config::PriceLimitPolicy::Flat { percent_bps: 1_000 },
            trading_windows: vec![],
        };
        let config = Arc::new(ConfigStore::new(snapshot).unwrap());
        EngineCore::new(
            config,
            IpoPool::new(1_000, 20),
            Box::new(SystemClock),
            Box::new(NullObserver),
        )
    }

    #[test]
    fn give_points_to_all_users_credits_full_amount_each() {
        let mut engine = core();
        for i in 1..=3u64 {
            engine.register_participant(
                Participant { id: ParticipantId(i), display_name: format!("p{i}"), team: "red".into(), is_admin: false },
                0,
            );
        }
        let n = engine.give_points(GivePointsTarget::AllUsers, 100).unwrap();
        assert_eq!(n, 3);
        for i in 1..=3u64 {
            assert_eq!(engine.ledger.account(ParticipantId(i)).unwrap().available_points, 100);
        }
    }

    #[test]
    fn give_points_to_group_only_credits_matching_team() {
        let mut engine = core();
        engine.register_participant(
            Participant { id: ParticipantId(1), display_name: "a".into(), team: "red".into(), is_admin: false },
            0,
        );
        engine.register_participant(
            Participant { id: ParticipantId(2), display_name: "b".into(), team: "blue".into(), is_admin: false },
            0,
        );
        engine.give_points(GivePointsTarget::Group("red".into()), 50).unwrap();
        assert_eq!(engine.ledger.account(ParticipantId(1)).unwrap().available_points, 50);
        assert_eq!(engine.ledger.account(ParticipantId(2)).unwrap().available_points, 0);
    }
}
