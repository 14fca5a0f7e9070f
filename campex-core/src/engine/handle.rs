use crate::engine::admin::GivePointsTarget;
use crate::engine::clock::TradingWindow;
use crate::engine::config::{ConfigStore, IpoDefaults, PriceTier};
use crate::engine::error::EngineError;
use crate::engine::ipo::IpoStatus;
use crate::engine::matching::{EngineCore, PlacementOutcome};
use crate::engine::quotes::{FiveLevelQuote, PriceLimitInfo, PriceSummary};
use crate::engine::transfer::{ForceSettlementOutcome, TransferOutcome};
use crate::engine::types::{
    BasisPoints, Order, OrderId, OrderType, ParticipantId, Points, Price, Quantity, Side, Trade,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether `participant` may perform administrative actions.
/// Supplied by the caller; the engine itself has no notion of roles.
pub type CapabilityPredicate = Arc<dyn Fn(ParticipantId) -> bool + Send + Sync>;

/// The public façade over [`EngineCore`]: every spec-level operation as a
/// plain method, taking and releasing the engine's exclusive lock for the
/// duration of the call. This is the only way external callers touch the
/// engine; `EngineCore` itself is never exposed outside the crate.
#[derive(Clone)]
pub struct EngineHandle {
    core: Arc<Mutex<EngineCore>>,
    config: Arc<ConfigStore>,
    can_administer: CapabilityPredicate,
}

impl EngineHandle {
    pub fn new(core: EngineCore, config: Arc<ConfigStore>, can_administer: CapabilityPredicate) -> Self {
        Self {
            core: Arc::new(Mutex::new(core)),
            config,
            can_administer,
        }
    }

    fn require_admin(&self, participant: ParticipantId) -> Result<(), EngineError> {
        if (self.can_administer)(participant) {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied)
        }
    }

    // ---- authenticated writes -----------------------------------------

    pub fn place_order(
        &self,
        participant: ParticipantId,
        side: Side,
        order_type: OrderType,
        qty: Quantity,
        limit_price: Option<Price>,
    ) -> Result<PlacementOutcome, EngineError> {
        self.core.lock().place_order(participant, side, order_type, qty, limit_price)
    }

    pub fn cancel_order(&self, participant: ParticipantId, order_id: OrderId) -> Result<(), EngineError> {
        self.core.lock().cancel_order(participant, order_id)
    }

    pub fn transfer(&self, src: ParticipantId, dst: ParticipantId, amount: Points) -> Result<TransferOutcome, EngineError> {
        self.core.lock().transfer(src, dst, amount)
    }

    // ---- public reads ----------------------------------------------

    pub fn price_summary(&self) -> PriceSummary {
        self.core.lock().price_summary()
    }

    pub fn five_level_quote(&self) -> FiveLevelQuote {
        self.core.lock().five_level_quote()
    }

    pub fn recent_trades(&self, n: usize) -> Vec<Trade> {
        self.core.lock().recent_trades(n)
    }

    pub fn ipo_status(&self) -> IpoStatus {
        self.core.lock().ipo_status()
    }

    pub fn trading_hours(&self) -> Vec<TradingWindow> {
        self.core.lock().trading_hours()
    }

    pub fn transfer_fee_public(&self) -> crate::engine::config::TransferFeePolicy {
        self.core.lock().transfer_fee_public()
    }

    pub fn order_snapshot(&self, id: OrderId) -> Option<Order> {
        self.core.lock().order_snapshot(id)
    }

    // ---- admin surface, all gated by the capability predicate ----------

    // Config-only admin writes go straight to the lock-free `ConfigStore`
    // rather than the engine mutex: they never touch book/ledger state, and
    // readers observe the new snapshot atomically regardless of whether the
    // engine lock happens to be held at that instant.

    pub fn set_transfer_fee(&self, admin: ParticipantId, rate_bps: BasisPoints, min_fee: Points) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.config
            .update_transfer_fee(rate_bps, min_fee)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn set_trading_limit(&self, admin: ParticipantId, percent_bps: BasisPoints) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.config
            .set_trading_limit(percent_bps)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn set_dynamic_tiers(
        &self,
        admin: ParticipantId,
        tiers: Vec<PriceTier>,
        default_percent_bps: BasisPoints,
    ) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.config
            .set_dynamic_tiers(tiers, default_percent_bps)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn update_market_hours(&self, admin: ParticipantId, windows: Vec<TradingWindow>) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.config
            .update_trading_windows(windows)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn update_ipo_defaults(&self, admin: ParticipantId, defaults: IpoDefaults) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.config
            .update_ipo_defaults(defaults)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn update_ipo(
        &self,
        admin: ParticipantId,
        shares_remaining: Option<Quantity>,
        unit_price: Option<Price>,
    ) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().update_ipo(shares_remaining, unit_price);
        Ok(())
    }

    pub fn reset_ipo(&self, admin: ParticipantId) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().reset_ipo();
        Ok(())
    }

    pub fn force_settlement(&self, admin: ParticipantId, settlement_price: Option<Price>) -> Result<ForceSettlementOutcome, EngineError> {
        self.require_admin(admin)?;
        self.core.lock().force_settlement(settlement_price)
    }

    pub fn give_points(&self, admin: ParticipantId, target: GivePointsTarget, amount: Points) -> Result<usize, EngineError> {
        self.require_admin(admin)?;
        self.core.lock().give_points(target, amount)
    }

    pub fn get_pending_orders(&self, admin: ParticipantId, limit: usize) -> Result<Vec<Order>, EngineError> {
        self.require_admin(admin)?;
        Ok(self.core.lock().get_pending_orders(limit))
    }

    pub fn trigger_manual_match(&self, admin: ParticipantId) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().trigger_manual_match();
        Ok(())
    }

    pub fn get_price_limit_info(&self, admin: ParticipantId, test_price: Option<Price>) -> Result<PriceLimitInfo, EngineError> {
        self.require_admin(admin)?;
        Ok(self.core.lock().get_price_limit_info(test_price))
    }

    pub fn cancel_order_admin(&self, admin: ParticipantId, order_id: OrderId) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().cancel_order_admin(order_id)
    }

    pub fn register_participant(&self, admin: ParticipantId, participant: crate::engine::types::Participant, starting_points: Points) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().register_participant(participant, starting_points);
        Ok(())
    }

    pub fn credit_shares(&self, admin: ParticipantId, participant: ParticipantId, qty: Quantity) -> Result<(), EngineError> {
        self.require_admin(admin)?;
        self.core.lock().credit_shares(participant, qty)
    }

    /// Spawns the periodic sweep ticker on a dedicated thread: a no-op match
    /// request plus orphaned-hold cleanup, run every `interval`, for as long
    /// as the returned handle is kept (dropping it stops the ticker).
    pub fn run_periodic_sweep(&self, interval: Duration) -> SweepHandle {
        let core = Arc::clone(&self.core);
        let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(0);
        let join = std::thread::spawn(move || {
            let ticker = crossbeam::channel::tick(interval);
            loop {
                crossbeam::select! {
                    recv(ticker) -> _ => {
                        core.lock().periodic_sweep();
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
        });
        SweepHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }
}

/// Keeps the periodic-sweep thread alive; dropping it signals the thread to
/// stop and joins it.
pub struct SweepHandle {
    stop_tx: Option<crossbeam::channel::Sender<()>>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop_tx.take();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
