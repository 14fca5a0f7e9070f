use campex_core::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// A clock pinned to a fixed instant, so tests never race the wall clock.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

/// A trading window open all day on the fixed test date.
pub fn open_all_day() -> TradingWindow {
    TradingWindow {
        start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
    }
}

/// Builds a fresh engine and the `ConfigStore` it shares with its config, so
/// callers that need to build an `EngineHandle` around the same store (e.g.
/// for the periodic-sweep ticker) can get at both halves.
pub fn test_engine_with_config(
    ipo_shares: Quantity,
    ipo_price: Price,
    percent_bps: u32,
) -> (EngineCore, Arc<ConfigStore>) {
    let snapshot = ConfigSnapshot {
        transfer_fee: TransferFeePolicy { rate_bps: 1_000, min_fee: 1 },
        ipo_defaults: IpoDefaults { initial_shares: ipo_shares, unit_price: ipo_price },
        price_limit_policy: PriceLimitPolicy::Flat { percent_bps },
        trading_windows: vec![open_all_day()],
    };
    let config = Arc::new(ConfigStore::new(snapshot).unwrap());
    let engine = EngineCore::new(
        Arc::clone(&config),
        IpoPool::new(ipo_shares, ipo_price),
        Box::new(FixedClock(noon())),
        Box::new(NullObserver),
    );
    (engine, config)
}

/// Builds a fresh engine: flat `percent_bps` price-limit band, market open
/// all day, and an IPO pool seeded with `ipo_shares` at `ipo_price`.
pub fn test_engine(ipo_shares: Quantity, ipo_price: Price, percent_bps: u32) -> EngineCore {
    test_engine_with_config(ipo_shares, ipo_price, percent_bps).0
}

pub fn participant(id: u64, team: &str) -> Participant {
    Participant {
        id: ParticipantId(id),
        display_name: format!("participant-{id}"),
        team: team.to_string(),
        is_admin: false,
    }
}

/// Registers a participant with the given starting point balance and share count.
pub fn seed_participant(engine: &mut EngineCore, id: u64, team: &str, points: Points, shares: Quantity) {
    engine.register_participant(participant(id, team), points);
    if shares > 0 {
        engine.credit_shares(ParticipantId(id), shares).unwrap();
    }
}
