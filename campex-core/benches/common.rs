use campex_core::prelude::*;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

/// A freshly wired engine with a wide-open trading window, a generous price
/// band, and two seeded participants: `ParticipantId(1)` (the buyer, heavy
/// on points) and `ParticipantId(2)` (the seller, heavy on shares).
pub fn bench_engine() -> EngineCore {
    let snapshot = ConfigSnapshot {
        transfer_fee: TransferFeePolicy {
            rate_bps: 1_000,
            min_fee: 1,
        },
        ipo_defaults: IpoDefaults {
            initial_shares: 1_000_000,
            unit_price: 1_000,
        },
        price_limit_policy: PriceLimitPolicy::Flat { percent_bps: 10_000 },
        trading_windows: vec![TradingWindow {
            start: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        }],
    };
    let config = Arc::new(ConfigStore::new(snapshot).unwrap());
    let mut engine = EngineCore::new(
        config,
        IpoPool::new(1_000_000, 1_000),
        Box::new(SystemClock),
        Box::new(NullObserver),
    );

    engine.register_participant(
        Participant {
            id: ParticipantId(1),
            display_name: "buyer".into(),
            team: "bench".into(),
            is_admin: false,
        },
        1_000_000_000,
    );
    engine.register_participant(
        Participant {
            id: ParticipantId(2),
            display_name: "seller".into(),
            team: "bench".into(),
            is_admin: false,
        },
        0,
    );
    engine.credit_shares(ParticipantId(2), 1_000_000).unwrap();

    engine
}
