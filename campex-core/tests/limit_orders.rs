mod common;

use crate::common::*;
use campex_core::prelude::*;

#[test]
fn non_crossing_limit_orders_both_rest() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 1_000, 0);
    seed_participant(&mut engine, 2, "blue", 1_000, 10);

    engine
        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(21))
        .unwrap();
    engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 10, Some(19))
        .unwrap();

    let quote = engine.five_level_quote();
    assert_eq!(quote.bids.len(), 1);
    assert_eq!(quote.asks.len(), 1);
}

#[test]
fn equal_price_sellers_fill_in_submission_order() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 10_000, 0);
    seed_participant(&mut engine, 2, "blue", 1_000, 5);
    seed_participant(&mut engine, 3, "green", 1_000, 5);

    let sell1 = engine
        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 5, Some(20))
        .unwrap();
    let sell2 = engine
        .place_order(ParticipantId(3), Side::Sell, OrderType::Limit, 5, Some(20))
        .unwrap();

    let buy = engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 6, Some(20))
        .unwrap();

    assert_eq!(buy.filled_qty, 6);
    let sell1_after = engine.order_snapshot(sell1.order_id).unwrap();
    let sell2_after = engine.order_snapshot(sell2.order_id).unwrap();
    assert_eq!(sell1_after.status, OrderStatus::Filled);
    assert_eq!(sell2_after.status, OrderStatus::Partial);
    assert_eq!(sell2_after.remaining_qty, 4);
}

#[test]
fn a_better_priced_resting_order_is_matched_before_a_worse_one() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 10_000, 0);
    seed_participant(&mut engine, 2, "blue", 1_000, 10);
    seed_participant(&mut engine, 3, "green", 1_000, 10);

    let expensive = engine
        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(21))
        .unwrap();
    let cheap = engine
        .place_order(ParticipantId(3), Side::Sell, OrderType::Limit, 10, Some(20))
        .unwrap();

    let buy = engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 10, Some(21))
        .unwrap();

    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(engine.order_snapshot(cheap.order_id).unwrap().status, OrderStatus::Filled);
    assert_eq!(
        engine.order_snapshot(expensive.order_id).unwrap().status,
        OrderStatus::Pending
    );
}

#[test]
fn a_trade_always_executes_at_the_resting_makers_price() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 10_000, 0);
    seed_participant(&mut engine, 2, "blue", 1_000, 10);

    engine
        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(19))
        .unwrap();
    engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 10, Some(21))
        .unwrap();

    let trades = engine.recent_trades(1);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, 19);
}

#[test]
fn partial_fill_then_cancel_removes_the_remainder_and_releases_its_hold() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 10_000, 0);
    seed_participant(&mut engine, 2, "blue", 1_000, 10);

    let sell = engine
        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(20))
        .unwrap();
    engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 4, Some(20))
        .unwrap();

    assert_eq!(engine.order_snapshot(sell.order_id).unwrap().remaining_qty, 6);

    engine.cancel_order(ParticipantId(2), sell.order_id).unwrap();

    assert_eq!(engine.order_snapshot(sell.order_id).unwrap().status, OrderStatus::Cancelled);
    assert_eq!(engine.account_snapshot(ParticipantId(2)).unwrap().shares, 4);
}

#[test]
fn a_limit_buy_reserves_price_times_quantity_in_points() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 500, 0);

    let err = engine
        .place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 10, Some(21))
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds { .. }));
}

#[test]
fn a_limit_sell_requires_enough_unreserved_shares() {
    let mut engine = test_engine(1_000, 20, 1_000);
    seed_participant(&mut engine, 1, "red", 1_000, 5);

    let err = engine
        .place_order(ParticipantId(1), Side::Sell, OrderType::Limit, 10, Some(20))
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientShares { .. }));
}
