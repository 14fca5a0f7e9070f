use crate::engine::book::OrderBook;
use crate::engine::clock::{is_open, Clock};
use crate::engine::config::{ConfigSnapshot, ConfigStore, PriceLimitPolicy};
use crate::engine::error::EngineError;
use crate::engine::ipo::{IpoPool, IpoStatus};
use crate::engine::ledger::Ledger;
use crate::engine::observer::EngineObserver;
use crate::engine::price_policy::{compute_band, PriceBand};
use crate::engine::quotes::{FiveLevelQuote, PriceLimitInfo, PriceSummary, QuoteLevel};
use crate::engine::types::{
    HoldKind, HoldRef, HoldState, Order, OrderId, OrderStatus, OrderType, Participant,
    ParticipantId, Points, Price, Quantity, Side, Trade, TradeSource, SYSTEM_PARTICIPANT,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a successful `place_order` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_qty: Quantity,
    pub remaining_qty: Quantity,
}

/// The mutable heart of the exchange: book, ledger, IPO pool, and the
/// session statistics derived from the trade tape. Every mutating method
/// here assumes the caller already holds the engine's exclusive lock — see
/// `EngineHandle` for the locking discipline.
pub struct EngineCore {
    pub(crate) book: OrderBook,
    pub(crate) ledger: Ledger,
    pub(crate) ipo: IpoPool,
    pub(crate) config: Arc<ConfigStore>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) observer: Box<dyn EngineObserver>,
    pub(crate) participants: HashMap<ParticipantId, Participant>,
    pub(crate) last_trade_price: Option<Price>,
    pub(crate) trades: Vec<Trade>,
    pub(crate) session_open: Option<Price>,
    pub(crate) session_high: Option<Price>,
    pub(crate) session_low: Option<Price>,
    pub(crate) session_volume: Quantity,
    pub(crate) system_fee_account: Points,
    next_order_id: u64,
    next_trade_id: u64,
    next_transfer_id: u64,
}

impl EngineCore {
    pub fn new(
        config: Arc<ConfigStore>,
        ipo: IpoPool,
        clock: Box<dyn Clock>,
        observer: Box<dyn EngineObserver>,
    ) -> Self {
        Self {
            book: OrderBook::new(),
            ledger: Ledger::new(),
            ipo,
            config,
            clock,
            observer,
            participants: HashMap::new(),
            last_trade_price: None,
            trades: Vec::new(),
            session_open: None,
            session_high: None,
            session_low: None,
            session_volume: 0,
            system_fee_account: 0,
            next_order_id: 0,
            next_trade_id: 0,
            next_transfer_id: 0,
        }
    }

    pub fn register_participant(&mut self, participant: Participant, starting_points: Points) {
        self.ledger.open_account(participant.id, starting_points);
        self.participants.insert(participant.id, participant);
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// A snapshot of a participant's point/share balances, for read-only
    /// callers that shouldn't reach into the ledger directly.
    pub fn account_snapshot(&self, id: ParticipantId) -> Option<crate::engine::types::Account> {
        self.ledger.account(id).cloned()
    }

    /// A snapshot of an order by id, resting, quarantined, or terminal.
    pub fn order_snapshot(&self, id: OrderId) -> Option<Order> {
        self.book.get(id).cloned()
    }

    fn next_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId(self.next_order_id)
    }

    fn next_trade_id(&mut self) -> Points {
        self.next_trade_id += 1;
        self.next_trade_id
    }

    pub(crate) fn next_transfer_id(&mut self) -> crate::engine::types::TransferId {
        self.next_transfer_id += 1;
        crate::engine::types::TransferId(self.next_transfer_id)
    }

    pub(crate) fn now_ts(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// The reference price used for price-band computation: the last trade
    /// price if any trade has occurred, otherwise the IPO unit price.
    pub fn reference_price(&self) -> Price {
        self.last_trade_price.unwrap_or(self.ipo.unit_price)
    }

    pub fn current_band(&self) -> PriceBand {
        compute_band(
            self.reference_price(),
            &self.config.get_snapshot().price_limit_policy,
        )
    }

    pub(crate) fn internal(&self, context: &str, err: impl std::fmt::Display) -> EngineError {
        tracing::error!(context, %err, "ledger invariant violated");
        EngineError::Internal(format!("{context}: {err}"))
    }

    fn new_order(
        &self,
        id: OrderId,
        participant: ParticipantId,
        side: Side,
        order_type: OrderType,
        qty: Quantity,
        limit_price: Price,
        reserve_rate: Price,
        hold: Option<crate::engine::types::HoldId>,
        now: i64,
    ) -> Order {
        Order {
            id,
            participant,
            side,
            order_type,
            original_qty: qty,
            remaining_qty: qty,
            limit_price,
            status: OrderStatus::Pending,
            hold,
            reserve_rate,
            created_at: now,
            updated_at: now,
        }
    }

    /// Conservative per-unit upper bound reserved for a market buy: the
    /// higher of the current best ask (or the IPO price if the book is
    /// empty) and the top of the current price band, so the reservation
    /// never falls short of what any possible fill path could charge.
    fn market_buy_reserve_rate(&self, snapshot: &ConfigSnapshot) -> Price {
        let band = compute_band(self.reference_price(), &snapshot.price_limit_policy);
        let candidate = match self.book.best_ask_price() {
            Some(ask) => ask.max(self.ipo.unit_price),
            None => self.ipo.unit_price,
        };
        candidate.max(band.high)
    }

    // ---- placement -----------------------------------------------------

    pub fn place_order(
        &mut self,
        participant: ParticipantId,
        side: Side,
        order_type: OrderType,
        qty: Quantity,
        limit_price: Option<Price>,
    ) -> Result<PlacementOutcome, EngineError> {
        let snapshot = self.config.get_snapshot();
        if !is_open(&snapshot.trading_windows, self.clock.now()) {
            return Err(EngineError::MarketClosed);
        }
        let now = self.now_ts();
        let order_id = self.next_order_id();

        match (side, order_type) {
            (Side::Buy, OrderType::Limit) => {
                let price = limit_price
                    .ok_or_else(|| EngineError::InvalidOrder("limit order requires a price".into()))?;
                let amount = price.saturating_mul(qty);
                let hold_id = self
                    .ledger
                    .reserve_points(participant, amount, HoldKind::LimitBuy, HoldRef::Order(order_id))
                    .map_err(|_| EngineError::InsufficientFunds { participant })?;
                let order = self.new_order(
                    order_id, participant, side, order_type, qty, price, price, Some(hold_id), now,
                );
                self.place_limit(order, &snapshot);
                self.run_matching_pass();
            }
            (Side::Sell, OrderType::Limit) => {
                let price = limit_price
                    .ok_or_else(|| EngineError::InvalidOrder("limit order requires a price".into()))?;
                let hold_id = self
                    .ledger
                    .reserve_shares(participant, qty, HoldRef::Order(order_id))
                    .map_err(|_| EngineError::InsufficientShares { participant })?;
                let order = self.new_order(
                    order_id, participant, side, order_type, qty, price, 0, Some(hold_id), now,
                );
                self.place_limit(order, &snapshot);
                self.run_matching_pass();
            }
            (Side::Buy, OrderType::Market) => {
                let rate = self.market_buy_reserve_rate(&snapshot);
                let amount = rate.saturating_mul(qty);
                let hold_id = self
                    .ledger
                    .reserve_points(participant, amount, HoldKind::MarketBuyEstimate, HoldRef::Order(order_id))
                    .map_err(|_| EngineError::InsufficientFunds { participant })?;
                let order = self.new_order(
                    order_id, participant, side, order_type, qty, 0, rate, Some(hold_id), now,
                );
                self.book.insert_terminal(order);
                self.observer.order_accepted(self.book.get(order_id).unwrap());
                self.place_market_buy(order_id, now)?;
            }
            (Side::Sell, OrderType::Market) => {
                let hold_id = self
                    .ledger
                    .reserve_shares(participant, qty, HoldRef::Order(order_id))
                    .map_err(|_| EngineError::InsufficientShares { participant })?;
                let order = self.new_order(
                    order_id, participant, side, order_type, qty, 0, 0, Some(hold_id), now,
                );
                self.book.insert_terminal(order);
                self.observer.order_accepted(self.book.get(order_id).unwrap());
                self.place_market_sell(order_id, now)?;
            }
        }

        let final_order = self
            .book
            .get(order_id)
            .cloned()
            .ok_or_else(|| EngineError::Internal("order vanished after placement".into()))?;
        Ok(PlacementOutcome {
            order_id,
            status: final_order.status,
            filled_qty: final_order.original_qty - final_order.remaining_qty,
            remaining_qty: final_order.remaining_qty,
        })
    }

    fn place_limit(&mut self, mut order: Order, snapshot: &ConfigSnapshot) {
        let band = compute_band(self.reference_price(), &snapshot.price_limit_policy);
        let id = order.id;
        if band.contains(order.limit_price) {
            self.book.insert_resting(order);
        } else {
            order.status = OrderStatus::PendingLimit;
            self.book.insert_pending_limit(order);
        }
        self.observer.order_accepted(self.book.get(id).unwrap());
    }

    fn place_market_buy(&mut self, order_id: OrderId, now: i64) -> Result<(), EngineError> {
        let mut trades = Vec::new();
        loop {
            let remaining = match self.book.get(order_id) {
                Some(o) => o.remaining_qty,
                None => break,
            };
            if remaining == 0 {
                break;
            }
            let Some(ask) = self.book.best_ask().cloned() else {
                break;
            };
            let qty = remaining.min(ask.remaining_qty);
            let trade = self.settle_trade(order_id, ask.id, ask.limit_price, qty, TradeSource::Book, now)?;
            trades.push(trade);
        }

        let remaining = self.book.get(order_id).map(|o| o.remaining_qty).unwrap_or(0);
        if remaining > 0 {
            let unit_price = self.ipo.unit_price;
            let taken = self.ipo.take(remaining);
            if taken > 0 {
                let trade = self.settle_ipo_fill(order_id, unit_price, taken, now)?;
                trades.push(trade);
            }
        }

        if !trades.is_empty() {
            self.observer.matched(&trades);
        }
        self.finalize_market_order(order_id, now)?;
        self.reevaluate_pending_limit(now);
        Ok(())
    }

    fn place_market_sell(&mut self, order_id: OrderId, now: i64) -> Result<(), EngineError> {
        let mut trades = Vec::new();
        loop {
            let remaining = match self.book.get(order_id) {
                Some(o) => o.remaining_qty,
                None => break,
            };
            if remaining == 0 {
                break;
            }
            let Some(bid) = self.book.best_bid().cloned() else {
                break;
            };
            let qty = remaining.min(bid.remaining_qty);
            let trade = self.settle_trade(bid.id, order_id, bid.limit_price, qty, TradeSource::Book, now)?;
            trades.push(trade);
        }
        if !trades.is_empty() {
            self.observer.matched(&trades);
        }
        self.finalize_market_order(order_id, now)?;
        self.reevaluate_pending_limit(now);
        Ok(())
    }

    /// Closes out a market order once no more liquidity is available: marks
    /// any unfilled remainder `Rejected` and releases whatever reservation
    /// slack is still active (the excess estimate on a filled order, or the
    /// entire hold on a wholly/partially unfilled one).
    fn finalize_market_order(&mut self, order_id: OrderId, now: i64) -> Result<(), EngineError> {
        let Some(order) = self.book.get(order_id).cloned() else {
            return Ok(());
        };
        if order.remaining_qty > 0 {
            if let Some(o) = self.book.get_mut(order_id) {
                o.status = OrderStatus::Rejected;
                o.updated_at = now;
            }
        }
        if let Some(hold_id) = order.hold {
            if matches!(self.ledger.hold(hold_id).map(|h| h.state), Some(HoldState::Active)) {
                self.ledger
                    .release_hold(hold_id)
                    .map_err(|e| self.internal("release market order residual hold", e))?;
            }
        }
        if let Some(o) = self.book.get(order_id) {
            self.observer.order_updated(o);
        }
        Ok(())
    }

    // ---- matching --------------------------------------------------------

    /// Runs crossing passes and pending-limit promotion until the book is
    /// quiescent: no more crossings and no more promotions in a round.
    pub fn run_matching_pass(&mut self) {
        let now = self.now_ts();
        for _ in 0..1_000 {
            let trades = match self.cross_book(now) {
                Ok(t) => t,
                Err(err) => {
                    tracing::error!(%err, "matching pass aborted");
                    break;
                }
            };
            if !trades.is_empty() {
                self.observer.matched(&trades);
            }
            let demoted = self.demote_out_of_band_resting(now);
            let promoted = self.reevaluate_pending_limit(now);
            if trades.is_empty() && !demoted && !promoted {
                return;
            }
        }
        tracing::warn!("matching pass exceeded iteration cap, stopping this round");
    }

    /// Pulls resting orders whose limit price has drifted outside the
    /// current band back into quarantine, keeping the `pending_limit`
    /// invariant true after the reference price moves. Returns whether
    /// anything was demoted.
    fn demote_out_of_band_resting(&mut self, now: i64) -> bool {
        let band = self.current_band();
        let ids: Vec<OrderId> = self
            .book
            .top_n(Side::Buy, usize::MAX)
            .into_iter()
            .chain(self.book.top_n(Side::Sell, usize::MAX))
            .filter(|o| !band.contains(o.limit_price))
            .map(|o| o.id)
            .collect();
        let demoted = !ids.is_empty();
        for id in ids {
            self.book.demote_to_pending_limit(id);
            if let Some(order) = self.book.get_mut(id) {
                order.status = OrderStatus::PendingLimit;
                order.updated_at = now;
            }
            if let Some(order) = self.book.get(id) {
                self.observer.order_updated(order);
            }
        }
        demoted
    }

    fn cross_book(&mut self, now: i64) -> Result<Vec<Trade>, EngineError> {
        let mut trades = Vec::new();
        loop {
            let (bid, ask) = match (self.book.best_bid(), self.book.best_ask()) {
                (Some(b), Some(a)) => (b.clone(), a.clone()),
                _ => break,
            };
            if ask.limit_price > bid.limit_price {
                break;
            }
            let maker_is_buy = (bid.created_at, bid.id.0) < (ask.created_at, ask.id.0);
            let price = if maker_is_buy { bid.limit_price } else { ask.limit_price };
            let qty = bid.remaining_qty.min(ask.remaining_qty);
            let trade = self.settle_trade(bid.id, ask.id, price, qty, TradeSource::Book, now)?;
            trades.push(trade);
        }
        Ok(trades)
    }

    fn settle_trade(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        price: Price,
        qty: Quantity,
        source: TradeSource,
        now: i64,
    ) -> Result<Trade, EngineError> {
        let buy = self.book.get(buy_id).cloned().ok_or_else(|| {
            EngineError::Internal(format!("buy order {buy_id} missing during settlement"))
        })?;
        let sell = self.book.get(sell_id).cloned().ok_or_else(|| {
            EngineError::Internal(format!("sell order {sell_id} missing during settlement"))
        })?;

        self.settle_buy_fill(&buy, price, qty)?;
        self.settle_sell_fill(&sell, price, qty, now)?;
        self.apply_fill(buy_id, qty, now);
        self.apply_fill(sell_id, qty, now);

        let trade = self.record_trade(buy_id, sell_id, buy.participant, sell.participant, price, qty, source, now);
        self.last_trade_price = Some(price);
        self.update_session_stats(price, qty);
        Ok(trade)
    }

    /// Settles an IPO-sourced fill: the buyer's hold is consumed and shares
    /// credited as usual, but the "seller" is a synthetic system order kept
    /// only for audit — no ledger account is touched on that side.
    fn settle_ipo_fill(
        &mut self,
        buy_id: OrderId,
        price: Price,
        qty: Quantity,
        now: i64,
    ) -> Result<Trade, EngineError> {
        let buy = self.book.get(buy_id).cloned().ok_or_else(|| {
            EngineError::Internal(format!("buy order {buy_id} missing during IPO settlement"))
        })?;
        self.settle_buy_fill(&buy, price, qty)?;
        self.apply_fill(buy_id, qty, now);

        let sell_id = self.next_order_id();
        let synthetic = Order {
            id: sell_id,
            participant: SYSTEM_PARTICIPANT,
            side: Side::Sell,
            order_type: OrderType::Market,
            original_qty: qty,
            remaining_qty: 0,
            limit_price: price,
            status: OrderStatus::Filled,
            hold: None,
            reserve_rate: 0,
            created_at: now,
            updated_at: now,
        };
        self.book.insert_terminal(synthetic);

        let trade = self.record_trade(buy_id, sell_id, buy.participant, SYSTEM_PARTICIPANT, price, qty, TradeSource::Ipo, now);
        self.last_trade_price = Some(price);
        self.update_session_stats(price, qty);
        Ok(trade)
    }

    fn settle_buy_fill(&mut self, order: &Order, price: Price, qty: Quantity) -> Result<(), EngineError> {
        if let Some(hold_id) = order.hold {
            let consumed = price.saturating_mul(qty);
            let reserved_slice = order.reserve_rate.saturating_mul(qty);
            let released = reserved_slice.saturating_sub(consumed);
            self.ledger
                .partial_consume(hold_id, consumed, released)
                .map_err(|e| self.internal("partial_consume buy hold", e))?;
        }
        self.ledger
            .add_shares(order.participant, qty)
            .map_err(|e| self.internal("add_shares to buyer", e))?;
        Ok(())
    }

    fn settle_sell_fill(&mut self, order: &Order, price: Price, qty: Quantity, now: i64) -> Result<(), EngineError> {
        if order.participant == SYSTEM_PARTICIPANT {
            return Ok(());
        }
        if let Some(hold_id) = order.hold {
            self.ledger
                .partial_consume(hold_id, qty, 0)
                .map_err(|e| self.internal("partial_consume sell hold", e))?;
        }
        self.ledger
            .credit_points(order.participant, price.saturating_mul(qty), "trade proceeds", now)
            .map_err(|e| self.internal("credit_points to seller", e))?;
        Ok(())
    }

    fn apply_fill(&mut self, id: OrderId, qty: Quantity, now: i64) {
        let filled = if let Some(order) = self.book.get_mut(id) {
            order.remaining_qty -= qty;
            order.updated_at = now;
            order.status = if order.remaining_qty == 0 {
                OrderStatus::Filled
            } else {
                OrderStatus::Partial
            };
            order.remaining_qty == 0
        } else {
            false
        };
        if filled {
            self.book.remove_from_active_structures(id);
        }
        if let Some(order) = self.book.get(id) {
            self.observer.order_updated(order);
        }
    }

    fn record_trade(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        buyer: ParticipantId,
        seller: ParticipantId,
        price: Price,
        qty: Quantity,
        source: TradeSource,
        now: i64,
    ) -> Trade {
        let id = crate::engine::types::TradeId(self.next_trade_id());
        let trade = Trade {
            id,
            buy_order: buy_id,
            sell_order: sell_id,
            buyer,
            seller,
            price,
            qty,
            timestamp: now,
            source,
        };
        self.trades.push(trade.clone());
        trade
    }

    fn update_session_stats(&mut self, price: Price, qty: Quantity) {
        self.session_open.get_or_insert(price);
        self.session_high = Some(self.session_high.map_or(price, |h| h.max(price)));
        self.session_low = Some(self.session_low.map_or(price, |l| l.min(price)));
        self.session_volume += qty;
    }

    /// Promotes quarantined orders whose limit price has re-entered the
    /// current band, in FIFO submission order. Returns whether any order
    /// was promoted, so the caller can decide whether to re-run crossing.
    fn reevaluate_pending_limit(&mut self, now: i64) -> bool {
        let band = self.current_band();
        let mut promoted_any = false;
        for id in self.book.pending_limit_ids() {
            let Some(order) = self.book.get(id) else { continue };
            if !band.contains(order.limit_price) {
                continue;
            }
            self.book.promote_from_pending_limit(id);
            if let Some(order) = self.book.get_mut(id) {
                order.status = if order.remaining_qty == order.original_qty {
                    OrderStatus::Pending
                } else {
                    OrderStatus::Partial
                };
                order.updated_at = now;
            }
            if let Some(order) = self.book.get(id) {
                self.observer.order_updated(order);
            }
            promoted_any = true;
        }
        promoted_any
    }

    // ---- cancellation ------------------------------------------------

    pub fn cancel_order(&mut self, participant: ParticipantId, order_id: OrderId) -> Result<(), EngineError> {
        let snapshot = self.config.get_snapshot();
        if !is_open(&snapshot.trading_windows, self.clock.now()) {
            return Err(EngineError::MarketClosed);
        }
        let now = self.now_ts();
        self.cancel_order_internal(Some(participant), order_id, now)
    }

    /// Administrative cancellation bypasses the market-hours gate.
    pub fn cancel_order_admin(&mut self, order_id: OrderId) -> Result<(), EngineError> {
        let now = self.now_ts();
        self.cancel_order_internal(None, order_id, now)
    }

    pub(crate) fn cancel_order_internal(
        &mut self,
        requester: Option<ParticipantId>,
        order_id: OrderId,
        now: i64,
    ) -> Result<(), EngineError> {
        let order = self
            .book
            .get(order_id)
            .cloned()
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if let Some(p) = requester {
            if p != order.participant {
                return Err(EngineError::NotOrderOwner { participant: p, order: order_id });
            }
        }
        if order.status.is_terminal() {
            return Err(EngineError::AlreadyTerminal(order_id));
        }

        self.book.remove_from_active_structures(order_id);
        if let Some(hold_id) = order.hold {
            if matches!(self.ledger.hold(hold_id).map(|h| h.state), Some(HoldState::Active)) {
                self.ledger
                    .release_hold(hold_id)
                    .map_err(|e| self.internal("release cancel hold", e))?;
            }
        }
        if let Some(o) = self.book.get_mut(order_id) {
            o.status = OrderStatus::Cancelled;
            o.updated_at = now;
        }
        if let Some(o) = self.book.get(order_id) {
            self.observer.order_cancelled(o);
        }
        Ok(())
    }

    // ---- periodic sweep ------------------------------------------------

    /// Re-runs matching with no new order, then cancels any resting or
    /// quarantined order whose hold is no longer active (an orphaned
    /// reservation — see spec §4.7.4).
    pub fn periodic_sweep(&mut self) {
        self.run_matching_pass();
        let now = self.now_ts();
        self.sweep_orphaned_holds(now);
    }

    fn sweep_orphaned_holds(&mut self, now: i64) {
        let candidates: Vec<OrderId> = self
            .book
            .pending_limit_ids()
            .into_iter()
            .chain(self.book.top_n(Side::Buy, usize::MAX).into_iter().map(|o| o.id))
            .chain(self.book.top_n(Side::Sell, usize::MAX).into_iter().map(|o| o.id))
            .collect();
        for id in candidates {
            let Some(order) = self.book.get(id) else { continue };
            if order.status.is_terminal() {
                continue;
            }
            let orphaned = match order.hold {
                None => true,
                Some(hold_id) => !matches!(self.ledger.hold(hold_id).map(|h| h.state), Some(HoldState::Active)),
            };
            if orphaned {
                tracing::warn!(order_id = %id, "cancelling orphaned order during periodic sweep");
                let _ = self.cancel_order_internal(None, id, now);
            }
        }
    }

    // ---- read views --------------------------------------------------

    pub fn price_summary(&self) -> PriceSummary {
        let last = self.last_trade_price;
        let open = self.session_open;
        let change = match (last, open) {
            (Some(l), Some(o)) => l as i64 - o as i64,
            _ => 0,
        };
        let change_percent_bps = match (last, open) {
            (Some(l), Some(o)) if o > 0 => {
                (((l as i128 - o as i128) * 10_000) / o as i128) as i64
            }
            _ => 0,
        };
        PriceSummary {
            last,
            change,
            change_percent_bps,
            high: self.session_high,
            low: self.session_low,
            open,
            volume: self.session_volume,
        }
    }

    pub fn five_level_quote(&self) -> FiveLevelQuote {
        FiveLevelQuote {
            bids: Self::aggregate_levels(self.book.top_n(Side::Buy, usize::MAX)),
            asks: Self::aggregate_levels(self.book.top_n(Side::Sell, usize::MAX)),
        }
    }

    fn aggregate_levels(orders: Vec<&Order>) -> Vec<QuoteLevel> {
        let mut levels: Vec<QuoteLevel> = Vec::new();
        for o in orders {
            match levels.last_mut() {
                Some(last) if last.price == o.limit_price => last.qty += o.remaining_qty,
                _ => {
                    if levels.len() == 5 {
                        break;
                    }
                    levels.push(QuoteLevel { price: o.limit_price, qty: o.remaining_qty });
                }
            }
        }
        levels
    }

    pub fn recent_trades(&self, n: usize) -> Vec<Trade> {
        self.trades.iter().rev().take(n).cloned().collect()
    }

    pub fn ipo_status(&self) -> IpoStatus {
        self.ipo.status()
    }

    pub fn trading_hours(&self) -> Vec<crate::engine::clock::TradingWindow> {
        self.config.get_snapshot().trading_windows.clone()
    }

    pub fn transfer_fee_public(&self) -> crate::engine::config::TransferFeePolicy {
        self.config.get_snapshot().transfer_fee
    }

    pub fn get_pending_orders(&self, limit: usize) -> Vec<Order> {
        self.book
            .top_n(Side::Buy, usize::MAX)
            .into_iter()
            .chain(self.book.top_n(Side::Sell, usize::MAX))
            .chain(self.book.pending_limit_ids().iter().filter_map(|id| self.book.get(*id)))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_price_limit_info(&self, test_price: Option<Price>) -> PriceLimitInfo {
        let snapshot = self.config.get_snapshot();
        let band = compute_band(self.reference_price(), &snapshot.price_limit_policy);
        PriceLimitInfo {
            reference_price: self.reference_price(),
            band,
            test_price_in_band: test_price.map(|p| band.contains(p)),
        }
    }

    pub fn trigger_manual_match(&mut self) {
        self.run_matching_pass();
    }

    pub fn active_policy(&self) -> PriceLimitPolicy {
        self.config.get_snapshot().price_limit_policy.clone()
    }
}
