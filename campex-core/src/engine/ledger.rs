use crate::engine::error::LedgerError;
use crate::engine::types::{
    Account, Hold, HoldId, HoldKind, HoldRef, HoldState, ParticipantId, PointHistoryEntry, Points,
    Quantity,
};
use std::collections::HashMap;

/// Tracks per-participant available points, reserved holds, and share inventory.
///
/// The ledger is the single source of truth for the accounting invariant
/// `reserved_points == sum(active holds of participant)`. It does not itself
/// decide *when* to reserve or release; the matching engine and transfer
/// logic call these primitives inside their own transactional boundary.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<ParticipantId, Account>,
    holds: HashMap<HoldId, Hold>,
    history: Vec<PointHistoryEntry>,
    next_hold_id: u64,
}

/// Filters for `list_point_history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub participant: Option<ParticipantId>,
    pub since: Option<i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with the given starting balance. Idempotent: calling
    /// this again for an existing participant is a no-op on their balances.
    pub fn open_account(&mut self, participant: ParticipantId, starting_points: Points) {
        self.accounts.entry(participant).or_insert(Account {
            available_points: starting_points,
            reserved_points: 0,
            shares: 0,
        });
    }

    pub fn account(&self, participant: ParticipantId) -> Option<&Account> {
        self.accounts.get(&participant)
    }

    fn account_mut(&mut self, participant: ParticipantId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(&participant)
            .ok_or(LedgerError::ParticipantNotFound)
    }

    fn allocate_hold_id(&mut self) -> HoldId {
        self.next_hold_id += 1;
        HoldId(self.next_hold_id)
    }

    /// Reserves `amount` points against a participant's available balance.
    pub fn reserve_points(
        &mut self,
        participant: ParticipantId,
        amount: Points,
        kind: HoldKind,
        reference: HoldRef,
    ) -> Result<HoldId, LedgerError> {
        let id = self.allocate_hold_id();
        let account = self.account_mut(participant)?;
        if account.available_points < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        account.available_points -= amount;
        account.reserved_points += amount;
        self.holds.insert(
            id,
            Hold {
                id,
                participant,
                kind,
                amount,
                reference,
                state: HoldState::Active,
            },
        );
        Ok(id)
    }

    /// Reserves `qty` shares against a participant's holdings (the sell-side
    /// analogue of `reserve_points`): the shares leave `shares` and are held
    /// against the resting sell order until consumed or released.
    pub fn reserve_shares(
        &mut self,
        participant: ParticipantId,
        qty: Quantity,
        reference: HoldRef,
    ) -> Result<HoldId, LedgerError> {
        let id = self.allocate_hold_id();
        let account = self.account_mut(participant)?;
        if account.shares < qty {
            return Err(LedgerError::InsufficientShares);
        }
        account.shares -= qty;
        self.holds.insert(
            id,
            Hold {
                id,
                participant,
                kind: HoldKind::SellShares,
                amount: qty,
                reference,
                state: HoldState::Active,
            },
        );
        Ok(id)
    }

    fn active_hold_mut(&mut self, id: HoldId) -> Result<&mut Hold, LedgerError> {
        let hold = self.holds.get_mut(&id).ok_or(LedgerError::HoldNotFound)?;
        if hold.state != HoldState::Active {
            return Err(LedgerError::HoldNotActive);
        }
        Ok(hold)
    }

    /// Consumes the entirety of a hold: for a point hold this removes the
    /// reservation without crediting it back (the caller is responsible for
    /// crediting the counterparty); for a share hold this removes the
    /// reserved shares permanently (they moved to the buyer).
    pub fn consume_hold(&mut self, id: HoldId) -> Result<Hold, LedgerError> {
        let hold = self.active_hold_mut(id)?;
        hold.state = HoldState::Consumed;
        let snapshot = hold.clone();
        if !matches!(snapshot.kind, HoldKind::SellShares) {
            let account = self.account_mut(snapshot.participant)?;
            account.reserved_points -= snapshot.amount;
        }
        Ok(snapshot)
    }

    /// Partially consumes a hold of `consumed` and releases `released` back to
    /// the participant's available balance, leaving the hold active with the
    /// remainder still reserved. Used when a buy's estimated upper-bound
    /// reservation exceeds the price actually paid.
    pub fn partial_consume(
        &mut self,
        id: HoldId,
        consumed: Points,
        released: Points,
    ) -> Result<(), LedgerError> {
        let hold = self.active_hold_mut(id)?;
        let total = consumed + released;
        if total > hold.amount {
            return Err(LedgerError::InsufficientFunds);
        }
        hold.amount -= total;
        let participant = hold.participant;
        let kind = hold.kind;
        let hold_now_empty = hold.amount == 0;
        if hold_now_empty {
            hold.state = HoldState::Consumed;
        }

        if !matches!(kind, HoldKind::SellShares) {
            let account = self.account_mut(participant)?;
            account.reserved_points -= total;
            account.available_points += released;
        }
        Ok(())
    }

    /// Releases an active hold in full back to the participant (points to
    /// `available_points`, shares back to `shares`).
    pub fn release_hold(&mut self, id: HoldId) -> Result<Hold, LedgerError> {
        let hold = self.active_hold_mut(id)?;
        hold.state = HoldState::Released;
        let snapshot = hold.clone();
        let account = self.account_mut(snapshot.participant)?;
        match snapshot.kind {
            HoldKind::LimitBuy | HoldKind::MarketBuyEstimate | HoldKind::Transfer => {
                account.reserved_points -= snapshot.amount;
                account.available_points += snapshot.amount;
            }
            HoldKind::SellShares => {
                account.shares += snapshot.amount;
            }
        }
        Ok(snapshot)
    }

    pub fn hold(&self, id: HoldId) -> Option<&Hold> {
        self.holds.get(&id)
    }

    /// Sum of all active holds for a participant; should always equal their
    /// `reserved_points` for point-kind holds (checked in property tests).
    pub fn active_point_holds_total(&self, participant: ParticipantId) -> Points {
        self.holds
            .values()
            .filter(|h| {
                h.participant == participant
                    && h.state == HoldState::Active
                    && !matches!(h.kind, HoldKind::SellShares)
            })
            .map(|h| h.amount)
            .sum()
    }

    pub fn credit_points(&mut self, participant: ParticipantId, amount: Points, reason: &str, now: i64) -> Result<(), LedgerError> {
        let account = self.account_mut(participant)?;
        account.available_points += amount;
        self.history.push(PointHistoryEntry {
            participant,
            delta: amount as i64,
            reason: reason.to_string(),
            timestamp: now,
        });
        Ok(())
    }

    pub fn debit_available(
        &mut self,
        participant: ParticipantId,
        amount: Points,
        reason: &str,
        now: i64,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(participant)?;
        if account.available_points < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        account.available_points -= amount;
        self.history.push(PointHistoryEntry {
            participant,
            delta: -(amount as i64),
            reason: reason.to_string(),
            timestamp: now,
        });
        Ok(())
    }

    pub fn add_shares(&mut self, participant: ParticipantId, qty: Quantity) -> Result<(), LedgerError> {
        let account = self.account_mut(participant)?;
        account.shares += qty;
        Ok(())
    }

    pub fn remove_shares(&mut self, participant: ParticipantId, qty: Quantity) -> Result<(), LedgerError> {
        let account = self.account_mut(participant)?;
        if account.shares < qty {
            return Err(LedgerError::InsufficientShares);
        }
        account.shares -= qty;
        Ok(())
    }

    pub fn append_point_history(&mut self, entry: PointHistoryEntry) {
        self.history.push(entry);
    }

    pub fn list_point_history(&self, filter: &HistoryFilter) -> Vec<&PointHistoryEntry> {
        self.history
            .iter()
            .filter(|e| filter.participant.map_or(true, |p| p == e.participant))
            .filter(|e| filter.since.map_or(true, |since| e.timestamp >= since))
            .collect()
    }

    /// Total liquid worth (available + reserved) across all accounts, plus an
    /// externally-supplied system fee account balance. Used by conservation
    /// property tests.
    pub fn total_points(&self, system_fee_account: Points) -> u128 {
        let accounts_total: u128 = self
            .accounts
            .values()
            .map(|a| (a.available_points + a.reserved_points) as u128)
            .sum();
        accounts_total + system_fee_account as u128
    }

    pub fn total_shares(&self) -> u128 {
        let held_shares: u128 = self
            .holds
            .values()
            .filter(|h| h.state == HoldState::Active && matches!(h.kind, HoldKind::SellShares))
            .map(|h| h.amount as u128)
            .sum();
        let owned_shares: u128 = self.accounts.values().map(|a| a.shares as u128).sum();
        held_shares + owned_shares
    }
}
