use crate::core::types::{Quantity, SimTime};
use serde::Serialize;
use std::collections::VecDeque;

/// Kind of a recorded ledger mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MutationKind {
    /// Stock handed out against an order
    Take,
    /// Stock drawn into production
    Consume,
    /// Stock accepted into the store
    Receive,
    /// Stock turned away because the store was full; level unchanged
    Overflow,
    /// Perishable stock that reached its shelf life
    Waste,
}

/// One audit record. The history of these is the sole source of truth for the level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub time: SimTime,
    pub kind: MutationKind,
    pub quantity: Quantity,
    pub level_after: Quantity,
}

impl LedgerEntry {
    /// Signed change this entry applies to the level
    pub fn delta(&self) -> i128 {
        match self.kind {
            MutationKind::Receive => self.quantity as i128,
            MutationKind::Take | MutationKind::Consume | MutationKind::Waste => -(self.quantity as i128),
            MutationKind::Overflow => 0,
        }
    }
}

/// Result of [`InventoryLedger::reserve_or_take`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fulfillment {
    pub fulfilled: Quantity,
    pub shortfall: Quantity,
}

impl Fulfillment {
    pub fn full(quantity: Quantity) -> Self {
        Self {
            fulfilled: quantity,
            shortfall: 0,
        }
    }
}

/// Result of [`InventoryLedger::receive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub accepted: Quantity,
    pub overflow: Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Batch {
    received_at: SimTime,
    quantity: Quantity,
}

/// Stock tracker owned by exactly one node.
///
/// All mutations go through the methods below; each one accrues holding cost up to
/// the mutation time first and then appends a [`LedgerEntry`].
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    capacity: Quantity,
    initial_level: Quantity,
    level: Quantity,
    holding_rate: f64,
    holding_cost: f64,
    last_accrual: SimTime,
    shelf_life: Option<f64>,
    batches: VecDeque<Batch>,
    history: Vec<LedgerEntry>,
    waste: Quantity,
    waste_log: Vec<(SimTime, Quantity)>,
    overflow: Quantity,
}

impl InventoryLedger {
    pub fn new(capacity: Quantity, initial_level: Quantity, holding_rate: f64) -> Result<Self, String> {
        if capacity == 0 {
            return Err("capacity must be positive".to_string());
        }
        if initial_level > capacity {
            return Err(format!(
                "initial level {} exceeds capacity {}",
                initial_level, capacity
            ));
        }
        if !holding_rate.is_finite() || holding_rate < 0.0 {
            return Err(format!("holding cost rate {} must be non-negative", holding_rate));
        }

        Ok(Self {
            capacity,
            initial_level,
            level: initial_level,
            holding_rate,
            holding_cost: 0.0,
            last_accrual: 0.0,
            shelf_life: None,
            batches: VecDeque::new(),
            history: Vec::new(),
            waste: 0,
            waste_log: Vec::new(),
            overflow: 0,
        })
    }

    /// Turn this into a perishable ledger; the initial stock forms one batch at time zero
    pub fn perishable(mut self, shelf_life: f64) -> Self {
        self.shelf_life = Some(shelf_life);
        self.batches.clear();
        if self.level > 0 {
            self.batches.push_back(Batch {
                received_at: self.last_accrual,
                quantity: self.level,
            });
        }
        self
    }

    pub fn level(&self) -> Quantity {
        self.level
    }

    pub fn capacity(&self) -> Quantity {
        self.capacity
    }

    pub fn initial_level(&self) -> Quantity {
        self.initial_level
    }

    pub fn available_space(&self) -> Quantity {
        self.capacity - self.level
    }

    pub fn holding_rate(&self) -> f64 {
        self.holding_rate
    }

    /// Holding cost accrued up to the last accrual point
    pub fn holding_cost(&self) -> f64 {
        self.holding_cost
    }

    pub fn is_perishable(&self) -> bool {
        self.shelf_life.is_some()
    }

    pub fn waste(&self) -> Quantity {
        self.waste
    }

    /// `(time, quantity)` of every waste event
    pub fn waste_log(&self) -> &[(SimTime, Quantity)] {
        &self.waste_log
    }

    pub fn overflow(&self) -> Quantity {
        self.overflow
    }

    pub fn history(&self) -> &[LedgerEntry] {
        &self.history
    }

    /// Ages of the stored batches at `now`, oldest first
    pub fn batch_ages(&self, now: SimTime) -> Vec<(f64, Quantity)> {
        self.batches
            .iter()
            .map(|batch| (now - batch.received_at, batch.quantity))
            .collect()
    }

    /// Add `level × rate × elapsed` to the holding cost and return the increment
    pub fn accrue_holding_cost(&mut self, elapsed: f64) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        let cost = self.level as f64 * self.holding_rate * elapsed;
        self.holding_cost += cost;
        cost
    }

    /// Accrue holding cost for the time since the last accrual
    pub fn accrue_to(&mut self, now: SimTime) -> f64 {
        let elapsed = now - self.last_accrual;
        let cost = self.accrue_holding_cost(elapsed);
        if now > self.last_accrual {
            self.last_accrual = now;
        }
        cost
    }

    /// Take `min(quantity, level)` units
    pub fn reserve_or_take(&mut self, now: SimTime, quantity: Quantity) -> Fulfillment {
        self.accrue_to(now);
        let fulfilled = quantity.min(self.level);
        if fulfilled > 0 {
            self.withdraw(fulfilled);
            self.record(now, MutationKind::Take, fulfilled);
        }
        Fulfillment {
            fulfilled,
            shortfall: quantity - fulfilled,
        }
    }

    /// Take exactly `quantity` units for production, or nothing at all
    pub fn consume(&mut self, now: SimTime, quantity: Quantity) -> bool {
        if quantity > self.level {
            return false;
        }
        self.accrue_to(now);
        if quantity > 0 {
            self.withdraw(quantity);
            self.record(now, MutationKind::Consume, quantity);
        }
        true
    }

    /// Accept up to the free space; the excess is recorded as overflow
    pub fn receive(&mut self, now: SimTime, quantity: Quantity) -> Receipt {
        self.accrue_to(now);
        let accepted = quantity.min(self.available_space());
        let overflow = quantity - accepted;

        if accepted > 0 {
            self.level += accepted;
            if self.is_perishable() {
                self.batches.push_back(Batch {
                    received_at: now,
                    quantity: accepted,
                });
            }
            self.record(now, MutationKind::Receive, accepted);
        }
        if overflow > 0 {
            self.overflow += overflow;
            self.record(now, MutationKind::Overflow, overflow);
        }

        Receipt { accepted, overflow }
    }

    /// Waste every batch whose age has reached the shelf life. Returns the wasted units.
    pub fn tick_perishable(&mut self, now: SimTime) -> Quantity {
        let Some(shelf_life) = self.shelf_life else {
            return 0;
        };
        self.accrue_to(now);

        let mut wasted = 0;
        while let Some(batch) = self.batches.front() {
            if now - batch.received_at < shelf_life {
                break;
            }
            wasted += batch.quantity;
            self.batches.pop_front();
        }

        if wasted > 0 {
            self.level -= wasted;
            self.waste += wasted;
            self.waste_log.push((now, wasted));
            self.record(now, MutationKind::Waste, wasted);
        }
        wasted
    }

    /// Rebuild a level from an initial value and an ordered history
    pub fn replay(initial_level: Quantity, entries: &[LedgerEntry]) -> Quantity {
        let level = entries
            .iter()
            .fold(initial_level as i128, |level, entry| level + entry.delta());
        level.max(0) as Quantity
    }

    /// Replay this ledger's own history from its initial level
    pub fn replayed_level(&self) -> Quantity {
        Self::replay(self.initial_level, &self.history)
    }

    fn withdraw(&mut self, quantity: Quantity) {
        self.level -= quantity;
        if !self.is_perishable() {
            return;
        }
        // Oldest stock leaves first
        let mut remaining = quantity;
        while remaining > 0 {
            let Some(batch) = self.batches.front_mut() else {
                break;
            };
            if batch.quantity > remaining {
                batch.quantity -= remaining;
                remaining = 0;
            } else {
                remaining -= batch.quantity;
                self.batches.pop_front();
            }
        }
    }

    fn record(&mut self, time: SimTime, kind: MutationKind, quantity: Quantity) {
        self.history.push(LedgerEntry {
            time,
            kind,
            quantity,
            level_after: self.level,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_never_goes_negative() {
        let mut ledger = InventoryLedger::new(100, 4, 0.0).unwrap();
        let outcome = ledger.reserve_or_take(1.0, 10);
        assert_eq!(outcome, Fulfillment { fulfilled: 4, shortfall: 6 });
        assert_eq!(ledger.level(), 0);

        let empty = ledger.reserve_or_take(2.0, 3);
        assert_eq!(empty, Fulfillment { fulfilled: 0, shortfall: 3 });
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_receive_clips_at_capacity() {
        let mut ledger = InventoryLedger::new(50, 40, 0.0).unwrap();
        let receipt = ledger.receive(0.5, 25);
        assert_eq!(receipt, Receipt { accepted: 10, overflow: 15 });
        assert_eq!(ledger.level(), 50);
        assert_eq!(ledger.overflow(), 15);
        assert_eq!(ledger.history().last().map(|e| e.kind), Some(MutationKind::Overflow));
    }

    #[test]
    fn test_consume_is_all_or_nothing() {
        let mut ledger = InventoryLedger::new(10, 5, 0.0).unwrap();
        assert!(!ledger.consume(0.0, 6));
        assert_eq!(ledger.level(), 5);
        assert!(ledger.consume(0.0, 5));
        assert_eq!(ledger.level(), 0);
    }

    #[test]
    fn test_holding_cost_follows_level_trajectory() {
        let mut ledger = InventoryLedger::new(100, 10, 2.0).unwrap();
        // 10 units for 1.5 days, then 4 units for 0.5 days
        ledger.reserve_or_take(1.5, 6);
        ledger.accrue_to(2.0);
        assert!((ledger.holding_cost() - (10.0 * 2.0 * 1.5 + 4.0 * 2.0 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_replay_reproduces_final_level() {
        let mut ledger = InventoryLedger::new(30, 12, 0.1).unwrap();
        ledger.reserve_or_take(0.2, 5);
        ledger.receive(0.7, 40);
        ledger.consume(1.1, 8);
        ledger.reserve_or_take(2.0, 100);
        ledger.receive(3.0, 7);

        assert_eq!(ledger.replayed_level(), ledger.level());
        assert_eq!(ledger.level(), 7);
        for entry in ledger.history() {
            assert!(entry.level_after <= ledger.capacity());
        }
    }

    #[test]
    fn test_perishable_batches_expire_oldest_first() {
        let mut ledger = InventoryLedger::new(100, 20, 0.0).unwrap().perishable(3.0);
        ledger.receive(2.0, 10);
        // Oldest batch shrinks first
        ledger.reserve_or_take(2.5, 5);
        assert_eq!(ledger.batch_ages(2.5), vec![(2.5, 15), (0.5, 10)]);

        assert_eq!(ledger.tick_perishable(2.9), 0);
        assert_eq!(ledger.tick_perishable(3.0), 15);
        assert_eq!(ledger.level(), 10);
        assert_eq!(ledger.waste(), 15);
        assert_eq!(ledger.waste_log(), &[(3.0, 15)]);
        assert_eq!(ledger.tick_perishable(5.0), 10);
        assert_eq!(ledger.level(), 0);
        assert_eq!(ledger.replayed_level(), 0);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(InventoryLedger::new(0, 0, 1.0).is_err());
        assert!(InventoryLedger::new(10, 11, 1.0).is_err());
        assert!(InventoryLedger::new(10, 1, -1.0).is_err());
    }
}
