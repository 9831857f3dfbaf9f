//! Replenishment policies and the per-node state machine that drives them.

use super::types::{Quantity, SimTime};
use serde::{Deserialize, Serialize};

/// When and how much a node reorders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplenishmentPolicy {
    /// (s, S): at level ≤ s order up to S
    ThresholdToCapacity { reorder_point: Quantity, order_up_to: Quantity },
    /// (R, Q): at level ≤ R order Q
    FixedQuantity { reorder_point: Quantity, quantity: Quantity },
    /// (T, Q): every T order Q regardless of level
    Periodic { period: SimTime, quantity: Quantity },
}

impl ReplenishmentPolicy {
    /// Check the parameters against the capacity of the store they refill
    pub fn validate(&self, capacity: Quantity) -> Result<(), String> {
        match *self {
            ReplenishmentPolicy::ThresholdToCapacity { reorder_point, order_up_to } => {
                if reorder_point >= order_up_to {
                    return Err(format!(
                        "reorder point {} must be below order-up-to level {}",
                        reorder_point, order_up_to
                    ));
                }
                if order_up_to > capacity {
                    return Err(format!(
                        "order-up-to level {} exceeds capacity {}",
                        order_up_to, capacity
                    ));
                }
            }
            ReplenishmentPolicy::FixedQuantity { reorder_point, quantity } => {
                if quantity == 0 {
                    return Err("order quantity must be positive".to_string());
                }
                if reorder_point >= capacity {
                    return Err(format!(
                        "reorder point {} must be below capacity {}",
                        reorder_point, capacity
                    ));
                }
            }
            ReplenishmentPolicy::Periodic { period, quantity } => {
                if !(period > 0.0) || !period.is_finite() {
                    return Err(format!("review period {} must be positive", period));
                }
                if quantity == 0 {
                    return Err("order quantity must be positive".to_string());
                }
            }
        }
        Ok(())
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, ReplenishmentPolicy::Periodic { .. })
    }

    /// Level at or below which a threshold policy fires
    pub fn reorder_point(&self) -> Option<Quantity> {
        match *self {
            ReplenishmentPolicy::ThresholdToCapacity { reorder_point, .. }
            | ReplenishmentPolicy::FixedQuantity { reorder_point, .. } => Some(reorder_point),
            ReplenishmentPolicy::Periodic { .. } => None,
        }
    }

    /// Timer period of a periodic policy
    pub fn period(&self) -> Option<SimTime> {
        match *self {
            ReplenishmentPolicy::Periodic { period, .. } => Some(period),
            _ => None,
        }
    }

    /// Largest single order this policy can place
    pub fn max_order(&self) -> Quantity {
        match *self {
            ReplenishmentPolicy::ThresholdToCapacity { order_up_to, .. } => order_up_to,
            ReplenishmentPolicy::FixedQuantity { quantity, .. } => quantity,
            ReplenishmentPolicy::Periodic { quantity, .. } => quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplenishmentPhase {
    Idle,
    OrderPlaced,
}

/// Policy plus its outstanding-order guard
#[derive(Debug, Clone)]
pub struct ReplenishmentState {
    policy: ReplenishmentPolicy,
    outstanding: usize,
    orders_placed: u64,
    units_ordered: Quantity,
}

impl ReplenishmentState {
    pub fn new(policy: ReplenishmentPolicy) -> Self {
        Self {
            policy,
            outstanding: 0,
            orders_placed: 0,
            units_ordered: 0,
        }
    }

    pub fn policy(&self) -> &ReplenishmentPolicy {
        &self.policy
    }

    pub fn phase(&self) -> ReplenishmentPhase {
        if self.outstanding > 0 {
            ReplenishmentPhase::OrderPlaced
        } else {
            ReplenishmentPhase::Idle
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed
    }

    pub fn units_ordered(&self) -> Quantity {
        self.units_ordered
    }

    /// Threshold trigger after a level change. Periodic policies never fire here.
    pub fn evaluate(&self, level: Quantity) -> Option<Quantity> {
        if self.outstanding > 0 {
            return None;
        }
        match self.policy {
            ReplenishmentPolicy::ThresholdToCapacity { reorder_point, order_up_to } if level <= reorder_point => {
                Some(order_up_to - level)
            }
            ReplenishmentPolicy::FixedQuantity { reorder_point, quantity } if level <= reorder_point => {
                Some(quantity)
            }
            _ => None,
        }
    }

    /// Timer trigger. Only periodic policies fire, and they ignore the guard.
    pub fn on_timer(&self) -> Option<Quantity> {
        match self.policy {
            ReplenishmentPolicy::Periodic { quantity, .. } => Some(quantity),
            _ => None,
        }
    }

    /// Idle → OrderPlaced
    pub fn record_placed(&mut self, quantity: Quantity) {
        self.outstanding += 1;
        self.orders_placed += 1;
        self.units_ordered += quantity;
    }

    /// OrderPlaced → Idle once the last outstanding order has settled
    pub fn on_settled(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_orders_up_to_target_once() {
        let mut state = ReplenishmentState::new(ReplenishmentPolicy::ThresholdToCapacity {
            reorder_point: 50,
            order_up_to: 150,
        });
        assert_eq!(state.evaluate(51), None);
        assert_eq!(state.evaluate(42), Some(108));

        state.record_placed(108);
        assert_eq!(state.phase(), ReplenishmentPhase::OrderPlaced);
        assert_eq!(state.evaluate(10), None);

        state.on_settled();
        assert_eq!(state.phase(), ReplenishmentPhase::Idle);
        assert_eq!(state.evaluate(50), Some(100));
    }

    #[test]
    fn test_fixed_quantity_ignores_level_depth() {
        let state = ReplenishmentState::new(ReplenishmentPolicy::FixedQuantity {
            reorder_point: 20,
            quantity: 35,
        });
        assert_eq!(state.evaluate(20), Some(35));
        assert_eq!(state.evaluate(0), Some(35));
        assert_eq!(state.evaluate(21), None);
    }

    #[test]
    fn test_periodic_stacks_outstanding_orders() {
        let mut state = ReplenishmentState::new(ReplenishmentPolicy::Periodic {
            period: 2.0,
            quantity: 40,
        });
        assert_eq!(state.evaluate(0), None);
        for _ in 0..3 {
            let qty = state.on_timer().unwrap();
            state.record_placed(qty);
        }
        assert_eq!(state.outstanding(), 3);
        assert_eq!(state.units_ordered(), 120);
        state.on_settled();
        assert_eq!(state.outstanding(), 2);
    }

    #[test]
    fn test_policy_validation() {
        let bad = [
            ReplenishmentPolicy::ThresholdToCapacity { reorder_point: 60, order_up_to: 50 },
            ReplenishmentPolicy::ThresholdToCapacity { reorder_point: 10, order_up_to: 500 },
            ReplenishmentPolicy::FixedQuantity { reorder_point: 100, quantity: 5 },
            ReplenishmentPolicy::FixedQuantity { reorder_point: 5, quantity: 0 },
            ReplenishmentPolicy::Periodic { period: 0.0, quantity: 5 },
        ];
        for policy in bad {
            assert!(policy.validate(100).is_err(), "{:?} should be rejected", policy);
        }
        assert!(ReplenishmentPolicy::ThresholdToCapacity { reorder_point: 50, order_up_to: 150 }
            .validate(150)
            .is_ok());
    }
}
