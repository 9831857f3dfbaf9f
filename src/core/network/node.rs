use crate::core::inventory::{Fulfillment, InventoryLedger, Product, Receipt};
use crate::core::replenishment::ReplenishmentState;
use crate::core::types::{Echelon, LinkId, NodeId, OrderId, Quantity, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// How a supplier comes by its stock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Supply {
    /// Never runs out; capacity is not checked
    Infinite,
    /// Adds `quantity` units every `interval`, clipped at capacity
    Extraction { quantity: Quantity, interval: SimTime },
}

/// Production state of a manufacturer
#[derive(Debug, Clone)]
pub struct ManufacturerRole {
    pub(crate) raw: InventoryLedger,
    pub(crate) raw_material: Arc<Product>,
    pub(crate) raw_per_unit: Quantity,
    pub(crate) processing_time: SimTime,
    /// Requested production runs, first come first served on a single slot
    pub(crate) queue: VecDeque<Quantity>,
    pub(crate) busy: bool,
    pub(crate) raw_on_order: bool,
    pub(crate) deferred: bool,
    pub(crate) units_produced: Quantity,
}

impl ManufacturerRole {
    pub(crate) fn new(
        raw: InventoryLedger,
        raw_material: Arc<Product>,
        raw_per_unit: Quantity,
        processing_time: SimTime,
    ) -> Self {
        Self {
            raw,
            raw_material,
            raw_per_unit,
            processing_time,
            queue: VecDeque::new(),
            busy: false,
            raw_on_order: false,
            deferred: false,
            units_produced: 0,
        }
    }

    pub fn raw_ledger(&self) -> &InventoryLedger {
        &self.raw
    }

    pub fn raw_material(&self) -> &Product {
        &self.raw_material
    }

    pub fn units_produced(&self) -> Quantity {
        self.units_produced
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Units waiting for the production slot or for raw material
    pub fn queued_units(&self) -> Quantity {
        self.queue.iter().sum()
    }
}

/// Closed set of node behaviours, dispatched by tag
#[derive(Debug, Clone)]
pub enum NodeRole {
    Supplier(Supply),
    Manufacturer(ManufacturerRole),
    /// Distributor, warehouse or retailer
    Stockpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub holds_inventory: bool,
    pub produces: bool,
    pub sources_raw_material: bool,
    pub sells_to_customers: bool,
}

/// Running cost and revenue counters of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeCounters {
    pub orders_received: u64,
    pub demand_units: Quantity,
    pub units_sold: Quantity,
    pub shortage_units: Quantity,
    pub backorder_recovered: Quantity,
    pub revenue: f64,
    pub transportation_cost: f64,
    pub production_cost: f64,
    pub procurement_cost: f64,
    pub salvage_revenue: f64,
    pub overflow_waste: Quantity,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) key: String,
    pub(crate) name: String,
    pub(crate) location: Option<String>,
    pub(crate) echelon: Echelon,
    pub(crate) product: Arc<Product>,
    pub(crate) ledger: InventoryLedger,
    pub(crate) role: NodeRole,
    pub(crate) inbound: Vec<LinkId>,
    pub(crate) replenishment: Option<ReplenishmentState>,
    /// Patience granted to upstream nodes on this node's own orders
    pub(crate) order_tolerance: SimTime,
    pub(crate) backorders: VecDeque<OrderId>,
    pub(crate) counters: NodeCounters,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: NodeId,
        key: String,
        name: String,
        location: Option<String>,
        echelon: Echelon,
        product: Arc<Product>,
        ledger: InventoryLedger,
        role: NodeRole,
    ) -> Self {
        Self {
            id,
            key,
            name,
            location,
            echelon,
            product,
            ledger,
            role,
            inbound: Vec::new(),
            replenishment: None,
            order_tolerance: 0.0,
            backorders: VecDeque::new(),
            counters: NodeCounters::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Identifier used in descriptors and traces
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn echelon(&self) -> Echelon {
        self.echelon
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn role(&self) -> &NodeRole {
        &self.role
    }

    pub fn inbound_links(&self) -> &[LinkId] {
        &self.inbound
    }

    pub fn replenishment(&self) -> Option<&ReplenishmentState> {
        self.replenishment.as_ref()
    }

    pub fn counters(&self) -> &NodeCounters {
        &self.counters
    }

    pub fn manufacturing(&self) -> Option<&ManufacturerRole> {
        match &self.role {
            NodeRole::Manufacturer(m) => Some(m),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match &self.role {
            NodeRole::Supplier(supply) => Capabilities {
                holds_inventory: !matches!(supply, Supply::Infinite),
                produces: false,
                sources_raw_material: true,
                sells_to_customers: false,
            },
            NodeRole::Manufacturer(_) => Capabilities {
                holds_inventory: true,
                produces: true,
                sources_raw_material: false,
                sells_to_customers: true,
            },
            NodeRole::Stockpoint => Capabilities {
                holds_inventory: true,
                produces: false,
                sources_raw_material: false,
                sells_to_customers: true,
            },
        }
    }

    pub fn is_infinite_supplier(&self) -> bool {
        matches!(self.role, NodeRole::Supplier(Supply::Infinite))
    }

    /// Finished-goods level
    pub fn level(&self) -> Quantity {
        self.ledger.level()
    }

    /// Whether `quantity` can be handed out right now
    pub fn can_cover(&self, quantity: Quantity) -> bool {
        self.is_infinite_supplier() || self.ledger.level() >= quantity
    }

    /// Hand out stock; infinite suppliers bypass the ledger entirely
    pub(crate) fn reserve_or_take(&mut self, now: SimTime, quantity: Quantity) -> Fulfillment {
        if self.is_infinite_supplier() {
            return Fulfillment::full(quantity);
        }
        self.ledger.reserve_or_take(now, quantity)
    }

    /// Put finished goods on the shelf
    pub(crate) fn receive_stock(&mut self, now: SimTime, quantity: Quantity) -> Receipt {
        self.ledger.receive(now, quantity)
    }

    pub(crate) fn accrue_to(&mut self, now: SimTime) {
        self.ledger.accrue_to(now);
        if let NodeRole::Manufacturer(m) = &mut self.role {
            m.raw.accrue_to(now);
        }
    }

    /// Holding cost of every store this node owns
    pub fn holding_cost(&self) -> f64 {
        let raw = match &self.role {
            NodeRole::Manufacturer(m) => m.raw.holding_cost(),
            _ => 0.0,
        };
        self.ledger.holding_cost() + raw
    }

    pub(crate) fn has_backorders(&self) -> bool {
        !self.backorders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(role: NodeRole, capacity: Quantity, initial: Quantity) -> Node {
        Node::new(
            NodeId(0),
            "n".to_string(),
            "n".to_string(),
            None,
            Echelon::Supplier,
            Arc::new(Product::new("p", 1.0, 2.0)),
            InventoryLedger::new(capacity, initial, 0.0).unwrap(),
            role,
        )
    }

    #[test]
    fn test_infinite_supplier_always_fulfills() {
        let mut supplier = node(NodeRole::Supplier(Supply::Infinite), 1, 0);
        for requested in [0, 1, 7, 10_000, Quantity::MAX / 2] {
            let outcome = supplier.reserve_or_take(0.0, requested);
            assert_eq!(outcome.fulfilled, requested);
            assert_eq!(outcome.shortfall, 0);
        }
        assert!(supplier.ledger().history().is_empty());
        assert!(!supplier.capabilities().holds_inventory);
    }

    #[test]
    fn test_finite_supplier_is_bounded_by_stock() {
        let mut supplier = node(
            NodeRole::Supplier(Supply::Extraction { quantity: 5, interval: 1.0 }),
            20,
            8,
        );
        let outcome = supplier.reserve_or_take(0.0, 10);
        assert_eq!(outcome.fulfilled, 8);
        assert_eq!(outcome.shortfall, 2);
        assert!(supplier.capabilities().holds_inventory);
    }
}
