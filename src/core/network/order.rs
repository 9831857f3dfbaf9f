use crate::core::types::{LinkId, NodeId, OrderId, Quantity, SimTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    /// Nothing handed out yet, waiting inside the tolerance window
    Pending,
    /// Some units handed out, remainder waiting inside the tolerance window
    PartiallyFulfilled,
    Fulfilled,
    /// Closed with a shortfall
    Expired,
}

/// Why a node placed an upstream order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderPurpose {
    /// Refill of the node's own stock, driven by its replenishment policy
    Replenishment,
    /// Raw material for a deferred production run
    RawMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Requester {
    /// External customer; `generator` is `None` for injected orders
    Customer { generator: Option<usize>, customer: u64 },
    /// Downstream node ordering over one of its inbound links
    Node { node: NodeId, link: LinkId, purpose: OrderPurpose },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub requester: Requester,
    /// Node the order is placed at
    pub supplier: NodeId,
    pub quantity: Quantity,
    pub placed_at: SimTime,
    pub tolerance: SimTime,
    pub fulfilled: Quantity,
    pub shortfall: Quantity,
    pub status: OrderStatus,
    pub closed_at: Option<SimTime>,
    /// Whether the order ever waited in a backorder queue
    pub backordered: bool,
}

impl Order {
    pub(crate) fn new(
        id: OrderId,
        requester: Requester,
        supplier: NodeId,
        quantity: Quantity,
        placed_at: SimTime,
        tolerance: SimTime,
    ) -> Self {
        Self {
            id,
            requester,
            supplier,
            quantity,
            placed_at,
            tolerance,
            fulfilled: 0,
            shortfall: 0,
            status: OrderStatus::Pending,
            closed_at: None,
            backordered: false,
        }
    }

    /// Units neither handed out nor written off
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.fulfilled - self.shortfall
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn is_customer_order(&self) -> bool {
        matches!(self.requester, Requester::Customer { .. })
    }

    /// Node that placed the order, if any
    pub fn requesting_node(&self) -> Option<NodeId> {
        match self.requester {
            Requester::Node { node, .. } => Some(node),
            Requester::Customer { .. } => None,
        }
    }
}
