use super::types::{LinkId, NodeId, OrderId, Quantity};

/// Everything the clock can wake a process up for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Next customer of a demand generator arrives
    CustomerArrival { generator: usize },
    /// Tolerance window of a backordered order closes
    BackorderExpiry { order: OrderId },
    /// A shipment reaches the sink of its link
    Delivery { link: LinkId, order: OrderId, quantity: Quantity },
    /// A production run frees the production slot
    ProductionComplete { node: NodeId, quantity: Quantity },
    /// Timer of a periodic replenishment policy
    PeriodicReview { node: NodeId },
    /// Once-per-day bookkeeping of a stock-holding node
    DailyReview { node: NodeId },
    /// A finite supplier restocks
    Extraction { node: NodeId },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CustomerArrival { .. } => "customer_arrival",
            Event::BackorderExpiry { .. } => "backorder_expiry",
            Event::Delivery { .. } => "delivery",
            Event::ProductionComplete { .. } => "production_complete",
            Event::PeriodicReview { .. } => "periodic_review",
            Event::DailyReview { .. } => "daily_review",
            Event::Extraction { .. } => "extraction",
        }
    }
}
