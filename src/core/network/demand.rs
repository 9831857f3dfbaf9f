use crate::core::errors::SimError;
use crate::core::sampling::{Determinism, Generator};
use crate::core::types::{NodeId, Quantity, SimTime, MAX_ORDER_QUANTITY};

/// Produces customer orders at one node.
///
/// Between arrivals the generator is suspended in the clock; nothing about future
/// arrivals exists until the next arrival event fires.
pub struct DemandGenerator {
    pub(crate) index: usize,
    pub(crate) label: String,
    pub(crate) target: NodeId,
    arrival: Box<dyn Generator>,
    quantity: Box<dyn Generator>,
    pub(crate) tolerance: SimTime,
    pub(crate) customers: u64,
    pub(crate) cancelled: bool,
}

impl DemandGenerator {
    pub(crate) fn new(
        index: usize,
        label: String,
        target: NodeId,
        arrival: Box<dyn Generator>,
        quantity: Box<dyn Generator>,
        tolerance: SimTime,
    ) -> Self {
        Self {
            index,
            label,
            target,
            arrival,
            quantity,
            tolerance,
            customers: 0,
            cancelled: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn tolerance(&self) -> SimTime {
        self.tolerance
    }

    /// Customers that have arrived so far
    pub fn customers(&self) -> u64 {
        self.customers
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True when both draws replay identically for a fixed seed
    pub fn is_reproducible(&self) -> bool {
        self.arrival.determinism() != Determinism::Unseeded
            && self.quantity.determinism() != Determinism::Unseeded
    }

    /// Delay until the next arrival; `None` once the arrival source runs dry
    pub(crate) fn next_arrival_delay(&mut self) -> Option<SimTime> {
        if self.cancelled {
            return None;
        }
        self.arrival.next_value()
    }

    /// Units the next customer asks for, rounded to whole units
    pub(crate) fn next_quantity(&mut self) -> Result<Option<Quantity>, SimError> {
        let Some(raw) = self.quantity.next_value() else {
            return Ok(None);
        };
        to_quantity(raw, &self.label).map(Some)
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Round a sampled amount to whole units, rejecting negative, non-finite or oversized draws
pub(crate) fn to_quantity(raw: f64, entity: &str) -> Result<Quantity, SimError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(SimError::order(
            entity,
            format!("sampled quantity {} is negative or not finite", raw),
        ));
    }
    let rounded = raw.round();
    if rounded > MAX_ORDER_QUANTITY as f64 {
        return Err(SimError::order(
            entity,
            format!("sampled quantity {} exceeds the limit of {}", raw, MAX_ORDER_QUANTITY),
        ));
    }
    Ok(rounded as Quantity)
}

impl std::fmt::Debug for DemandGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemandGenerator")
            .field("label", &self.label)
            .field("target", &self.target)
            .field("tolerance", &self.tolerance)
            .field("customers", &self.customers)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
