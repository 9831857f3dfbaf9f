use crate::core::errors::SimError;
use crate::core::sampling::Generator;
use crate::core::types::{LinkId, NodeId, Quantity, SimTime};

/// Unidirectional transport connection between two nodes of the arena.
///
/// Holds only node ids; both endpoints outlive the link.
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) source: NodeId,
    pub(crate) sink: NodeId,
    pub(crate) label: String,
    /// Charged to the sink once per shipment
    pub(crate) cost: f64,
    pub(crate) distance: Option<f64>,
    lead_time: Box<dyn Generator>,
    pub(crate) shipments: u64,
    pub(crate) units_shipped: Quantity,
    pub(crate) units_in_transit: Quantity,
    pub(crate) transport_cost: f64,
    /// Sum of the sampled lead times over every shipment
    pub(crate) lead_time_total: SimTime,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        source: NodeId,
        sink: NodeId,
        label: String,
        cost: f64,
        distance: Option<f64>,
        lead_time: Box<dyn Generator>,
    ) -> Self {
        Self {
            id,
            source,
            sink,
            label,
            cost,
            distance,
            lead_time,
            shipments: 0,
            units_shipped: 0,
            units_in_transit: 0,
            transport_cost: 0.0,
            lead_time_total: 0.0,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn units_in_transit(&self) -> Quantity {
        self.units_in_transit
    }

    /// Sample the lead time of a new shipment and book it as in transit
    pub(crate) fn dispatch(&mut self, quantity: Quantity) -> Result<SimTime, SimError> {
        let lead_time = self
            .lead_time
            .next_value()
            .ok_or_else(|| SimError::SamplerExhausted {
                entity: self.label.clone(),
            })?;
        if !lead_time.is_finite() || lead_time < 0.0 {
            return Err(SimError::schedule(
                &self.label,
                format!("sampled lead time {} is negative", lead_time),
            ));
        }

        self.shipments += 1;
        self.units_shipped = self.units_shipped.saturating_add(quantity);
        self.units_in_transit = self.units_in_transit.saturating_add(quantity);
        self.transport_cost += self.cost;
        self.lead_time_total += lead_time;
        Ok(lead_time)
    }

    pub(crate) fn complete_delivery(&mut self, quantity: Quantity) {
        self.units_in_transit = self.units_in_transit.saturating_sub(quantity);
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("source", &self.source)
            .field("sink", &self.sink)
            .field("cost", &self.cost)
            .field("shipments", &self.shipments)
            .finish()
    }
}
