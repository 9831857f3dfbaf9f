use super::simulation_engine::Simulation;
use crate::core::errors::SimError;
use crate::core::event::Event;
use crate::core::network::{NodeRole, OrderPurpose};
use crate::core::types::{NodeId, Quantity};

impl Simulation {
    /// Queue a production run behind the ones already waiting for the slot
    pub(crate) fn request_production(&mut self, node: NodeId, quantity: Quantity) -> Result<(), SimError> {
        if let NodeRole::Manufacturer(m) = &mut self.nodes[node.0].role {
            m.queue.push_back(quantity);
        }
        self.try_start_production(node)
    }

    /// Start the head run if the slot is free and the raw store can feed it.
    ///
    /// Raw material is consumed up front. When it is short the run stays queued and,
    /// unless one is already outstanding, a raw-material order sized to fill the raw
    /// store goes out.
    pub(crate) fn try_start_production(&mut self, node: NodeId) -> Result<(), SimError> {
        let now = self.clock.now();
        let n = &mut self.nodes[node.0];
        let NodeRole::Manufacturer(m) = &mut n.role else {
            return Ok(());
        };
        if m.busy {
            return Ok(());
        }
        let Some(&quantity) = m.queue.front() else {
            return Ok(());
        };
        let key = n.key.clone();

        let needed = quantity * m.raw_per_unit;
        if !m.raw.consume(now, needed) {
            let first_deferral = !m.deferred;
            m.deferred = true;
            let raw_level = m.raw.level();
            let reorder = if m.raw_on_order {
                None
            } else {
                m.raw_on_order = true;
                Some(m.raw.available_space())
            };

            if first_deferral {
                self.emit(
                    &key,
                    &format!(
                        "production of {} deferred: {} raw units on hand, {} needed",
                        quantity, raw_level, needed
                    ),
                );
            }
            if let Some(raw_quantity) = reorder {
                self.emit(&key, &format!("ordering {} units of raw material", raw_quantity));
                self.order_upstream(node, raw_quantity, OrderPurpose::RawMaterial)?;
            }
            return Ok(());
        }

        m.queue.pop_front();
        m.busy = true;
        m.deferred = false;
        let processing_time = m.processing_time;
        n.counters.production_cost += quantity as f64 * n.product.unit_cost;

        self.clock
            .schedule(processing_time, Event::ProductionComplete { node, quantity })
            .map_err(|e| e.scheduled_by(&key))?;
        self.emit(&key, &format!("production of {} units started", quantity));
        Ok(())
    }

    /// Free the slot, shelve the output and start whatever is queued next
    pub(crate) fn complete_production(&mut self, node: NodeId, quantity: Quantity) -> Result<(), SimError> {
        let now = self.clock.now();
        let n = &mut self.nodes[node.0];
        if let NodeRole::Manufacturer(m) = &mut n.role {
            m.busy = false;
            m.units_produced += quantity;
        }
        let receipt = n.receive_stock(now, quantity);
        if let Some(state) = n.replenishment.as_mut() {
            state.on_settled();
        }
        let key = n.key.clone();

        self.book_overflow(node, receipt);
        self.emit(&key, &format!("production of {} units completed", quantity));

        self.serve_backorders(node)?;
        self.try_start_production(node)?;
        self.review_threshold(node)
    }
}
