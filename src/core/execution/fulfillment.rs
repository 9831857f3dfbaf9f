//! Order-fulfilment protocol: sale, shipment, backorders, expiry and settlement.

use super::config::{OverflowPolicy, SupplierSelection};
use super::simulation_engine::Simulation;
use crate::core::errors::SimError;
use crate::core::event::Event;
use crate::core::inventory::Receipt;
use crate::core::network::{NodeRole, Order, OrderPurpose, OrderStatus, Requester};
use crate::core::types::{LinkId, NodeId, OrderId, Quantity};
use log::debug;
use rand::Rng;

impl Simulation {
    /// Serve an order from the stock of the node it was placed at
    pub(crate) fn fulfill(&mut self, id: OrderId) -> Result<(), SimError> {
        let now = self.clock.now();
        let (seller, remaining, tolerance) = {
            let order = self.open_order(id)?;
            (order.supplier, order.remaining(), order.tolerance)
        };

        let outcome = self.nodes[seller.0].reserve_or_take(now, remaining);
        if outcome.fulfilled > 0 {
            self.record_sale(id, outcome.fulfilled)?;
        }

        if outcome.shortfall == 0 {
            self.close_order(id, OrderStatus::Fulfilled)?;
        } else if tolerance <= 0.0 {
            self.write_off(id, outcome.shortfall)?;
            self.close_order(id, OrderStatus::Expired)?;
        } else {
            let order = self.open_order_mut(id)?;
            order.status = if order.fulfilled > 0 {
                OrderStatus::PartiallyFulfilled
            } else {
                OrderStatus::Pending
            };
            order.backordered = true;
            self.nodes[seller.0].backorders.push_back(id);

            let key = self.nodes[seller.0].key.clone();
            self.clock
                .schedule(tolerance, Event::BackorderExpiry { order: id })
                .map_err(|e| e.scheduled_by(&key))?;
            self.emit(
                &key,
                &format!("{} backordered: {} units wait up to {}", id, outcome.shortfall, tolerance),
            );
        }

        self.review_threshold(seller)
    }

    /// Book `quantity` handed out against an order and pass it on to the requester
    fn record_sale(&mut self, id: OrderId, quantity: Quantity) -> Result<(), SimError> {
        let order = self.open_order_mut(id)?;
        order.fulfilled += quantity;
        let requester = order.requester;
        let supplier = order.supplier;
        let seller = &mut self.nodes[supplier.0];

        let amount = quantity as f64 * seller.product.sell_price;
        seller.counters.units_sold = seller.counters.units_sold.saturating_add(quantity);
        seller.counters.revenue += amount;

        match requester {
            Requester::Customer { .. } => {
                self.customers.fulfilled_units = self.customers.fulfilled_units.saturating_add(quantity);
                Ok(())
            }
            Requester::Node { node, link, .. } => {
                self.nodes[node.0].counters.procurement_cost += amount;
                self.ship(link, id, quantity)
            }
        }
    }

    /// Put units on the road; transport cost lands on the sink right away
    fn ship(&mut self, link: LinkId, order: OrderId, quantity: Quantity) -> Result<(), SimError> {
        let l = &mut self.links[link.0];
        let lead_time = l.dispatch(quantity)?;
        let sink = l.sink;
        let cost = l.cost;
        let label = l.label.clone();

        self.nodes[sink.0].counters.transportation_cost += cost;
        *self.in_transit.entry(order).or_insert(0) += quantity;

        self.clock
            .schedule(lead_time, Event::Delivery { link, order, quantity })
            .map_err(|e| e.scheduled_by(&label))?;
        self.emit(
            &label,
            &format!("shipped {} units for {}, arriving in {:.4}", quantity, order, lead_time),
        );
        Ok(())
    }

    pub(crate) fn deliver(&mut self, link: LinkId, order: OrderId, quantity: Quantity) -> Result<(), SimError> {
        let now = self.clock.now();
        let l = &mut self.links[link.0];
        l.complete_delivery(quantity);
        let sink = l.sink;
        let label = l.label.clone();

        let n = &mut self.nodes[sink.0];
        let is_manufacturer = matches!(n.role, NodeRole::Manufacturer(_));
        let receipt = match &mut n.role {
            NodeRole::Manufacturer(m) => m.raw.receive(now, quantity),
            _ => n.ledger.receive(now, quantity),
        };
        self.book_overflow(sink, receipt);
        self.emit(
            &label,
            &format!("delivered {} units for {} ({} accepted)", quantity, order, receipt.accepted),
        );

        let arrived = match self.in_transit.get_mut(&order) {
            Some(units) => {
                *units = units.saturating_sub(quantity);
                *units == 0
            }
            None => true,
        };
        if arrived {
            self.in_transit.remove(&order);
            if self.orders.get(&order).is_some_and(|o| !o.is_open()) {
                self.settle(order);
            }
        }

        if is_manufacturer {
            self.try_start_production(sink)?;
        } else {
            self.serve_backorders(sink)?;
        }
        self.review_threshold(sink)
    }

    pub(crate) fn book_overflow(&mut self, node: NodeId, receipt: Receipt) {
        if receipt.overflow == 0 {
            return;
        }
        let n = &mut self.nodes[node.0];
        if self.config.overflow_policy == OverflowPolicy::CountAsWaste {
            n.counters.overflow_waste += receipt.overflow;
        }
        let key = n.key.clone();
        self.emit(&key, &format!("{} units overflowed", receipt.overflow));
    }

    /// Serve the backorder queue from its head while the head can be covered in full
    pub(crate) fn serve_backorders(&mut self, node: NodeId) -> Result<(), SimError> {
        let now = self.clock.now();
        let mut served = false;

        while let Some(&head) = self.nodes[node.0].backorders.front() {
            let remaining = match self.orders.get(&head) {
                Some(order) if order.is_open() => order.remaining(),
                _ => {
                    self.nodes[node.0].backorders.pop_front();
                    continue;
                }
            };
            let n = &mut self.nodes[node.0];
            if !n.can_cover(remaining) {
                break;
            }
            n.backorders.pop_front();
            let outcome = n.reserve_or_take(now, remaining);
            n.counters.backorder_recovered += outcome.fulfilled;
            let key = n.key.clone();

            self.record_sale(head, outcome.fulfilled)?;
            self.emit(&key, &format!("{} recovered from backorder", head));
            self.close_order(head, OrderStatus::Fulfilled)?;
            served = true;
        }

        if served {
            self.review_threshold(node)?;
        }
        Ok(())
    }

    /// Close the tolerance window of an order; a no-op once it has closed
    pub(crate) fn expire_backorder(&mut self, id: OrderId) -> Result<(), SimError> {
        let Some(order) = self.orders.get(&id) else {
            return Ok(());
        };
        if !order.is_open() {
            return Ok(());
        }
        let seller = order.supplier;
        let remaining = order.remaining();

        self.nodes[seller.0].backorders.retain(|queued| *queued != id);
        self.write_off(id, remaining)?;
        self.close_order(id, OrderStatus::Expired)?;

        // the expired head may have been blocking smaller orders behind it
        self.serve_backorders(seller)
    }

    /// Record an unmet remainder as shortage, exactly once
    fn write_off(&mut self, id: OrderId, quantity: Quantity) -> Result<(), SimError> {
        let order = self.open_order_mut(id)?;
        order.shortfall += quantity;
        let customer = order.is_customer_order();
        let seller = order.supplier;

        let counters = &mut self.nodes[seller.0].counters;
        counters.shortage_units = counters.shortage_units.saturating_add(quantity);
        if customer {
            self.customers.shortage_units = self.customers.shortage_units.saturating_add(quantity);
        }
        let key = self.nodes[seller.0].key.clone();
        self.emit(&key, &format!("{} short by {} units", id, quantity));
        Ok(())
    }

    fn close_order(&mut self, id: OrderId, status: OrderStatus) -> Result<(), SimError> {
        let now = self.clock.now();
        let order = self.open_order_mut(id)?;
        order.status = status;
        order.closed_at = Some(now);
        debug!(
            "{} closed {:?}: {} fulfilled, {} short",
            id, status, order.fulfilled, order.shortfall
        );
        self.closed.push(id);

        if !self.in_transit.contains_key(&id) {
            self.settle(id);
        }
        Ok(())
    }

    /// Release the requester's guard once an order is closed and nothing is on the road
    fn settle(&mut self, id: OrderId) {
        let Some(order) = self.orders.get(&id) else {
            return;
        };
        let Requester::Node { node, purpose, .. } = order.requester else {
            return;
        };

        let n = &mut self.nodes[node.0];
        match purpose {
            OrderPurpose::Replenishment => {
                if let Some(state) = n.replenishment.as_mut() {
                    state.on_settled();
                }
            }
            OrderPurpose::RawMaterial => {
                if let NodeRole::Manufacturer(m) = &mut n.role {
                    m.raw_on_order = false;
                }
            }
        }
    }

    /// Evaluate a threshold policy against the current level
    pub(crate) fn review_threshold(&mut self, node: NodeId) -> Result<(), SimError> {
        let n = &self.nodes[node.0];
        let Some(state) = n.replenishment.as_ref() else {
            return Ok(());
        };
        match state.evaluate(n.level()) {
            Some(quantity) => self.place_replenishment(node, quantity),
            None => Ok(()),
        }
    }

    /// Idle → OrderPlaced. Manufacturers produce, everybody else orders upstream.
    pub(crate) fn place_replenishment(&mut self, node: NodeId, quantity: Quantity) -> Result<(), SimError> {
        if quantity == 0 {
            return Ok(());
        }
        let n = &mut self.nodes[node.0];
        let Some(state) = n.replenishment.as_mut() else {
            return Ok(());
        };
        state.record_placed(quantity);
        let level = n.level();
        let key = n.key.clone();
        let is_manufacturer = matches!(n.role, NodeRole::Manufacturer(_));
        self.emit(&key, &format!("replenishment of {} units at level {}", quantity, level));

        if is_manufacturer {
            return self.request_production(node, quantity);
        }
        self.order_upstream(node, quantity, OrderPurpose::Replenishment)
    }

    /// Place an order over one of the node's inbound links and fulfil it at the source
    pub(crate) fn order_upstream(
        &mut self,
        node: NodeId,
        quantity: Quantity,
        purpose: OrderPurpose,
    ) -> Result<(), SimError> {
        let link = self.select_link(node)?;
        let source = self.links[link.0].source;
        let tolerance = self.nodes[node.0].order_tolerance;

        let requester = Requester::Node { node, link, purpose };
        let id = self.create_order(requester, source, quantity, tolerance);
        self.fulfill(id)
    }

    fn select_link(&mut self, node: NodeId) -> Result<LinkId, SimError> {
        let n = &self.nodes[node.0];
        let inbound = &n.inbound;
        let Some(&first) = inbound.first() else {
            return Err(SimError::order(&n.key, "no inbound link to order over"));
        };

        let chosen = match self.config.supplier_selection {
            SupplierSelection::First => first,
            SupplierSelection::Random => inbound[self.rng.gen_range(0..inbound.len())],
            SupplierSelection::Cheapest => {
                let mut best = first;
                for &candidate in &inbound[1..] {
                    if self.links[candidate.0].cost < self.links[best.0].cost {
                        best = candidate;
                    }
                }
                best
            }
        };
        if inbound.len() > 1 {
            debug!("{} orders over {}", n.key, self.links[chosen.0].label);
        }
        Ok(chosen)
    }

    fn open_order(&self, id: OrderId) -> Result<&Order, SimError> {
        match self.orders.get(&id) {
            Some(order) if order.is_open() => Ok(order),
            _ => Err(SimError::order(id.to_string(), "order is not open")),
        }
    }

    fn open_order_mut(&mut self, id: OrderId) -> Result<&mut Order, SimError> {
        match self.orders.get_mut(&id) {
            Some(order) if order.is_open() => Ok(order),
            _ => Err(SimError::order(id.to_string(), "order is not open")),
        }
    }
}
