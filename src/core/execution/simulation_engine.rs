use crate::core::errors::SimError;
use crate::core::event::Event;
use crate::core::event_scheduler::SimClock;
use crate::core::execution::config::SimulationConfig;
use crate::core::network::{DemandGenerator, Link, Node, NodeRole, Order, Requester, Supply};
use crate::core::sink::EventSink;
use crate::core::stats::{CustomerCounters, LinkStatistics, NetworkStatistics, NodeStatistics, StatisticsSnapshot};
use crate::core::types::{LinkId, NodeId, OrderId, Quantity, SimTime, MAX_ORDER_QUANTITY};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// A fully assembled supply-chain network together with its clock.
///
/// Nodes, links and demand generators live in arenas owned by the simulation and are
/// addressed by id. All of them are logical processes driven by one [`SimClock`];
/// nothing runs concurrently inside a single simulation.
pub struct Simulation {
    pub(crate) config: SimulationConfig,
    pub(crate) clock: SimClock<Event>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) generators: Vec<DemandGenerator>,
    /// Every order ever placed, open or closed
    pub(crate) orders: BTreeMap<OrderId, Order>,
    /// Ids of closed orders in closing order
    pub(crate) closed: Vec<OrderId>,
    /// Units of each order still on the road
    pub(crate) in_transit: BTreeMap<OrderId, Quantity>,
    pub(crate) customers: CustomerCounters,
    pub(crate) rng: StdRng,
    pub(crate) sink: Box<dyn EventSink>,
    next_order: u64,
    injected: u64,
    started: bool,
    finished: bool,
}

impl Simulation {
    pub(crate) fn new(
        config: SimulationConfig,
        nodes: Vec<Node>,
        links: Vec<Link>,
        generators: Vec<DemandGenerator>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            clock: SimClock::new(),
            nodes,
            links,
            generators,
            orders: BTreeMap::new(),
            closed: Vec::new(),
            in_transit: BTreeMap::new(),
            customers: CustomerCounters::default(),
            rng,
            sink,
            next_order: 0,
            injected: 0,
            started: false,
            finished: false,
        }
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Look a node up by its descriptor id
    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.key == key).map(|n| n.id)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn demand_generators(&self) -> &[DemandGenerator] {
        &self.generators
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Closed orders in the order they closed
    pub fn closed_orders(&self) -> impl Iterator<Item = &Order> {
        self.closed.iter().filter_map(|id| self.orders.get(id))
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.is_open())
    }

    pub fn customer_counters(&self) -> &CustomerCounters {
        &self.customers
    }

    pub fn pending_events(&self) -> usize {
        self.clock.pending()
    }

    pub fn events_processed(&self) -> u64 {
        self.clock.processed()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Schedule the first wake-up of every process. Runs once; later calls are no-ops.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        info!(
            "Starting simulation: {} nodes, {} links, {} demand generators",
            self.nodes.len(),
            self.links.len(),
            self.generators.len()
        );

        for index in 0..self.generators.len() {
            self.schedule_next_arrival(index)?;
        }

        let interval = self.config.review_interval;
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let id = node.id;
            let key = node.key.clone();

            if node.capabilities().holds_inventory {
                self.clock
                    .schedule(interval, Event::DailyReview { node: id })
                    .map_err(|e| e.scheduled_by(&key))?;
            }
            if let NodeRole::Supplier(Supply::Extraction { interval, .. }) = node.role {
                self.clock
                    .schedule(interval, Event::Extraction { node: id })
                    .map_err(|e| e.scheduled_by(&key))?;
            }
            if let Some(period) = node.replenishment.as_ref().and_then(|r| r.policy().period()) {
                self.clock
                    .schedule(period, Event::PeriodicReview { node: id })
                    .map_err(|e| e.scheduled_by(&key))?;
            }
        }

        for index in 0..self.nodes.len() {
            self.review_threshold(NodeId(index))?;
        }
        Ok(())
    }

    /// Process every event due at or before `until`, then move the clock to `until`.
    ///
    /// Returns the number of events handled. Can be called repeatedly with growing
    /// horizons for stepwise runs.
    pub fn run_until(&mut self, until: SimTime) -> Result<usize, SimError> {
        if !until.is_finite() || until < self.clock.now() {
            return Err(SimError::schedule(
                "simulation",
                format!("cannot run until {} when the clock reads {}", until, self.clock.now()),
            ));
        }
        self.start()?;

        let mut handled = 0;
        while let Some(scheduled) = self.clock.pop_due(until) {
            debug!(
                "=== t={:.4} #{} {} ===",
                scheduled.time,
                scheduled.sequence_num,
                scheduled.event.name()
            );
            self.dispatch(scheduled.event)?;
            handled += 1;
        }

        self.clock.advance_to(until);
        for node in &mut self.nodes {
            node.accrue_to(until);
        }
        Ok(handled)
    }

    /// Run to `until`, cancel every pending process and return the final statistics
    pub fn simulate(&mut self, until: SimTime) -> Result<StatisticsSnapshot, SimError> {
        let handled = self.run_until(until)?;

        for generator in &mut self.generators {
            generator.cancel();
        }
        let discarded = self.clock.cancel_pending();
        self.finished = true;

        info!(
            "Simulation finished at t={}: {} events handled, {} pending events discarded",
            until, handled, discarded
        );
        Ok(self.snapshot())
    }

    /// Inject a customer order at `node`, outside any demand generator
    pub fn place_customer_order(
        &mut self,
        node: NodeId,
        quantity: Quantity,
        tolerance: SimTime,
    ) -> Result<OrderId, SimError> {
        let target = self
            .nodes
            .get(node.0)
            .ok_or_else(|| SimError::order(node.to_string(), "no such node"))?;
        if !target.capabilities().sells_to_customers {
            return Err(SimError::order(&target.key, "node does not sell to customers"));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SimError::order(
                &target.key,
                format!("tolerance {} must be finite and non-negative", tolerance),
            ));
        }
        if quantity > MAX_ORDER_QUANTITY {
            return Err(SimError::order(
                &target.key,
                format!("quantity {} exceeds the limit of {}", quantity, MAX_ORDER_QUANTITY),
            ));
        }
        self.start()?;

        self.injected += 1;
        self.customers.customers += 1;
        let requester = Requester::Customer {
            generator: None,
            customer: self.injected,
        };
        let id = self.create_order(requester, node, quantity, tolerance);
        self.fulfill(id)?;
        Ok(id)
    }

    /// Read-only view of every metric at the current time
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mut node_backorder = vec![0; self.nodes.len()];
        let mut customer_backorder = 0;
        for order in self.open_orders() {
            let slot = &mut node_backorder[order.supplier.0];
            *slot = order.remaining().saturating_add(*slot);
            if order.is_customer_order() {
                customer_backorder = order.remaining().saturating_add(customer_backorder);
            }
        }

        let time = self.clock.now();
        let nodes: Vec<NodeStatistics> = self
            .nodes
            .iter()
            .map(|node| NodeStatistics::from_node(node, node_backorder[node.id.0], time))
            .collect();
        let links = self
            .links
            .iter()
            .map(|link| LinkStatistics::from_link(link, &self.nodes[link.source.0], &self.nodes[link.sink.0], time))
            .collect();
        let network = NetworkStatistics::aggregate(&nodes, &self.customers, customer_backorder);

        StatisticsSnapshot {
            time,
            events_processed: self.clock.processed(),
            nodes,
            links,
            network,
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimError> {
        match event {
            Event::CustomerArrival { generator } => self.on_customer_arrival(generator),
            Event::BackorderExpiry { order } => self.expire_backorder(order),
            Event::Delivery { link, order, quantity } => self.deliver(link, order, quantity),
            Event::ProductionComplete { node, quantity } => self.complete_production(node, quantity),
            Event::PeriodicReview { node } => self.on_periodic_review(node),
            Event::DailyReview { node } => self.on_daily_review(node),
            Event::Extraction { node } => self.on_extraction(node),
        }
    }

    pub(crate) fn emit(&mut self, entity: &str, message: &str) {
        let now = self.clock.now();
        self.sink.emit(now, entity, message);
    }

    pub(crate) fn create_order(
        &mut self,
        requester: Requester,
        supplier: NodeId,
        quantity: Quantity,
        tolerance: SimTime,
    ) -> OrderId {
        let id = OrderId(self.next_order);
        self.next_order += 1;

        let seller = &mut self.nodes[supplier.0];
        seller.counters.orders_received += 1;
        seller.counters.demand_units = seller.counters.demand_units.saturating_add(quantity);
        if matches!(requester, Requester::Customer { .. }) {
            self.customers.demand_units = self.customers.demand_units.saturating_add(quantity);
        }

        let order = Order::new(id, requester, supplier, quantity, self.clock.now(), tolerance);
        self.orders.insert(id, order);
        id
    }

    fn schedule_next_arrival(&mut self, index: usize) -> Result<(), SimError> {
        let generator = &mut self.generators[index];
        match generator.next_arrival_delay() {
            Some(delay) => {
                let label = generator.label.clone();
                self.clock
                    .schedule(delay, Event::CustomerArrival { generator: index })
                    .map_err(|e| e.scheduled_by(&label))?;
            }
            None => {
                generator.cancel();
                let label = generator.label.clone();
                self.emit(&label, "arrival source exhausted");
            }
        }
        Ok(())
    }

    fn on_customer_arrival(&mut self, index: usize) -> Result<(), SimError> {
        let generator = &mut self.generators[index];
        if generator.cancelled {
            return Ok(());
        }
        let label = generator.label.clone();
        let Some(quantity) = generator.next_quantity()? else {
            generator.cancel();
            self.emit(&label, "quantity source exhausted");
            return Ok(());
        };

        generator.customers += 1;
        let customer = generator.customers;
        let target = generator.target;
        let tolerance = generator.tolerance;
        self.customers.customers += 1;

        if quantity == 0 {
            self.emit(&label, &format!("customer {} left without ordering", customer));
        } else {
            let requester = Requester::Customer {
                generator: Some(index),
                customer,
            };
            let id = self.create_order(requester, target, quantity, tolerance);
            self.emit(&label, &format!("customer {} ordered {} units ({})", customer, quantity, id));
            self.fulfill(id)?;
        }

        self.schedule_next_arrival(index)
    }

    fn on_periodic_review(&mut self, node: NodeId) -> Result<(), SimError> {
        let Some(state) = self.nodes[node.0].replenishment.as_ref() else {
            return Ok(());
        };
        let period = state.policy().period();
        if let Some(quantity) = state.on_timer() {
            self.place_replenishment(node, quantity)?;
        }
        if let Some(period) = period {
            let key = self.nodes[node.0].key.clone();
            self.clock
                .schedule(period, Event::PeriodicReview { node })
                .map_err(|e| e.scheduled_by(&key))?;
        }
        Ok(())
    }

    fn on_daily_review(&mut self, node: NodeId) -> Result<(), SimError> {
        let now = self.clock.now();
        let n = &mut self.nodes[node.0];
        n.accrue_to(now);

        let wasted = n.ledger.tick_perishable(now);
        let mut salvage = wasted as f64 * n.product.salvage_value.unwrap_or(0.0);
        let mut raw_wasted = 0;
        let mut retry_production = false;
        if let NodeRole::Manufacturer(m) = &mut n.role {
            raw_wasted = m.raw.tick_perishable(now);
            salvage += raw_wasted as f64 * m.raw_material.salvage_value.unwrap_or(0.0);
            retry_production = m.deferred && !m.raw_on_order && !m.busy;
        }
        n.counters.salvage_revenue += salvage;

        let key = n.key.clone();
        let level = n.level();
        if wasted > 0 {
            self.emit(&key, &format!("{} units expired", wasted));
        }
        if raw_wasted > 0 {
            self.emit(&key, &format!("{} units of raw material expired", raw_wasted));
        }
        self.emit(&key, &format!("level {}", level));

        if retry_production {
            self.try_start_production(node)?;
        }
        self.review_threshold(node)?;

        self.clock
            .schedule(self.config.review_interval, Event::DailyReview { node })
            .map_err(|e| e.scheduled_by(&key))?;
        Ok(())
    }

    fn on_extraction(&mut self, node: NodeId) -> Result<(), SimError> {
        let now = self.clock.now();
        let n = &mut self.nodes[node.0];
        let NodeRole::Supplier(Supply::Extraction { quantity, interval }) = n.role else {
            return Ok(());
        };

        let extracted = quantity.min(n.ledger.available_space());
        if extracted > 0 {
            n.receive_stock(now, extracted);
        }
        let key = n.key.clone();
        self.emit(&key, &format!("extracted {} units", extracted));

        self.serve_backorders(node)?;
        self.clock
            .schedule(interval, Event::Extraction { node })
            .map_err(|e| e.scheduled_by(&key))?;
        Ok(())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.clock.now())
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("generators", &self.generators.len())
            .field("orders", &self.orders.len())
            .field("pending_events", &self.clock.pending())
            .finish()
    }
}
