use super::descriptors::{DemandSpec, LinkSpec, NetworkSpec, NodeRoleSpec, NodeSpec};
use super::topology_validator::TopologyValidator;
use crate::core::errors::SimError;
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::simulation_engine::Simulation;
use crate::core::inventory::{InventoryLedger, Product};
use crate::core::network::{DemandGenerator, Link, ManufacturerRole, Node, NodeRole, Supply};
use crate::core::replenishment::ReplenishmentState;
use crate::core::sampling::{stream_seed, Generator};
use crate::core::sink::{EventSink, NullSink};
use crate::core::types::{LinkId, NodeId, Quantity, SimTime};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Demand whose samplers are supplied directly instead of through a descriptor
struct CustomDemand {
    label: String,
    target: String,
    arrival: Box<dyn Generator>,
    quantity: Box<dyn Generator>,
    tolerance: SimTime,
}

/// Assembles and validates a [`Simulation`].
///
/// Every structural problem is reported here, before the first event runs: unknown
/// references, malformed parameters and topology violations all come back as
/// [`SimError::InvalidConfig`] naming the offending entity.
pub struct SimulationBuilder {
    config: SimulationConfig,
    network: NetworkSpec,
    custom_demands: Vec<CustomDemand>,
    sink: Option<Box<dyn EventSink>>,
}

impl SimulationBuilder {
    /// Create an empty builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            network: NetworkSpec::default(),
            custom_demands: Vec::new(),
            sink: None,
        }
    }

    /// Start from a descriptor; its embedded configuration becomes the builder's
    pub fn from_spec(network: NetworkSpec) -> Self {
        Self {
            config: network.config.clone(),
            network,
            custom_demands: Vec::new(),
            sink: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(Self::from_spec(NetworkSpec::from_json(json)?))
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Receiver for state-transition records. Defaults to [`NullSink`].
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn product(mut self, product: Product) -> Self {
        self.network.products.push(product);
        self
    }

    pub fn node(mut self, node: NodeSpec) -> Self {
        self.network.nodes.push(node);
        self
    }

    pub fn link(mut self, link: LinkSpec) -> Self {
        self.network.links.push(link);
        self
    }

    pub fn demand(mut self, demand: DemandSpec) -> Self {
        self.network.demands.push(demand);
        self
    }

    /// Attach a demand driven by arbitrary generators, such as a closure or a replayed trace
    pub fn custom_demand(
        mut self,
        label: impl Into<String>,
        target: impl Into<String>,
        arrival: Box<dyn Generator>,
        quantity: Box<dyn Generator>,
        tolerance: SimTime,
    ) -> Self {
        self.custom_demands.push(CustomDemand {
            label: label.into(),
            target: target.into(),
            arrival,
            quantity,
            tolerance,
        });
        self
    }

    /// Resolve every reference, validate and produce a simulation at time zero
    pub fn build(self) -> Result<Simulation, SimError> {
        let SimulationBuilder {
            config,
            network,
            custom_demands,
            sink,
        } = self;
        config
            .validate()
            .map_err(|reason| SimError::config("config", reason))?;

        let products = Self::build_products(&network.products)?;

        let mut nodes = Vec::with_capacity(network.nodes.len());
        let mut node_index: HashMap<String, NodeId> = HashMap::new();
        for spec in &network.nodes {
            if node_index.contains_key(&spec.id) {
                return Err(SimError::config(&spec.id, "duplicate node id"));
            }
            let id = NodeId(nodes.len());
            nodes.push(Self::build_node(id, spec, &products)?);
            node_index.insert(spec.id.clone(), id);
        }

        let mut streams = 0u64;
        let mut next_seed = || {
            let seed = config.seed.map(|base| stream_seed(base, streams));
            streams += 1;
            seed
        };

        let mut links = Vec::with_capacity(network.links.len());
        for spec in &network.links {
            let label = spec.label();
            if links.iter().any(|l: &Link| l.label() == label) {
                return Err(SimError::config(&label, "duplicate link id"));
            }
            let id = LinkId(links.len());
            let link = Self::build_link(id, spec, &label, &node_index, &nodes, &config, next_seed())?;
            nodes[link.sink().0].inbound.push(id);
            links.push(link);
        }

        for node in &nodes {
            TopologyValidator::validate_connected(node)
                .map_err(|reason| SimError::config(node.key(), reason))?;
        }

        let mut generators = Vec::with_capacity(network.demands.len() + custom_demands.len());
        for spec in &network.demands {
            let label = spec.label();
            let arrival = spec.arrival.build(&label, next_seed())?;
            let quantity = spec.quantity.build(&label, next_seed())?;
            let target = Self::demand_target(&label, &spec.target, spec.tolerance, &node_index, &nodes)?;
            generators.push(DemandGenerator::new(
                generators.len(),
                label,
                target,
                arrival,
                quantity,
                spec.tolerance,
            ));
        }
        for custom in custom_demands {
            let target =
                Self::demand_target(&custom.label, &custom.target, custom.tolerance, &node_index, &nodes)?;
            generators.push(DemandGenerator::new(
                generators.len(),
                custom.label,
                target,
                custom.arrival,
                custom.quantity,
                custom.tolerance,
            ));
        }

        if config.seed.is_none() || generators.iter().any(|g| !g.is_reproducible()) {
            info!("Network contains unseeded samplers; runs will not be reproducible");
        }
        info!(
            "Built network: {} nodes, {} links, {} demand generators",
            nodes.len(),
            links.len(),
            generators.len()
        );

        let sink = sink.unwrap_or_else(|| Box::new(NullSink));
        Ok(Simulation::new(config, nodes, links, generators, sink))
    }

    fn build_products(specs: &[Product]) -> Result<HashMap<String, Arc<Product>>, SimError> {
        let mut products = HashMap::new();
        for product in specs {
            product
                .validate()
                .map_err(|reason| SimError::config(&product.id, reason))?;
            if products
                .insert(product.id.clone(), Arc::new(product.clone()))
                .is_some()
            {
                return Err(SimError::config(&product.id, "duplicate product id"));
            }
        }
        Ok(products)
    }

    fn lookup_product(
        products: &HashMap<String, Arc<Product>>,
        entity: &str,
        id: &str,
    ) -> Result<Arc<Product>, SimError> {
        products
            .get(id)
            .cloned()
            .ok_or_else(|| SimError::config(entity, format!("unknown product '{}'", id)))
    }

    fn ledger(
        entity: &str,
        product: &Product,
        capacity: Quantity,
        initial_level: Quantity,
        holding_cost: f64,
    ) -> Result<InventoryLedger, SimError> {
        let ledger = InventoryLedger::new(capacity, initial_level, holding_cost)
            .map_err(|reason| SimError::config(entity, reason))?;
        Ok(match product.shelf_life {
            Some(shelf_life) => ledger.perishable(shelf_life),
            None => ledger,
        })
    }

    fn build_node(
        id: NodeId,
        spec: &NodeSpec,
        products: &HashMap<String, Arc<Product>>,
    ) -> Result<Node, SimError> {
        let key = spec.id.as_str();
        let invalid = |reason: String| SimError::config(key, reason);
        let product = Self::lookup_product(products, key, &spec.product)?;

        if !spec.order_tolerance.is_finite() || spec.order_tolerance < 0.0 {
            return Err(invalid(format!(
                "order tolerance {} must be finite and non-negative",
                spec.order_tolerance
            )));
        }

        let (ledger, role) = match &spec.role {
            NodeRoleSpec::Supplier { supply } => {
                if spec.policy.is_some() {
                    return Err(invalid("suppliers do not replenish".to_string()));
                }
                match *supply {
                    Supply::Infinite => {
                        let capacity = spec.capacity.unwrap_or(Quantity::MAX);
                        let ledger = Self::ledger(key, &product, capacity, 0, 0.0)?;
                        (ledger, NodeRole::Supplier(Supply::Infinite))
                    }
                    Supply::Extraction { quantity, interval } => {
                        if !(interval > 0.0) || !interval.is_finite() {
                            return Err(invalid(format!("extraction interval {} must be positive", interval)));
                        }
                        if quantity == 0 {
                            warn!("{}: extraction quantity is zero; stock never grows", key);
                        }
                        let capacity = Self::required_capacity(key, spec)?;
                        let initial = spec.initial_level.unwrap_or(capacity);
                        let ledger = Self::ledger(key, &product, capacity, initial, spec.holding_cost)?;
                        (ledger, NodeRole::Supplier(*supply))
                    }
                }
            }
            NodeRoleSpec::Manufacturer {
                raw_material,
                processing_time,
            } => {
                if !processing_time.is_finite() || *processing_time < 0.0 {
                    return Err(invalid(format!(
                        "processing time {} must be finite and non-negative",
                        processing_time
                    )));
                }
                let capacity = Self::required_capacity(key, spec)?;
                let initial = spec.initial_level.unwrap_or(capacity);
                let ledger = Self::ledger(key, &product, capacity, initial, spec.holding_cost)?;

                let raw_product = Self::lookup_product(products, key, &raw_material.product)?;
                let batch = spec.policy.map_or(1, |p| p.max_order());
                let needed = batch.saturating_mul(raw_material.per_unit);
                if raw_material.capacity < needed {
                    return Err(invalid(format!(
                        "raw material capacity {} cannot hold one batch of {} units",
                        raw_material.capacity, needed
                    )));
                }
                let raw = Self::ledger(
                    key,
                    &raw_product,
                    raw_material.capacity,
                    raw_material.initial_level,
                    raw_material.holding_cost,
                )?;
                let role = ManufacturerRole::new(raw, raw_product, raw_material.per_unit, *processing_time);
                (ledger, NodeRole::Manufacturer(role))
            }
            NodeRoleSpec::Distributor | NodeRoleSpec::Warehouse | NodeRoleSpec::Retailer => {
                let capacity = Self::required_capacity(key, spec)?;
                let initial = spec.initial_level.unwrap_or(capacity);
                let ledger = Self::ledger(key, &product, capacity, initial, spec.holding_cost)?;
                (ledger, NodeRole::Stockpoint)
            }
        };

        let mut node = Node::new(
            id,
            spec.id.clone(),
            spec.name.clone().unwrap_or_else(|| spec.id.clone()),
            spec.location.clone(),
            spec.role.echelon(),
            product,
            ledger,
            role,
        );
        if let Some(policy) = spec.policy {
            policy
                .validate(node.ledger().capacity())
                .map_err(invalid)?;
            node.replenishment = Some(ReplenishmentState::new(policy));
        }
        node.order_tolerance = spec.order_tolerance;
        Ok(node)
    }

    fn required_capacity(key: &str, spec: &NodeSpec) -> Result<Quantity, SimError> {
        spec.capacity
            .ok_or_else(|| SimError::config(key, "capacity is required"))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_link(
        id: LinkId,
        spec: &LinkSpec,
        label: &str,
        node_index: &HashMap<String, NodeId>,
        nodes: &[Node],
        config: &SimulationConfig,
        seed: Option<u64>,
    ) -> Result<Link, SimError> {
        let resolve = |key: &str| {
            node_index
                .get(key)
                .copied()
                .ok_or_else(|| SimError::config(label, format!("unknown node '{}'", key)))
        };
        let source = resolve(&spec.source)?;
        let sink = resolve(&spec.sink)?;
        let (source_node, sink_node) = (&nodes[source.0], &nodes[sink.0]);

        TopologyValidator::validate_link(config.topology, source_node, sink_node)
            .map_err(|reason| SimError::config(label, reason))?;
        TopologyValidator::validate_transport(spec.cost, spec.distance)
            .map_err(|reason| SimError::config(label, reason))?;
        TopologyValidator::check_reorder_coverage(source_node, sink_node);

        if let Some(m) = sink_node.manufacturing() {
            if m.raw_material().id != source_node.product().id {
                warn!(
                    "{}: '{}' supplies {} but '{}' consumes {}",
                    label,
                    source_node.key(),
                    source_node.product().id,
                    sink_node.key(),
                    m.raw_material().id
                );
            }
        }

        let lead_time = spec.lead_time.build(label, seed)?;
        Ok(Link::new(
            id,
            source,
            sink,
            label.to_string(),
            spec.cost,
            spec.distance,
            lead_time,
        ))
    }

    fn demand_target(
        label: &str,
        target: &str,
        tolerance: SimTime,
        node_index: &HashMap<String, NodeId>,
        nodes: &[Node],
    ) -> Result<NodeId, SimError> {
        let id = node_index
            .get(target)
            .copied()
            .ok_or_else(|| SimError::config(label, format!("unknown node '{}'", target)))?;
        if !nodes[id.0].capabilities().sells_to_customers {
            return Err(SimError::config(
                label,
                format!("node '{}' does not sell to customers", target),
            ));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SimError::config(
                label,
                format!("tolerance {} must be finite and non-negative", tolerance),
            ));
        }
        Ok(id)
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
