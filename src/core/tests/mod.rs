mod production_tests;
mod topology_validator_tests;

use crate::core::builder::{LinkSpec, NodeSpec, SimulationBuilder};
use crate::core::execution::config::{SimulationConfig, TopologyRules};
use crate::core::execution::simulation_engine::Simulation;
use crate::core::inventory::Product;
use crate::core::replenishment::ReplenishmentPolicy;
use crate::core::sampling::SamplerSpec;
use crate::core::types::{NodeId, Quantity, SimTime};

pub(crate) fn init_logger() {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
}

pub(crate) fn constant(value: f64) -> SamplerSpec {
    SamplerSpec::Constant { value }
}

/// Infinite supplier feeding one retailer directly
pub(crate) fn single_stockpoint(
    capacity: Quantity,
    initial: Quantity,
    policy: Option<ReplenishmentPolicy>,
    lead_time: SimTime,
) -> Simulation {
    init_logger();
    let mut retailer = NodeSpec::retailer("shop", "widget", capacity).with_initial_level(initial);
    if let Some(policy) = policy {
        retailer = retailer.with_policy(policy);
    }
    SimulationBuilder::new()
        .with_config(SimulationConfig::new().with_topology(TopologyRules::Permissive))
        .product(Product::new("widget", 4.0, 10.0))
        .node(NodeSpec::supplier("plant", "widget"))
        .node(retailer)
        .link(LinkSpec::new("plant", "shop", constant(lead_time)).with_cost(2.0))
        .build()
        .unwrap()
}

pub(crate) fn shop(sim: &Simulation) -> NodeId {
    sim.node_id("shop").unwrap()
}
