#[cfg(test)]
mod tests {
    use crate::core::builder::{DemandSpec, LinkSpec, NodeSpec, RawMaterialSpec, SimulationBuilder};
    use crate::core::errors::{ErrorKind, SimError};
    use crate::core::execution::config::{SimulationConfig, TopologyRules};
    use crate::core::inventory::Product;
    use crate::core::replenishment::ReplenishmentPolicy;
    use crate::core::tests::constant;

    fn chain() -> SimulationBuilder {
        SimulationBuilder::new()
            .product(Product::new("ore", 1.0, 2.0))
            .product(Product::new("widget", 5.0, 9.0))
            .node(NodeSpec::supplier("mine", "ore"))
            .node(NodeSpec::manufacturer(
                "factory",
                "widget",
                100,
                RawMaterialSpec::new("ore", 1, 100),
                1.0,
            ))
            .node(NodeSpec::distributor("hub", "widget", 80))
            .node(NodeSpec::retailer("shop", "widget", 40))
            .link(LinkSpec::new("mine", "factory", constant(1.0)))
            .link(LinkSpec::new("factory", "hub", constant(1.0)))
            .link(LinkSpec::new("hub", "shop", constant(1.0)))
    }

    fn config_error(builder: SimulationBuilder) -> SimError {
        let err = builder.build().err().expect("build should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig, "{}", err);
        err
    }

    #[test]
    fn test_valid_chain_builds() {
        let sim = chain().build().unwrap();
        assert_eq!(sim.nodes().len(), 4);
        assert_eq!(sim.links().len(), 3);
        let shop = sim.node(sim.node_id("shop").unwrap()).unwrap();
        assert_eq!(shop.inbound_links().len(), 1);
    }

    #[test]
    fn test_supplier_may_only_feed_manufacturer() {
        let err = config_error(chain().link(LinkSpec::new("mine", "shop", constant(1.0))));
        assert!(err.to_string().contains("mine->shop"));
    }

    #[test]
    fn test_links_must_flow_downstream() {
        config_error(chain().link(LinkSpec::new("shop", "hub", constant(1.0))));
        config_error(chain().link(LinkSpec::new("hub", "factory", constant(1.0))));
        config_error(
            chain()
                .node(NodeSpec::warehouse("store", "widget", 10))
                .link(LinkSpec::new("hub", "store", constant(1.0))),
        );
    }

    #[test]
    fn test_permissive_rules_allow_any_direction_but_self_links() {
        let permissive = SimulationConfig::new().with_topology(TopologyRules::Permissive);
        chain()
            .with_config(permissive.clone())
            .link(LinkSpec::new("shop", "hub", constant(1.0)))
            .build()
            .unwrap();

        let err = config_error(
            chain()
                .with_config(permissive)
                .link(LinkSpec::new("hub", "hub", constant(1.0))),
        );
        assert!(err.to_string().contains("cannot supply itself"));
    }

    #[test]
    fn test_disconnected_node_is_rejected() {
        let err = config_error(chain().node(NodeSpec::retailer("kiosk", "widget", 5)));
        assert!(err.to_string().contains("kiosk"));
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let err = config_error(chain().link(LinkSpec::new("hub", "nowhere", constant(1.0))));
        assert!(err.to_string().contains("nowhere"));

        let err = config_error(chain().node(NodeSpec::retailer("kiosk", "gadget", 5)));
        assert!(err.to_string().contains("gadget"));

        let err = config_error(chain().demand(DemandSpec::new("ghost", constant(1.0), constant(1.0))));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_malformed_inventory_is_rejected() {
        config_error(chain().node(NodeSpec::retailer("kiosk", "widget", 0)));
        config_error(chain().node(NodeSpec::retailer("kiosk", "widget", 5).with_initial_level(6)));
        config_error(chain().node(NodeSpec::retailer("kiosk", "widget", 5).with_holding_cost(-1.0)));
        config_error(chain().node(NodeSpec::retailer("kiosk", "widget", 5).with_policy(
            ReplenishmentPolicy::ThresholdToCapacity {
                reorder_point: 2,
                order_up_to: 6,
            },
        )));
        config_error(chain().node(NodeSpec::supplier("quarry", "ore").with_policy(
            ReplenishmentPolicy::FixedQuantity {
                reorder_point: 1,
                quantity: 5,
            },
        )));
    }

    #[test]
    fn test_raw_store_must_hold_one_batch() {
        let err = config_error(
            SimulationBuilder::new()
                .product(Product::new("ore", 1.0, 2.0))
                .product(Product::new("widget", 5.0, 9.0))
                .node(NodeSpec::supplier("mine", "ore"))
                .node(
                    NodeSpec::manufacturer("factory", "widget", 100, RawMaterialSpec::new("ore", 3, 200), 1.0)
                        .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
                            reorder_point: 20,
                            order_up_to: 100,
                        }),
                )
                .link(LinkSpec::new("mine", "factory", constant(1.0))),
        );
        assert!(err.to_string().contains("raw material capacity"));
    }

    #[test]
    fn test_demand_needs_a_selling_node() {
        let err = config_error(chain().demand(DemandSpec::new("mine", constant(1.0), constant(1.0))));
        assert!(err.to_string().contains("does not sell"));
    }

    #[test]
    fn test_negative_transport_cost_is_rejected() {
        config_error(
            SimulationBuilder::new()
                .product(Product::new("widget", 5.0, 9.0))
                .node(NodeSpec::supplier("plant", "widget"))
                .node(NodeSpec::retailer("shop", "widget", 10))
                .with_config(SimulationConfig::new().with_topology(TopologyRules::Permissive))
                .link(LinkSpec::new("plant", "shop", constant(1.0)).with_cost(-1.0)),
        );
    }
}
