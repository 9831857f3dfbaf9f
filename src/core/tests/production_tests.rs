#[cfg(test)]
mod tests {
    use crate::core::builder::{LinkSpec, NodeSpec, RawMaterialSpec, SimulationBuilder};
    use crate::core::execution::config::SimulationConfig;
    use crate::core::inventory::Product;
    use crate::core::replenishment::{ReplenishmentPhase, ReplenishmentPolicy};
    use crate::core::sink::RecordingSink;
    use crate::core::tests::{constant, init_logger};

    #[test]
    fn test_deferred_production_orders_raw_material() {
        init_logger();
        let trace = RecordingSink::new();
        let mut sim = SimulationBuilder::new()
            .with_sink(trace.clone())
            .product(Product::new("ore", 1.5, 2.0))
            .product(Product::new("widget", 3.0, 9.0))
            .node(NodeSpec::supplier("mine", "ore"))
            .node(
                NodeSpec::manufacturer("factory", "widget", 100, RawMaterialSpec::new("ore", 2, 200), 1.0)
                    .with_initial_level(0)
                    .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
                        reorder_point: 10,
                        order_up_to: 100,
                    }),
            )
            .link(LinkSpec::new("mine", "factory", constant(2.0)).with_cost(7.0))
            .build()
            .unwrap();
        let factory = sim.node_id("factory").unwrap();

        sim.run_until(2.5).unwrap();
        {
            let node = sim.node(factory).unwrap();
            let m = node.manufacturing().unwrap();
            assert!(m.is_busy());
            assert_eq!(m.raw_ledger().level(), 0);
            assert_eq!(node.level(), 0);
            assert_eq!(node.counters().procurement_cost, 400.0);
            assert_eq!(node.counters().transportation_cost, 7.0);
        }

        sim.run_until(3.0).unwrap();
        let node = sim.node(factory).unwrap();
        let m = node.manufacturing().unwrap();
        assert!(!m.is_busy());
        assert_eq!(m.units_produced(), 100);
        assert_eq!(node.level(), 100);
        assert_eq!(node.counters().production_cost, 300.0);
        assert_eq!(node.replenishment().unwrap().phase(), ReplenishmentPhase::Idle);

        let deferrals = trace
            .records()
            .iter()
            .filter(|r| r.entity == "factory" && r.message.contains("deferred"))
            .count();
        assert_eq!(deferrals, 1);

        let mine = sim.snapshot();
        let mine = mine.node("mine").unwrap();
        assert_eq!(mine.units_sold, 200);
        assert_eq!(mine.shortage, 0);
        assert_eq!(mine.revenue, 400.0);
    }

    #[test]
    fn test_finite_supplier_backorders_until_extraction() {
        init_logger();
        let mut sim = SimulationBuilder::new()
            .product(Product::new("ore", 1.0, 1.0))
            .product(Product::new("widget", 2.0, 5.0))
            .node(NodeSpec::extracting_supplier("quarry", "ore", 50, 10, 1.0).with_initial_level(0))
            .node(
                NodeSpec::manufacturer("factory", "widget", 20, RawMaterialSpec::new("ore", 1, 20), 0.0)
                    .with_initial_level(0)
                    .with_order_tolerance(5.0)
                    .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
                        reorder_point: 0,
                        order_up_to: 20,
                    }),
            )
            .link(LinkSpec::new("quarry", "factory", constant(1.0)))
            .build()
            .unwrap();

        sim.run_until(1.5).unwrap();
        assert_eq!(sim.snapshot().node("quarry").unwrap().backorder, 20);

        let snapshot = sim.simulate(3.0).unwrap();
        let quarry = snapshot.node("quarry").unwrap();
        assert_eq!(quarry.backorder, 0);
        assert_eq!(quarry.backorder_recovered, 20);
        assert_eq!(quarry.inventory_level, 10);
        assert_eq!(quarry.shortage, 0);

        let factory = snapshot.node("factory").unwrap();
        assert_eq!(factory.inventory_level, 20);
        assert_eq!(factory.units_produced, 20);
        assert_eq!(factory.raw_material_level, Some(0));
    }

    #[test]
    fn test_manufacturer_without_raw_material_needs_no_supplier() {
        init_logger();
        let mut sim = SimulationBuilder::new()
            .with_config(SimulationConfig::new().with_seed(3))
            .product(Product::new("bread", 0.5, 2.0))
            .node(
                NodeSpec::manufacturer("bakery", "bread", 40, RawMaterialSpec::new("bread", 0, 1), 0.25)
                    .with_initial_level(5)
                    .with_policy(ReplenishmentPolicy::FixedQuantity {
                        reorder_point: 10,
                        quantity: 30,
                    }),
            )
            .build()
            .unwrap();

        let snapshot = sim.simulate(1.0).unwrap();
        let bakery = snapshot.node("bakery").unwrap();
        assert_eq!(bakery.units_produced, 30);
        assert_eq!(bakery.inventory_level, 35);
        assert_eq!(bakery.production_cost, 15.0);
    }
}
