use supplysim::{
    run_replications, ConcurrencyMode, DemandSpec, ErrorKind, LinkSpec, NetworkSpec, NodeSpec, OrderStatus, Product,
    RawMaterialSpec, RecordingSink, ReplenishmentPolicy, SamplerSpec, SimulationBuilder, SimulationConfig,
};

fn init_logger() {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
}

fn constant(value: f64) -> SamplerSpec {
    SamplerSpec::Constant { value }
}

/// Infinite supplier → manufacturer → distributor facing one customer stream
fn three_echelon(demand: DemandSpec) -> SimulationBuilder {
    SimulationBuilder::new()
        .product(Product::new("ore", 1.0, 1.5))
        .product(Product::new("widget", 6.0, 10.0))
        .node(NodeSpec::supplier("mine", "ore"))
        .node(
            NodeSpec::manufacturer(
                "factory",
                "widget",
                300,
                RawMaterialSpec::new("ore", 1, 300).with_initial_level(300),
                1.0,
            )
            .with_initial_level(200)
            .with_holding_cost(0.02)
            .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
                reorder_point: 150,
                order_up_to: 300,
            }),
        )
        .node(
            NodeSpec::distributor("hub", "widget", 100)
                .with_holding_cost(0.05)
                .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
                    reorder_point: 40,
                    order_up_to: 100,
                }),
        )
        .link(LinkSpec::new("mine", "factory", constant(2.0)).with_cost(15.0))
        .link(LinkSpec::new("factory", "hub", constant(1.0)).with_cost(8.0))
        .demand(demand)
}

#[test]
fn test_end_to_end_constant_demand() {
    init_logger();
    let mut sim = three_echelon(DemandSpec::new("hub", constant(1.0), constant(10.0)))
        .build()
        .unwrap();

    let snapshot = sim.simulate(30.0).unwrap();
    let network = &snapshot.network;
    assert_eq!(network.customers, 30);
    assert_eq!(network.total_demand, 300);
    assert_eq!(network.total_fulfilled + network.total_shortage, 300);
    assert_eq!(network.total_backorder, 0);

    let mine = snapshot.node("mine").unwrap();
    assert_eq!(mine.shortage, 0);
    assert_eq!(mine.units_sold, mine.demand_units);

    for node in sim.nodes() {
        assert!(node.level() <= node.ledger().capacity());
        assert_eq!(node.ledger().replayed_level(), node.level());
    }
    for order in sim.closed_orders() {
        assert_eq!(order.fulfilled + order.shortfall, order.quantity);
        assert!(matches!(order.status, OrderStatus::Fulfilled | OrderStatus::Expired));
    }

    let costs: f64 = snapshot.nodes.iter().map(|n| n.total_cost).sum();
    assert!((network.total_cost - costs).abs() < 1e-9);
    assert!((network.net_profit - (network.total_revenue - network.total_cost)).abs() < 1e-9);
}

#[test]
fn test_stochastic_run_is_reproducible() {
    init_logger();
    let demand = DemandSpec::new(
        "hub",
        SamplerSpec::Exponential { rate: 1.2 },
        SamplerSpec::UniformInt { low: 1, high: 15 },
    )
    .with_tolerance(1.5);

    let run = |seed: u64| {
        let trace = RecordingSink::new();
        let snapshot = three_echelon(demand.clone())
            .with_config(SimulationConfig::new().with_seed(seed))
            .with_sink(trace.clone())
            .build()
            .unwrap()
            .simulate(50.0)
            .unwrap();
        (snapshot, trace.records())
    };

    let (first, first_trace) = run(99);
    let (second, second_trace) = run(99);
    assert_eq!(first, second);
    assert_eq!(first_trace, second_trace);

    let network = &first.network;
    assert_eq!(
        network.total_fulfilled + network.total_shortage + network.total_backorder,
        network.total_demand
    );
}

#[test]
fn test_network_from_json() {
    init_logger();
    let json = r#"{
        "config": { "seed": 3, "review_interval": 0.5 },
        "products": [
            { "id": "flour", "unit_cost": 0.2, "sell_price": 0.3 },
            { "id": "bread", "name": "Loaf", "unit_cost": 1.0, "sell_price": 2.5, "shelf_life": 3.0, "salvage_value": 0.1 }
        ],
        "nodes": [
            { "id": "mill", "role": { "kind": "supplier" }, "product": "flour" },
            {
                "id": "bakery",
                "role": {
                    "kind": "manufacturer",
                    "raw_material": { "product": "flour", "per_unit": 2, "capacity": 120, "initial_level": 120 },
                    "processing_time": 0.5
                },
                "product": "bread",
                "capacity": 60,
                "initial_level": 30,
                "policy": { "kind": "fixed_quantity", "reorder_point": 20, "quantity": 40 }
            },
            {
                "id": "corner",
                "role": { "kind": "retailer" },
                "product": "bread",
                "capacity": 25,
                "holding_cost": 0.01,
                "policy": { "kind": "periodic", "period": 2.0, "quantity": 15 },
                "order_tolerance": 1.0
            }
        ],
        "links": [
            { "source": "mill", "sink": "bakery", "lead_time": { "kind": "constant", "value": 1.0 } },
            {
                "id": "van",
                "source": "bakery",
                "sink": "corner",
                "cost": 4.0,
                "distance": 12.5,
                "lead_time": { "kind": "triangular", "min": 0.2, "max": 0.8, "mode": 0.4 }
            }
        ],
        "demands": [
            {
                "target": "corner",
                "arrival": { "kind": "exponential", "rate": 3.0 },
                "quantity": { "kind": "poisson", "mean": 2.0 },
                "tolerance": 0.25
            }
        ]
    }"#;

    let spec = NetworkSpec::from_json(json).unwrap();
    assert_eq!(spec.config.review_interval, 0.5);

    let mut sim = SimulationBuilder::from_spec(spec).build().unwrap();
    let snapshot = sim.simulate(20.0).unwrap();

    let van = snapshot.link("van").unwrap();
    assert!(van.shipments > 0);
    assert_eq!(van.transport_cost, 4.0 * van.shipments as f64);
    assert_eq!(van.average_cost, 4.0);
    assert_eq!(snapshot.node("corner").unwrap().replenishment_orders, 10);
    assert!(snapshot.network.total_demand > 0);

    let err = SimulationBuilder::from_json("{ not json").err().expect("parse should fail");
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_replications_match_across_concurrency_modes() {
    init_logger();
    let mut network = NetworkSpec::default();
    network.products.push(Product::new("ore", 1.0, 1.5));
    network.products.push(Product::new("widget", 6.0, 10.0));
    network.nodes = vec![
        NodeSpec::supplier("mine", "ore"),
        NodeSpec::manufacturer(
            "factory",
            "widget",
            300,
            RawMaterialSpec::new("ore", 1, 300).with_initial_level(300),
            1.0,
        )
        .with_initial_level(200)
        .with_policy(ReplenishmentPolicy::ThresholdToCapacity {
            reorder_point: 150,
            order_up_to: 300,
        }),
        NodeSpec::distributor("hub", "widget", 100).with_policy(ReplenishmentPolicy::ThresholdToCapacity {
            reorder_point: 40,
            order_up_to: 100,
        }),
    ];
    network.links = vec![
        LinkSpec::new("mine", "factory", constant(2.0)),
        LinkSpec::new("factory", "hub", SamplerSpec::Uniform { low: 0.5, high: 1.5 }),
    ];
    network.demands = vec![DemandSpec::new(
        "hub",
        SamplerSpec::Exponential { rate: 1.0 },
        SamplerSpec::UniformInt { low: 4, high: 12 },
    )
    .with_tolerance(0.5)];

    let sequential = SimulationConfig::new().with_seed(40);
    let parallel = sequential
        .clone()
        .with_concurrency(ConcurrencyMode::Rayon)
        .with_thread_pool_size(2);

    let first = run_replications(&network, &sequential, 4, 25.0).unwrap();
    let second = run_replications(&network, &parallel, 4, 25.0).unwrap();

    assert_eq!(first.seeds, vec![40, 41, 42, 43]);
    assert_eq!(first.snapshots, second.snapshots);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.summary.runs, 4);
    assert!(first.summary.mean_fill_rate > 0.0 && first.summary.mean_fill_rate <= 1.0);
}
