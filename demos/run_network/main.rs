use std::env;
use std::fs;

use supplysim::{run_replications, NetworkSpec, SimulationBuilder};

const BUNDLED_NETWORK: &str = include_str!("three_echelon.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    // run_network [network.json] [until] [runs]
    let args: Vec<String> = env::args().skip(1).collect();
    let json = match args.first() {
        Some(path) => fs::read_to_string(path)?,
        None => BUNDLED_NETWORK.to_string(),
    };
    let until: f64 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(30.0);
    let runs: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(1);

    let network = NetworkSpec::from_json(&json)?;
    println!(
        "Network: {} products, {} nodes, {} links, {} demand streams",
        network.products.len(),
        network.nodes.len(),
        network.links.len(),
        network.demands.len()
    );

    if runs > 1 {
        let replications = run_replications(&network, &network.config, runs, until)?;
        println!("{}", serde_json::to_string_pretty(&replications.summary)?);
        return Ok(());
    }

    let mut sim = SimulationBuilder::from_spec(network).build()?;
    let snapshot = sim.simulate(until)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!(
        "fill rate {:.1}%, net profit {:.2}",
        snapshot.network.fill_rate() * 100.0,
        snapshot.network.net_profit
    );
    Ok(())
}
