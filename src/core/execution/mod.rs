pub mod config;
mod fulfillment;
mod production;
pub mod replications;
pub mod simulation_engine;

// Re-export commonly used types
pub use config::{ConcurrencyMode, OverflowPolicy, SimulationConfig, SupplierSelection, TopologyRules};
pub use replications::{run_replications, Replications};
pub use simulation_engine::Simulation;
