pub mod descriptors;
pub mod simulation_builder;
pub mod topology_validator;

// Re-export commonly used types
pub use descriptors::{DemandSpec, LinkSpec, NetworkSpec, NodeRoleSpec, NodeSpec, RawMaterialSpec};
pub use simulation_builder::SimulationBuilder;
pub use topology_validator::TopologyValidator;
