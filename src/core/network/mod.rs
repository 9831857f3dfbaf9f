pub mod demand;
pub mod link;
pub mod node;
pub mod order;

// Re-export commonly used types
pub use demand::DemandGenerator;
pub use link::Link;
pub use node::{Capabilities, ManufacturerRole, Node, NodeCounters, NodeRole, Supply};
pub use order::{Order, OrderPurpose, OrderStatus, Requester};
