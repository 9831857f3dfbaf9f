pub mod core;

// Re-export commonly used types
pub use crate::core::builder::{DemandSpec, LinkSpec, NetworkSpec, NodeRoleSpec, NodeSpec, RawMaterialSpec, SimulationBuilder};
pub use crate::core::errors::{ErrorKind, SimError};
pub use crate::core::execution::{
    run_replications, ConcurrencyMode, OverflowPolicy, Replications, Simulation, SimulationConfig,
    SupplierSelection, TopologyRules,
};
pub use crate::core::inventory::{InventoryLedger, LedgerEntry, MutationKind, Product};
pub use crate::core::network::{Node, NodeRole, Order, OrderPurpose, OrderStatus, Requester, Supply};
pub use crate::core::replenishment::{ReplenishmentPhase, ReplenishmentPolicy};
pub use crate::core::sampling::{Constant, Determinism, FromFn, Generator, SamplerSpec, Scripted};
pub use crate::core::sink::{EventSink, LogSink, NullSink, RecordingSink, TraceRecord};
pub use crate::core::stats::{LinkStatistics, NetworkStatistics, NodeStatistics, ReplicationSummary, StatisticsSnapshot};
pub use crate::core::types::{Echelon, LinkId, NodeId, OrderId, Quantity, SimTime, MAX_ORDER_QUANTITY};
