use serde::{Deserialize, Serialize};

/// Logical simulation time. One unit is one logical day.
pub type SimTime = f64;

/// Whole units of a product.
pub type Quantity = u64;

/// Largest quantity a single order may ask for. Keeps the per-run tallies far from `u64::MAX`.
pub const MAX_ORDER_QUANTITY: Quantity = 1 << 48;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the simulation arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Arena index of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Monotonic order identifier, unique within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub(crate) u64);

impl OrderId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

/// Tier of a node in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Echelon {
    Supplier,
    Manufacturer,
    Distributor,
    Warehouse,
    Retailer,
}

impl Echelon {
    /// Position in the chain, upstream first. Distributors and warehouses share a tier.
    pub fn tier(&self) -> u8 {
        match self {
            Echelon::Supplier => 0,
            Echelon::Manufacturer => 1,
            Echelon::Distributor | Echelon::Warehouse => 2,
            Echelon::Retailer => 3,
        }
    }
}

impl std::fmt::Display for Echelon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Echelon::Supplier => "supplier",
            Echelon::Manufacturer => "manufacturer",
            Echelon::Distributor => "distributor",
            Echelon::Warehouse => "warehouse",
            Echelon::Retailer => "retailer",
        };
        write!(f, "{}", name)
    }
}
